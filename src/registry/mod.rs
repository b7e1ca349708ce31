pub mod directory;
pub mod key_cache;
pub mod registry;
pub mod safetensors;

pub use directory::DirectoryRegistry;
pub use registry::{InMemoryRegistry, ModelEntry, ModelRegistry};
