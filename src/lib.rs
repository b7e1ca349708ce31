pub mod api;
pub mod classify;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod settings;
pub mod sidecar;

// Convenience re-exports
pub use api::{entry_metadata, get_metadata, get_preview_info, MetadataResponse, PreviewResponse};
pub use classify::{classify, ClassificationResult, ClassifierInput, SdVersion};
pub use error::{BlockError, LoaderError, SettingsError};
pub use metadata::{NetworkArgs, TrainingMetadata};
pub use registry::{DirectoryRegistry, InMemoryRegistry, ModelEntry, ModelRegistry};
pub use settings::HelperSettings;
