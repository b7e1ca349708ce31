pub mod literal;
pub mod network_args;
pub mod training_metadata;

pub use network_args::NetworkArgs;
pub use training_metadata::TrainingMetadata;
