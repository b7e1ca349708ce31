pub mod metadata;
pub mod preview;

pub use metadata::{entry_metadata, get_metadata, MetadataResponse};
pub use preview::{get_preview_info, PreviewResponse};

/// Path prefix of the HTTP API.
pub const API_PREFIX: &str = "/whapi/v1";
