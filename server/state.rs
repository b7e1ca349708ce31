use std::path::PathBuf;
use std::sync::Arc;

use weight_helper::{HelperSettings, ModelRegistry};

/// Everything the handlers read. Built once at startup and never mutated,
/// so it is shared without a lock.
pub struct ApiState {
    /// Models the API can describe.
    pub registry: Box<dyn ModelRegistry>,
    /// Panel options; `parse_lora_blocks` and `preview_height` affect responses.
    pub settings: HelperSettings,
    /// Directory preview files may be served from. `None` disables the thumb route.
    pub preview_root: Option<PathBuf>,
}

impl ApiState {
    pub fn new(registry: Box<dyn ModelRegistry>, settings: HelperSettings) -> Self {
        ApiState { registry, settings, preview_root: None }
    }

    pub fn with_preview_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.preview_root = Some(root.into());
        self
    }
}

/// Handle passed to every request thread.
pub type SharedState = Arc<ApiState>;
