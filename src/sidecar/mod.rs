pub mod preview;
pub mod sidecar;

pub use preview::{find_preview, preview_url, thumbnail_url};
pub use sidecar::{read_civitai_info, read_description, read_lora_json, CivitaiInfo, LoraJson};
