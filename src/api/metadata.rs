use serde::{Deserialize, Serialize};

use crate::classify::classifier::{classify, ClassifierInput};
use crate::registry::registry::{ModelEntry, ModelRegistry};
use crate::settings::settings::HelperSettings;
use crate::sidecar::sidecar::read_civitai_info;

/// Body of `get_metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    /// Architecture inferred from the model: `SD`, `SDXL`, `FLUX`, ...
    pub model_type: Option<String>,
    pub algorithm: Option<String>,
    /// Base model named by the civitai sidecar, e.g. `SDXL 1.0`.
    pub base_model: Option<String>,
    pub using_blocks: Option<Vec<String>>,
}

/// Classifies the model registered under `key`.
///
/// Unknown keys give an all-null response. Weight keys are only read when
/// block parsing is enabled; `force` bypasses their on-disk cache.
pub fn get_metadata(
    registry: &dyn ModelRegistry,
    settings: &HelperSettings,
    key: &str,
    force: bool,
) -> MetadataResponse {
    match registry.lookup(key) {
        Some(entry) => entry_metadata(entry, settings, force),
        None => {
            tracing::debug!("get_metadata: no model named {:?}", key);
            MetadataResponse::default()
        }
    }
}

/// Classifies one registry entry; the body of `get_metadata` once the key is resolved.
pub fn entry_metadata(entry: &ModelEntry, settings: &HelperSettings, force: bool) -> MetadataResponse {
    let weight_keys = if settings.parse_lora_blocks {
        match entry.weight_keys(force) {
            Ok(keys) => Some(keys),
            Err(e) => {
                tracing::warn!("cannot read weight keys of {}: {}", entry.path.display(), e);
                None
            }
        }
    } else {
        None
    };

    let result = classify(&ClassifierInput {
        host_version: entry.sd_version.as_ref(),
        metadata: &entry.metadata,
        weight_keys: weight_keys.as_deref(),
    });

    MetadataResponse {
        model_type: result.model_type,
        algorithm: result.algorithm,
        base_model: read_civitai_info(&entry.stem()).base_model,
        using_blocks: result.blocks,
    }
}
