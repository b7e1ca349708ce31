use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::registry::ModelRegistry;
use crate::settings::settings::HelperSettings;
use crate::sidecar::preview::preview_url;
use crate::sidecar::sidecar::{
    negative_trigger_words, read_civitai_info, read_description, read_lora_json, trigger_words,
};

/// Body of `get_preview_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub model_id: Option<Value>,
    pub trigger_words: Vec<String>,
    pub negative_trigger_words: Vec<String>,
    pub model_name: Option<String>,
    /// Data URL, thumbnail link or placeholder.
    pub thumb_url: Option<String>,
    /// True when the model file carries training metadata.
    pub has_metadata: bool,
    pub description: Option<String>,
}

/// Collects what the hover card shows for the model registered under `key`.
pub fn get_preview_info(registry: &dyn ModelRegistry, settings: &HelperSettings, key: &str) -> PreviewResponse {
    let Some(entry) = registry.lookup(key) else {
        tracing::debug!("get_preview_info: no model named {:?}", key);
        return PreviewResponse::default();
    };
    let stem = entry.stem();

    let civitai = read_civitai_info(&stem);
    let lora_json = read_lora_json(&stem);

    let description = lora_json
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .or_else(|| read_description(&stem));

    PreviewResponse {
        model_id: civitai.model_id.clone(),
        trigger_words: trigger_words(&civitai, &lora_json),
        negative_trigger_words: negative_trigger_words(&lora_json),
        model_name: Some(entry.name.clone()),
        thumb_url: Some(preview_url(&stem, settings.thumbnail_height())),
        has_metadata: entry.has_metadata(),
        description,
    }
}
