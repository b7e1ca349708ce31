use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `<stem>.json`: user overrides written by the host's model card editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoraJson {
    #[serde(rename = "activation text")]
    pub activation_text: Option<String>,
    #[serde(rename = "negative text")]
    pub negative_text: Option<String>,
    pub description: Option<String>,
}

/// `<stem>.civitai.info`: model page data saved by civitai downloaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CivitaiInfo {
    pub model_id: Option<Value>,
    pub base_model: Option<String>,
    pub trained_words: Vec<String>,
}

/// Appends `suffix` to `stem` without treating it as an extension.
pub fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Reads a file as text, replacing invalid UTF-8. `None` when unreadable.
fn read_text(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("cannot read {}: {}", path.display(), e);
            }
            None
        }
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let Some(text) = read_text(path) else {
        return T::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        tracing::debug!("ignoring malformed {}: {}", path.display(), e);
        T::default()
    })
}

pub fn read_lora_json(stem: &Path) -> LoraJson {
    read_json(&with_suffix(stem, ".json"))
}

pub fn read_civitai_info(stem: &Path) -> CivitaiInfo {
    read_json(&with_suffix(stem, ".civitai.info"))
}

/// First readable of `<stem>.txt` and `<stem>.description.txt`.
pub fn read_description(stem: &Path) -> Option<String> {
    [".txt", ".description.txt"]
        .iter()
        .find_map(|suffix| read_text(&with_suffix(stem, suffix)))
}

/// Splits comma-separated words, trimming each and dropping empty ones.
pub fn split_words<S: AsRef<str>>(text: S) -> Vec<String> {
    text.as_ref()
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Trigger words for a model: civitai's trained words, replaced by the
/// user's activation text when that is set.
pub fn trigger_words(civitai: &CivitaiInfo, lora_json: &LoraJson) -> Vec<String> {
    match lora_json.activation_text.as_deref().filter(|t| !t.is_empty()) {
        Some(text) => split_words(text),
        None => split_words(civitai.trained_words.join(",")),
    }
}

pub fn negative_trigger_words(lora_json: &LoraJson) -> Vec<String> {
    lora_json.negative_text.as_deref().map(split_words).unwrap_or_default()
}
