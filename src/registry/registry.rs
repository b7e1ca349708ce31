use std::path::{Path, PathBuf};

use crate::classify::architecture::SdVersion;
use crate::error::LoaderError;
use crate::metadata::training_metadata::TrainingMetadata;
use crate::registry::key_cache::cached_weight_keys;

/// One model known to a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Path of the model file.
    pub path: PathBuf,
    /// Lookup name, normally the file stem.
    pub name: String,
    /// Secondary lookup name.
    pub alias: String,
    /// Version tag reported by the host, if it reports one.
    pub sd_version: Option<SdVersion>,
    pub metadata: TrainingMetadata,
}

impl ModelEntry {
    /// Creates an entry named after the file stem, with the stem as alias.
    pub fn new(path: impl Into<PathBuf>, metadata: TrainingMetadata) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        ModelEntry {
            alias: name.clone(),
            name,
            path,
            sd_version: None,
            metadata,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_sd_version(mut self, version: SdVersion) -> Self {
        self.sd_version = Some(version);
        self
    }

    /// Model path without its extension; sidecar files hang off this.
    pub fn stem(&self) -> PathBuf {
        self.path.with_extension("")
    }

    /// Weight key names of the model, cached next to it unless `force` is set.
    pub fn weight_keys(&self, force: bool) -> Result<Vec<String>, LoaderError> {
        cached_weight_keys(&self.path, force)
    }

    pub fn has_metadata(&self) -> bool {
        !self.metadata.is_empty()
    }
}

/// Source of the models the API can describe.
///
/// Lookups try the exact name first, then the alias.
pub trait ModelRegistry: Send + Sync {
    fn entries(&self) -> &[ModelEntry];

    fn lookup(&self, key: &str) -> Option<&ModelEntry> {
        let entries = self.entries();
        entries
            .iter()
            .find(|e| e.name == key)
            .or_else(|| entries.iter().find(|e| e.alias == key))
    }
}

/// Registry over a fixed list of entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    entries: Vec<ModelEntry>,
}

impl InMemoryRegistry {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        InMemoryRegistry { entries }
    }

    pub fn push(&mut self, entry: ModelEntry) {
        self.entries.push(entry);
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }
}

/// Returns true when `path` names a file the registries index.
pub(crate) fn is_model_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("safetensors")
}
