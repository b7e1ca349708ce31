use std::path::{Path, PathBuf};

use crate::error::LoaderError;
use crate::metadata::training_metadata::OUTPUT_NAME_KEY;
use crate::registry::registry::{is_model_file, ModelEntry, ModelRegistry};
use crate::registry::safetensors::read_header;

/// Registry built by scanning a LoRA directory tree for `.safetensors` files.
///
/// Each entry is named after its file stem and aliased by the trainer's
/// `ss_output_name` when the metadata carries one. Files whose header cannot
/// be read are skipped with a warning.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRegistry {
    root: PathBuf,
    entries: Vec<ModelEntry>,
}

impl DirectoryRegistry {
    /// Scans `root` recursively. Fails only when `root` itself is unreadable.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, LoaderError> {
        let root = root.into();
        let mut files = Vec::new();
        collect_model_files(&root, &mut files)?;
        files.sort();

        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            match read_header(&path) {
                Ok(header) => {
                    let mut entry = ModelEntry::new(&path, header.metadata);
                    if let Some(alias) = entry.metadata.get_str(OUTPUT_NAME_KEY).filter(|a| !a.is_empty()) {
                        entry.alias = alias.to_owned();
                    }
                    entries.push(entry);
                }
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }

        tracing::info!("indexed {} models under {}", entries.len(), root.display());
        Ok(DirectoryRegistry { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModelRegistry for DirectoryRegistry {
    fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }
}

fn collect_model_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoaderError> {
    for entry in std::fs::read_dir(dir).map_err(|e| LoaderError::io(dir, e))? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!("unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if path.is_dir() {
            if let Err(e) = collect_model_files(&path, out) {
                tracing::warn!("skipping directory {}: {}", path.display(), e);
            }
        } else if is_model_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}
