use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::LoaderError;
use crate::registry::safetensors::read_header;

/// Extension of the key cache written next to each model file.
pub const CACHE_EXTENSION: &str = "whcache";

/// `<model stem>.whcache`, next to the model.
pub fn cache_path(model_path: &Path) -> PathBuf {
    model_path.with_extension(CACHE_EXTENSION)
}

/// Returns the weight key names of the model at `model_path`.
///
/// A readable cache is used unless `force` is set. After reading the model
/// itself the cache is rewritten; failing to write it is not an error.
pub fn cached_weight_keys(model_path: &Path, force: bool) -> Result<Vec<String>, LoaderError> {
    let cache = cache_path(model_path);
    if !force {
        if let Some(keys) = read_cache(&cache) {
            return Ok(keys);
        }
    }

    let keys = read_header(model_path)?.tensor_names;
    if let Err(e) = write_cache(&cache, &keys) {
        tracing::warn!("could not write key cache {}: {}", cache.display(), e);
    }
    Ok(keys)
}

fn read_cache(cache: &Path) -> Option<Vec<String>> {
    let file = File::open(cache).ok()?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(keys) => Some(keys),
        Err(e) => {
            tracing::debug!("ignoring unreadable key cache {}: {}", cache.display(), e);
            None
        }
    }
}

fn write_cache(cache: &Path, keys: &[String]) -> Result<(), LoaderError> {
    let file = File::create(cache).map_err(|e| LoaderError::io(cache, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, keys)?;
    writer.flush().map_err(|e| LoaderError::io(cache, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_model(path: &Path, names: &[&str]) {
        let entries: Vec<String> = names
            .iter()
            .map(|n| format!(r#""{n}": {{"dtype": "F32", "shape": [1], "data_offsets": [0, 4]}}"#))
            .collect();
        let header = format!("{{{}}}", entries.join(","));
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn cache_sits_next_to_model() {
        assert_eq!(cache_path(Path::new("/m/style.v2.safetensors")), PathBuf::from("/m/style.v2.whcache"));
    }

    #[test]
    fn first_read_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("a.safetensors");
        write_model(&model, &["k1", "k2"]);

        let keys = cached_weight_keys(&model, false).unwrap();
        assert_eq!(keys, vec!["k1", "k2"]);
        let cached: Vec<String> = serde_json::from_str(&std::fs::read_to_string(cache_path(&model)).unwrap()).unwrap();
        assert_eq!(cached, keys);
    }

    #[test]
    fn cache_is_preferred_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("a.safetensors");
        write_model(&model, &["fresh"]);
        std::fs::write(cache_path(&model), r#"["stale"]"#).unwrap();

        assert_eq!(cached_weight_keys(&model, false).unwrap(), vec!["stale"]);
        assert_eq!(cached_weight_keys(&model, true).unwrap(), vec!["fresh"]);
        assert_eq!(cached_weight_keys(&model, false).unwrap(), vec!["fresh"]);
    }

    #[test]
    fn corrupt_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("a.safetensors");
        write_model(&model, &["k"]);
        std::fs::write(cache_path(&model), b"\x80garbage").unwrap();

        assert_eq!(cached_weight_keys(&model, false).unwrap(), vec!["k"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_is_reported() {
        // Writes to /dev/full fail with ENOSPC once the buffer is flushed.
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let err = write_cache(full, &["k".to_owned()]).unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn unreadable_model_without_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cached_weight_keys(&dir.path().join("missing.safetensors"), false).is_err());
    }
}
