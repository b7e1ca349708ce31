//! Header-only reader for the safetensors format.
//!
//! ```text
//! [8 bytes: u64 header length, little-endian]
//! [header: JSON object of tensor name -> {dtype, shape, data_offsets}]
//! [tensor data]
//! ```
//!
//! Only the header is read; the optional `__metadata__` entry holds the
//! trainer's string-to-string metadata.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::error::LoaderError;
use crate::metadata::training_metadata::TrainingMetadata;

/// Headers larger than this are rejected rather than read into memory.
const MAX_HEADER_LEN: u64 = 100 * 1024 * 1024;

/// The parts of a safetensors header this crate uses.
#[derive(Debug, Clone, Default)]
pub struct SafetensorsHeader {
    /// Tensor names, sorted.
    pub tensor_names: Vec<String>,
    /// Contents of `__metadata__`, empty when absent.
    pub metadata: TrainingMetadata,
}

/// Reads the header of the safetensors file at `path`.
pub fn read_header(path: &Path) -> Result<SafetensorsHeader, LoaderError> {
    let mut file = File::open(path).map_err(|e| LoaderError::io(path, e))?;
    let file_len = file.metadata().map_err(|e| LoaderError::io(path, e))?.len();

    let mut len_bytes = [0u8; 8];
    file.read_exact(&mut len_bytes).map_err(|_| {
        LoaderError::header(path, format!("file is {file_len} bytes, need at least 8 for the length prefix"))
    })?;
    let header_len = u64::from_le_bytes(len_bytes);

    if header_len == 0 {
        return Err(LoaderError::header(path, "header length is 0"));
    }
    if header_len > MAX_HEADER_LEN || 8 + header_len > file_len {
        return Err(LoaderError::header(
            path,
            format!("header length {header_len} exceeds file size {file_len}"),
        ));
    }

    let mut header = vec![0u8; header_len as usize];
    file.read_exact(&mut header).map_err(|e| LoaderError::io(path, e))?;
    let text = std::str::from_utf8(&header)
        .map_err(|e| LoaderError::header(path, format!("header is not valid UTF-8: {e}")))?;

    parse_header(text).map_err(|e| LoaderError::header(path, e.to_string()))
}

/// Parses the JSON header text.
///
/// Keys starting with `__` other than `__metadata__` are skipped. Non-string
/// metadata values are kept as they are.
pub fn parse_header(text: &str) -> Result<SafetensorsHeader, serde_json::Error> {
    let raw: serde_json::Map<String, Value> = serde_json::from_str(text)?;

    let mut header = SafetensorsHeader::default();
    for (key, value) in raw {
        if key == "__metadata__" {
            if let Value::Object(map) = value {
                header.metadata = map.into_iter().collect();
            }
            continue;
        }
        if key.starts_with("__") {
            continue;
        }
        header.tensor_names.push(key);
    }
    Ok(header)
}
