use std::io::Cursor;
use std::path::{Path, PathBuf};
use tiny_http::Response;

use weight_helper::sidecar::preview::PREVIEW_EXTENSIONS;

use crate::routes::{bytes_response, error_response, not_found};
use crate::state::SharedState;
use crate::util::form::query_get;

/// GET /sd_extra_networks/thumb?filename=<path>
///
/// Serves full-size preview images linked by `thumbUrl` when a preview is
/// too small to thumbnail. Only image files under the LoRA directory are
/// served.
pub fn handle(pairs: &[(String, String)], state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let Some(root) = state.preview_root.as_deref() else {
        return not_found();
    };
    let Some(filename) = query_get(pairs, "filename") else {
        return error_response(422, "missing query parameter: filename");
    };

    let Some(path) = resolve(root, Path::new(filename)) else {
        tracing::debug!("thumb: refusing {:?}", filename);
        return not_found();
    };
    let Some(content_type) = content_type(&path) else {
        return not_found();
    };

    match std::fs::read(&path) {
        Ok(bytes) => bytes_response(bytes, content_type),
        Err(e) => {
            tracing::warn!("thumb: cannot read {}: {}", path.display(), e);
            not_found()
        }
    }
}

/// Canonical path of `requested` if it exists and lies under `root`.
fn resolve(root: &Path, requested: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let path = requested.canonicalize().ok()?;
    path.starts_with(&root).then_some(path)
}

fn content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/gif",
    })
}
