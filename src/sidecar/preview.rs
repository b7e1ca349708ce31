//! Preview image lookup and thumbnail rendering.
//!
//! Previews larger than the requested height are downscaled, lightly
//! sharpened and inlined as a JPEG data URL. Smaller or undecodable images
//! are linked instead.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};

use crate::sidecar::sidecar::with_suffix;

/// Image extensions tried for previews, in order.
pub const PREVIEW_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Placeholder shown when a model has no preview.
pub const NO_PREVIEW_URL: &str = "./file=html/card-no-preview.png";

/// Route the host serves preview files from.
pub const THUMB_ROUTE: &str = "./sd_extra_networks/thumb?filename=";

const JPEG_QUALITY: u8 = 85;

const SHARPEN_KERNEL: [f32; 9] = [
    0.0, -0.2, 0.0, //
    -0.2, 1.8, -0.2, //
    0.0, -0.2, 0.0,
];

/// First existing `<stem>.<ext>` or `<stem>.preview.<ext>`.
pub fn find_preview(stem: &Path) -> Option<PathBuf> {
    PREVIEW_EXTENSIONS
        .iter()
        .flat_map(|ext| [format!(".{ext}"), format!(".preview.{ext}")])
        .map(|suffix| with_suffix(stem, &suffix))
        .find(|candidate| candidate.is_file())
}

/// Thumbnail URL for the preview of the model at `stem`.
pub fn preview_url(stem: &Path, target_height: u32) -> String {
    match find_preview(stem) {
        Some(path) => thumbnail_url(&path, target_height),
        None => NO_PREVIEW_URL.to_owned(),
    }
}

/// Inline data URL for `path` scaled to `target_height`, or a link to the
/// file when it is already smaller or cannot be processed.
pub fn thumbnail_url(path: &Path, target_height: u32) -> String {
    match render_thumbnail(path, target_height) {
        Ok(Some(url)) => url,
        Ok(None) => thumb_link(path),
        Err(e) => {
            tracing::debug!("thumbnail failed for {}: {}", path.display(), e);
            thumb_link(path)
        }
    }
}

fn render_thumbnail(path: &Path, target_height: u32) -> Result<Option<String>, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    if target_height == 0 || img.height() < target_height {
        return Ok(None);
    }

    let scale = f64::from(target_height) / f64::from(img.height());
    let width = ((f64::from(img.width()) * scale) as u32).max(1);
    let resized = img.resize_exact(width, target_height, FilterType::Lanczos3);
    let sharpened = resized.filter3x3(&SHARPEN_KERNEL);

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(sharpened.to_rgb8());
    let mut encoded = Cursor::new(Vec::new());
    rgb.write_to(&mut encoded, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| e.to_string())?;

    Ok(Some(format!("data:image/jpeg;base64,{}", base64_encode(encoded.get_ref()))))
}

/// Link to the host's thumbnail route for `path`.
pub fn thumb_link(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    format!("{THUMB_ROUTE}{}", url_quote(&normalized))
}

/// Percent-encodes everything except unreserved characters and `/`.
pub fn url_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Standard base64 with padding.
fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut result = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);
        let n = (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]);

        result.push(ALPHABET[(n >> 18) as usize & 0x3F] as char);
        result.push(ALPHABET[(n >> 12) as usize & 0x3F] as char);
        result.push(if chunk.len() > 1 { ALPHABET[(n >> 6) as usize & 0x3F] as char } else { '=' });
        result.push(if chunk.len() > 2 { ALPHABET[n as usize & 0x3F] as char } else { '=' });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 40, 40])).save(path).unwrap();
    }

    #[test]
    fn base64_padding() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"fo"), "Zm8=");
        assert_eq!(base64_encode(b"foo"), "Zm9v");
        assert_eq!(base64_encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn quote_keeps_slashes_and_escapes_the_rest() {
        assert_eq!(url_quote("/loras/my lora (v2).png"), "/loras/my%20lora%20%28v2%29.png");
        assert_eq!(url_quote("é"), "%C3%A9");
    }

    #[test]
    fn thumb_link_normalizes_backslashes() {
        assert_eq!(
            thumb_link(Path::new(r"C:\loras\a b.png")),
            "./sd_extra_networks/thumb?filename=C%3A/loras/a%20b.png"
        );
    }

    #[test]
    fn find_preview_order() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("m");
        assert_eq!(find_preview(&stem), None);

        std::fs::write(with_suffix(&stem, ".preview.jpg"), b"x").unwrap();
        assert_eq!(find_preview(&stem), Some(with_suffix(&stem, ".preview.jpg")));
        std::fs::write(with_suffix(&stem, ".jpg"), b"x").unwrap();
        assert_eq!(find_preview(&stem), Some(with_suffix(&stem, ".jpg")));
        std::fs::write(with_suffix(&stem, ".preview.png"), b"x").unwrap();
        assert_eq!(find_preview(&stem), Some(with_suffix(&stem, ".preview.png")));
    }

    #[test]
    fn missing_preview_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(preview_url(&dir.path().join("m"), 600), NO_PREVIEW_URL);
    }

    #[test]
    fn small_images_are_linked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.png");
        write_png(&path, 20, 10);
        assert!(thumbnail_url(&path, 600).starts_with(THUMB_ROUTE));
    }

    #[test]
    fn large_images_are_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.png");
        write_png(&path, 64, 48);
        let url = thumbnail_url(&path, 24);
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn undecodable_images_are_linked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(thumbnail_url(&path, 24).starts_with(THUMB_ROUTE));
    }
}
