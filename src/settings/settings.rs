use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Corner of the prompt editor the preview card is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PreviewPosition {
    #[default]
    #[serde(rename = "Top Right")]
    TopRight,
    #[serde(rename = "Bottom Right")]
    BottomRight,
    #[serde(rename = "Top Left")]
    TopLeft,
    #[serde(rename = "Bottom Left")]
    BottomLeft,
}

/// Slider bounds for one weight control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        SliderRange { min, max, step }
    }
}

/// Block groupings offered by the LBW (LoRA block weight) editor, one preset
/// string per algorithm family and architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPoints {
    pub lora_sd: String,
    pub lycoris_sd: String,
    pub lora_sdxl: String,
    pub lycoris_sdxl: String,
}

impl Default for BlockPoints {
    fn default() -> Self {
        BlockPoints {
            lora_sd: "BASE, IN01-IN04, IN05-IN08, M00, OUT03-OUT06, OUT07-OUT11".to_owned(),
            lycoris_sd: "BASE, IN00-IN05, IN06-IN11, M00, OUT00-OUT05, OUT06-OUT11".to_owned(),
            lora_sdxl: "BASE, IN04-IN08, M00, OUT00-OUT05".to_owned(),
            lycoris_sdxl: "BASE, IN00-IN03, IN04-IN08, M00, OUT00-OUT03, OUT04-OUT08".to_owned(),
        }
    }
}

/// User-facing options of the weight helper panel.
///
/// Every field has a default, so partial JSON files load cleanly and a
/// missing file means "all defaults".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperSettings {
    pub enabled: bool,
    pub context_menu_scale: f64,
    /// Replace prompt text through `execCommand` so the browser's undo works.
    pub using_exec_command: bool,
    /// Slider length in pixels.
    pub slider_length: u32,
    pub te: SliderRange,
    pub unet: SliderRange,
    pub dyn_dim: SliderRange,
    pub lbw: SliderRange,
    pub show_preview: bool,
    /// Preview height in CSS pixels; thumbnails are rendered at 1.5x.
    pub preview_height: u32,
    pub preview_position: PreviewPosition,
    /// Read weight keys to report which blocks a LoRA touches.
    pub parse_lora_blocks: bool,
    pub block_points: BlockPoints,
}

impl Default for HelperSettings {
    fn default() -> Self {
        HelperSettings {
            enabled: true,
            context_menu_scale: 0.8,
            using_exec_command: true,
            slider_length: 160,
            te: SliderRange::new(0.0, 1.0, 0.05),
            unet: SliderRange::new(0.0, 1.0, 0.05),
            dyn_dim: SliderRange::new(0.0, 128.0, 8.0),
            lbw: SliderRange::new(0.0, 1.0, 0.05),
            show_preview: true,
            preview_height: 400,
            preview_position: PreviewPosition::TopRight,
            parse_lora_blocks: true,
            block_points: BlockPoints::default(),
        }
    }
}

impl HelperSettings {
    /// Serializes the settings to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), SettingsError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes settings from a JSON file previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<HelperSettings, SettingsError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Like `load_json`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<HelperSettings, SettingsError> {
        if !path.exists() {
            tracing::info!("no settings at {}, using defaults", path.display());
            return Ok(HelperSettings::default());
        }
        Self::load_json(path)
    }

    /// Height in pixels thumbnails are rendered at.
    pub fn thumbnail_height(&self) -> u32 {
        (f64::from(self.preview_height) * 1.5) as u32
    }
}
