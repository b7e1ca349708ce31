pub mod settings;

pub use settings::{BlockPoints, HelperSettings, PreviewPosition, SliderRange};
