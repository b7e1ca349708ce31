pub mod algorithm;
pub mod architecture;
pub mod blocks;
pub mod classifier;

pub use algorithm::infer_algorithm;
pub use architecture::{infer_architecture, SdVersion};
pub use blocks::infer_blocks;
pub use classifier::{classify, ClassificationResult, ClassifierInput};
