use serde::{Deserialize, Serialize};

use crate::classify::algorithm::infer_algorithm;
use crate::classify::architecture::{infer_architecture, SdVersion};
use crate::classify::blocks::infer_blocks;
use crate::metadata::training_metadata::TrainingMetadata;

/// Everything the classifier looks at for one model.
///
/// `weight_keys` is `None` when block parsing is disabled or the keys could
/// not be read; `blocks` is then left unset.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub host_version: Option<&'a SdVersion>,
    pub metadata: &'a TrainingMetadata,
    pub weight_keys: Option<&'a [String]>,
}

/// Outcome of classifying one model. Any field may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Base architecture tag: `SD`, `SDXL`, `FLUX` or a raw host version name.
    pub model_type: Option<String>,
    /// LoRA-family algorithm label, e.g. `LyCORIS(LoHa)`.
    pub algorithm: Option<String>,
    /// Sorted block labels the weights touch.
    pub blocks: Option<Vec<String>>,
}

/// Classifies one model. Never fails: malformed weight keys leave `blocks` unset.
pub fn classify(input: &ClassifierInput<'_>) -> ClassificationResult {
    let args = input.metadata.network_args();

    let blocks = input.weight_keys.and_then(|keys| match infer_blocks(keys) {
        Ok(blocks) => blocks,
        Err(e) => {
            tracing::debug!("block inference failed: {}", e);
            None
        }
    });

    ClassificationResult {
        model_type: infer_architecture(input.host_version, input.metadata),
        algorithm: infer_algorithm(input.metadata, &args),
        blocks,
    }
}
