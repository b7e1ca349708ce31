use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::BlockError;

static DOWN_MID_UP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^lora_unet_(down|mid|up)_").expect("Invalid down/mid/up regex"));
static INPUT_MIDDLE_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^lora_unet_(input|middle|output)_").expect("Invalid input/middle/output regex")
});
static SINGLE_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^lora_unet_(single|double)_").expect("Invalid single/double regex"));
static JOINT_BLOCKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^lora_unet_joint_blocks_").expect("Invalid joint blocks regex"));

/// Single-stream transformer blocks past this index wrap around onto the
/// combined `FL` numbering.
const SINGLE_BLOCK_WRAP: i64 = 18;

/// Works out which network blocks a LoRA touches from its weight key names.
///
/// Returns the sorted, deduplicated block labels (`BASE`, `INxx`, `M00`,
/// `OUTxx`, `FLxx`), or `None` when the key naming is not recognized.
///
/// Naming conventions, tried in order:
/// - kohya U-Net keys (`lora_unet_...`): `down/mid/up` (diffusers block
///   numbering), `input/middle/output` (LDM U-Net numbering),
///   `single/double` (FLUX transformer); `joint_blocks` (SD3) is known but
///   unsupported and yields `None`
/// - diffusers U-Net keys (`...attentions...transformer_blocks...`): yields `None`
/// - diffusers transformer keys (`transformer.transformer_blocks.N...`,
///   `transformer.single_transformer_blocks.N...`): FLUX numbering
///
/// A key that matches a convention but does not have its shape is an error.
pub fn infer_blocks<S: AsRef<str>>(keys: &[S]) -> Result<Option<Vec<String>>, BlockError> {
    let all: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
    let unet: Vec<&str> = all.iter().copied().filter(|k| k.starts_with("lora_unet")).collect();

    if !unet.is_empty() {
        let matched = matching(&unet, &DOWN_MID_UP);
        if !matched.is_empty() {
            tracing::debug!("{} keys use down/mid/up naming", matched.len());
            let labels = matched
                .iter()
                .filter(|k| k.contains("transformer_blocks"))
                .map(|k| join_tokens(k, &[2, 4, 6]))
                .collect::<Result<BTreeSet<_>, _>>()?;
            return format_down_mid_up(&labels).map(Some);
        }

        let matched = matching(&unet, &INPUT_MIDDLE_OUTPUT);
        if !matched.is_empty() {
            tracing::debug!("{} keys use input/middle/output naming", matched.len());
            let labels = matched
                .iter()
                .filter(|k| k.contains("transformer_blocks"))
                .map(|k| join_tokens(k, &[2, 4]))
                .collect::<Result<BTreeSet<_>, _>>()?;
            return format_input_middle_output(&labels).map(Some);
        }

        let matched = matching(&unet, &SINGLE_DOUBLE);
        if !matched.is_empty() {
            tracing::debug!("{} keys use single/double naming", matched.len());
            let labels = matched
                .iter()
                .map(|k| join_tokens(k, &[2, 4]))
                .collect::<Result<BTreeSet<_>, _>>()?;
            return format_single_double(&labels).map(Some);
        }

        if unet.iter().any(|k| JOINT_BLOCKS.is_match(k)) {
            tracing::debug!("joint_blocks naming is not supported");
            return Ok(None);
        }
    }

    // Diffusers U-Net naming. Not mapped to block labels yet.
    if all.iter().any(|k| k.contains("transformer_blocks") && k.contains("attentions")) {
        tracing::debug!("diffusers attentions naming is not supported");
        return Ok(None);
    }

    let transformer: BTreeSet<String> = all
        .iter()
        .filter(|k| k.starts_with("transformer") && k.contains("transformer_blocks"))
        .map(|k| {
            let segments: Vec<&str> = k.split('.').collect();
            let end = segments.len().min(3);
            let start = segments.len().min(1);
            segments[start..end]
                .join(".")
                .replace("single_transformer_blocks.", "single_")
                .replace("transformer_blocks.", "double_")
        })
        .collect();
    if !transformer.is_empty() {
        tracing::debug!("{} block labels use diffusers transformer naming", transformer.len());
        return format_single_double(&transformer).map(Some);
    }

    Ok(None)
}

fn matching<'a>(keys: &[&'a str], pattern: &Regex) -> Vec<&'a str> {
    keys.iter().copied().filter(|k| pattern.is_match(k)).collect()
}

/// Joins the `_`-separated tokens of `key` at `indices` with `_`.
fn join_tokens(key: &str, indices: &[usize]) -> Result<String, BlockError> {
    let tokens: Vec<&str> = key.split('_').collect();
    let picked = indices
        .iter()
        .map(|&i| tokens.get(i).copied())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BlockError::TooFewSegments { key: key.to_owned() })?;
    Ok(picked.join("_"))
}

/// Splits `label` into exactly `n` `_`-separated parts.
fn split_exact<'a>(label: &'a str, n: usize) -> Result<Vec<&'a str>, BlockError> {
    let parts: Vec<&str> = label.split('_').collect();
    if parts.len() != n {
        return Err(BlockError::BadShape { label: label.to_owned() });
    }
    Ok(parts)
}

fn parse_index(label: &str, index: &str) -> Result<i64, BlockError> {
    index.trim().parse().map_err(|_| BlockError::BadIndex {
        label: label.to_owned(),
        index: index.to_owned(),
    })
}

/// `down_<i>_<j>` → `IN{3i+j+1}`, `mid_*` → `M00`, `up_<i>_<j>` → `OUT{3i+j}`.
fn format_down_mid_up(labels: &BTreeSet<String>) -> Result<Vec<String>, BlockError> {
    let mut blocks = BTreeSet::from(["BASE".to_owned()]);
    for label in labels {
        let (kind, rest) = label
            .split_once('_')
            .ok_or_else(|| BlockError::BadShape { label: label.clone() })?;
        let (prefix, offset) = match kind {
            "mid" => {
                blocks.insert("M00".to_owned());
                continue;
            }
            "down" => ("IN", 1),
            "up" => ("OUT", 0),
            _ => return Err(BlockError::BadShape { label: label.clone() }),
        };
        let parts = split_exact(rest, 2)?;
        let block = parse_index(label, parts[0])?;
        let layer = parse_index(label, parts[1])?;
        let index = block
            .checked_mul(3)
            .and_then(|i| i.checked_add(layer))
            .and_then(|i| i.checked_add(offset))
            .ok_or_else(|| BlockError::BadIndex { label: label.clone(), index: rest.to_owned() })?;
        blocks.insert(format!("{prefix}{index:02}"));
    }
    Ok(blocks.into_iter().collect())
}

/// `input_<v>` → `IN{v}`, `middle_*` → `M00`, `output_<v>` → `OUT{v}`.
fn format_input_middle_output(labels: &BTreeSet<String>) -> Result<Vec<String>, BlockError> {
    let mut blocks = BTreeSet::from(["BASE".to_owned()]);
    for label in labels {
        let parts = split_exact(label, 2)?;
        let prefix = match parts[0] {
            "middle" => {
                blocks.insert("M00".to_owned());
                continue;
            }
            "input" => "IN",
            "output" => "OUT",
            _ => return Err(BlockError::BadShape { label: label.clone() }),
        };
        let index = parse_index(label, parts[1])?;
        blocks.insert(format!("{prefix}{index:02}"));
    }
    Ok(blocks.into_iter().collect())
}

/// `double_<v>` → `FL{v}`; `single_<v>` → `FL{v}`, wrapping indices past 18.
fn format_single_double(labels: &BTreeSet<String>) -> Result<Vec<String>, BlockError> {
    let mut blocks = BTreeSet::new();
    for label in labels {
        let parts = split_exact(label, 2)?;
        let mut index = parse_index(label, parts[1])?;
        if parts[0] == "single" && index > SINGLE_BLOCK_WRAP {
            index -= SINGLE_BLOCK_WRAP + 1;
        }
        blocks.insert(format!("FL{index:02}"));
    }
    Ok(blocks.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(keys: &[&str]) -> Option<Vec<String>> {
        infer_blocks(keys).expect("keys are well formed")
    }

    fn labels(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn down_mid_up_sd15() {
        let keys = [
            "lora_unet_down_blocks_0_attentions_0_transformer_blocks_0_attn1_to_k.lora_down.weight",
            "lora_unet_down_blocks_0_attentions_0_transformer_blocks_0_attn1_to_k.lora_up.weight",
            "lora_unet_down_blocks_2_attentions_1_transformer_blocks_0_ff_net_2.alpha",
            "lora_unet_mid_block_attentions_0_transformer_blocks_0_attn2_to_q.lora_down.weight",
            "lora_unet_up_blocks_1_attentions_2_transformer_blocks_0_attn1_to_v.lora_down.weight",
            "lora_unet_up_blocks_3_attentions_0_transformer_blocks_0_attn1_to_v.lora_down.weight",
            "lora_unet_down_blocks_0_attentions_0_proj_in.lora_down.weight",
            "lora_te_text_model_encoder_layers_0_mlp_fc1.lora_down.weight",
        ];
        assert_eq!(blocks(&keys), labels(&["BASE", "IN01", "IN08", "M00", "OUT05", "OUT09"]));
    }

    #[test]
    fn down_mid_up_without_transformer_keys_is_base_only() {
        let keys = ["lora_unet_down_blocks_0_resnets_0_conv1.lora_down.weight"];
        assert_eq!(blocks(&keys), labels(&["BASE"]));
    }

    #[test]
    fn input_middle_output_sdxl() {
        let keys = [
            "lora_unet_input_blocks_4_1_transformer_blocks_0_attn1_to_k.lora_down.weight",
            "lora_unet_input_blocks_8_1_transformer_blocks_9_attn1_to_k.lora_down.weight",
            "lora_unet_middle_block_1_transformer_blocks_3_attn2_to_out_0.lora_down.weight",
            "lora_unet_output_blocks_0_1_transformer_blocks_0_ff_net_0_proj.lora_down.weight",
            "lora_unet_output_blocks_5_1_transformer_blocks_1_ff_net_0_proj.lora_down.weight",
            "lora_unet_input_blocks_1_0_emb_layers_1.lora_down.weight",
        ];
        assert_eq!(blocks(&keys), labels(&["BASE", "IN04", "IN08", "M00", "OUT00", "OUT05"]));
    }

    #[test]
    fn single_double_flux_wraps_single_indices() {
        let keys = [
            "lora_unet_double_blocks_0_img_attn_proj.lora_down.weight",
            "lora_unet_double_blocks_18_txt_mlp_0.lora_down.weight",
            "lora_unet_single_blocks_5_linear1.lora_down.weight",
            "lora_unet_single_blocks_19_linear1.lora_down.weight",
            "lora_unet_single_blocks_37_linear2.lora_down.weight",
        ];
        assert_eq!(blocks(&keys), labels(&["FL00", "FL05", "FL18"]));
    }

    #[test]
    fn joint_blocks_are_unsupported() {
        let keys = ["lora_unet_joint_blocks_0_context_block_attn_proj.lora_down.weight"];
        assert_eq!(blocks(&keys), None);
    }

    #[test]
    fn diffusers_attentions_naming_is_a_known_gap() {
        let keys = ["unet.down_blocks.0.attentions.0.transformer_blocks.0.attn1.to_k.lora_A.weight"];
        assert_eq!(blocks(&keys), None);
    }

    #[test]
    fn diffusers_transformer_naming() {
        let keys = [
            "transformer.transformer_blocks.3.attn.to_k.lora_A.weight",
            "transformer.transformer_blocks.3.attn.to_v.lora_A.weight",
            "transformer.single_transformer_blocks.2.proj_out.lora_B.weight",
            "transformer.single_transformer_blocks.20.proj_out.lora_B.weight",
        ];
        assert_eq!(blocks(&keys), labels(&["FL01", "FL02", "FL03"]));
    }

    #[test]
    fn unrecognized_unet_naming_falls_through() {
        let keys = [
            "lora_unet_something_else_0.lora_down.weight",
            "transformer.transformer_blocks.7.attn.to_q.lora_A.weight",
        ];
        assert_eq!(blocks(&keys), labels(&["FL07"]));
    }

    #[test]
    fn unknown_naming_is_none() {
        assert_eq!(blocks(&["lora_te_text_model_encoder_layers_0_mlp_fc1.lora_down.weight"]), None);
        assert_eq!(blocks(&[] as &[&str]), None);
    }

    #[test]
    fn short_keys_are_errors() {
        let err = infer_blocks(&["lora_unet_down_transformer_blocks"]).unwrap_err();
        assert!(matches!(err, BlockError::TooFewSegments { .. }));
    }

    #[test]
    fn non_integer_indices_are_errors() {
        let err = infer_blocks(&["lora_unet_single_blocks_x_linear1.lora_down.weight"]).unwrap_err();
        assert!(matches!(err, BlockError::BadIndex { .. }));
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let err = infer_blocks(&[
            "lora_unet_down_blocks_9223372036854775807_attentions_0_transformer_blocks_0_attn1.weight",
        ])
        .unwrap_err();
        assert!(matches!(err, BlockError::BadIndex { .. }));

        let err = infer_blocks(&[
            "lora_unet_up_blocks_3074457345618258602_attentions_9_transformer_blocks_0_attn1.weight",
        ])
        .unwrap_err();
        assert!(matches!(err, BlockError::BadIndex { .. }));
    }

    #[test]
    fn malformed_transformer_key_is_an_error() {
        let err = infer_blocks(&["transformer.transformer_blocks"]).unwrap_err();
        assert!(matches!(err, BlockError::BadIndex { .. }));
        let err = infer_blocks(&["transformer.transformer_blocks.1_2"]).unwrap_err();
        assert!(matches!(err, BlockError::BadShape { .. }));
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let keys = [
            "lora_unet_up_blocks_0_attentions_0_transformer_blocks_0_a.weight",
            "lora_unet_up_blocks_0_attentions_0_transformer_blocks_1_a.weight",
            "lora_unet_down_blocks_0_attentions_1_transformer_blocks_0_a.weight",
        ];
        let out = blocks(&keys).unwrap();
        let mut sorted = out.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(out, sorted);
        assert_eq!(out, vec!["BASE", "IN02", "OUT00"]);
    }
}
