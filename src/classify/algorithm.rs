use crate::metadata::network_args::NetworkArgs;
use crate::metadata::training_metadata::{TrainingMetadata, NETWORK_MODULE_KEY};

/// The network arguments the algorithm waterfall looks at.
///
/// Absent or unreadable values take the defaults trainers imply:
/// `-1` for the conv dimensions, `false` for `dora_wd`, empty text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmArgs {
    pub conv_dim: f64,
    pub conv_alpha: f64,
    pub algo: String,
    pub unit: String,
    pub dora_wd: bool,
}

impl AlgorithmArgs {
    pub fn from_network_args(args: &NetworkArgs) -> Self {
        AlgorithmArgs {
            conv_dim: args.number("conv_dim", -1.0),
            conv_alpha: args.number("conv_alpha", -1.0),
            algo: args.text("algo"),
            unit: args.text("unit"),
            dora_wd: args.flag("dora_wd"),
        }
    }

    /// True when the network also trains the 3x3 conv layers.
    fn has_conv(&self) -> bool {
        self.conv_dim > 0.0 || self.conv_alpha > 0.0
    }

    fn lycoris_qualifier(&self) -> &'static str {
        if self.dora_wd {
            return "(DoRA)";
        }
        match self.algo.as_str() {
            "lora" => "(LoCon)",
            "locon" if !self.unit.is_empty() => "(DyLoRA)",
            "locon" => "(LoCon)",
            "loha" => "(LoHa)",
            "lokr" => "(Lokr)",
            "ia3" => "(IA3)",
            "full" => "(Full)",
            "glora" => "(GLoRA)",
            _ => "",
        }
    }
}

/// Infers the LoRA-family algorithm label from the training metadata.
///
/// Returns `None` when `ss_network_module` is missing or `"Unknown"`.
/// The module path is matched by substring, first match wins.
pub fn infer_algorithm(metadata: &TrainingMetadata, args: &NetworkArgs) -> Option<String> {
    let module = metadata.get_str(NETWORK_MODULE_KEY)?;
    if module.is_empty() || module == "Unknown" {
        return None;
    }
    let args = AlgorithmArgs::from_network_args(args);

    let label = if module.contains("locon.locon_kohya") {
        "LoCon".to_owned()
    } else if module.contains("lycoris.kohya") {
        format!("LyCORIS{}", args.lycoris_qualifier())
    } else if module.contains("networks.dylora") {
        if args.algo == "dylora" && !args.unit.is_empty() && args.has_conv() {
            "DyLoRA(C3Lier)".to_owned()
        } else {
            "DyLoRA(LierLa)".to_owned()
        }
    } else if args.has_conv() {
        "LoRA(C3Lier)".to_owned()
    } else {
        "LoRA(LierLa)".to_owned()
    };
    Some(label)
}
