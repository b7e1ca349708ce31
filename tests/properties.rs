use proptest::prelude::*;
use serde_json::Value;

use weight_helper::classify::{infer_algorithm, infer_blocks};
use weight_helper::{classify, ClassifierInput, NetworkArgs, SdVersion, TrainingMetadata};

fn module() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        Just("networks.lora".to_owned()),
        Just("networks.dylora".to_owned()),
        Just("lycoris.kohya".to_owned()),
        Just("locon.locon_kohya".to_owned()),
        Just("Unknown".to_owned()),
        "[a-z._]{0,20}",
    ])
}

fn arg_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z0-9.-]{0,6}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn network_args() -> impl Strategy<Value = NetworkArgs> {
    prop::collection::btree_map(
        prop_oneof![
            Just("conv_dim".to_owned()),
            Just("conv_alpha".to_owned()),
            Just("algo".to_owned()),
            Just("unit".to_owned()),
            Just("dora_wd".to_owned()),
        ],
        arg_value(),
        0..5,
    )
    .prop_map(|map| map.into_iter().collect())
}

/// Keys built from the fragments real LoRA files use, so every naming
/// convention (and its malformed variants) gets exercised.
fn weight_key() -> impl Strategy<Value = String> {
    let prefix = prop_oneof![
        Just("lora_unet_down_blocks"),
        Just("lora_unet_mid_block"),
        Just("lora_unet_up_blocks"),
        Just("lora_unet_input_blocks"),
        Just("lora_unet_middle_block"),
        Just("lora_unet_output_blocks"),
        Just("lora_unet_single_blocks"),
        Just("lora_unet_double_blocks"),
        Just("lora_unet_joint_blocks"),
        Just("lora_te_text_model"),
        Just("transformer.transformer_blocks"),
        Just("transformer.single_transformer_blocks"),
    ];
    let middle = prop::collection::vec(
        prop_oneof![
            (0u8..40).prop_map(|n| n.to_string()),
            Just("attentions".to_owned()),
            Just("transformer_blocks".to_owned()),
            Just("x".to_owned()),
        ],
        0..6,
    );
    let sep = prop_oneof![Just("_"), Just(".")];
    (prefix, middle, sep).prop_map(|(prefix, parts, sep)| {
        let mut key = prefix.to_owned();
        for part in parts {
            key.push_str(sep);
            key.push_str(&part);
        }
        key.push_str(".lora_down.weight");
        key
    })
}

proptest! {
    #[test]
    fn algorithm_inference_is_total_and_stable(module in module(), args in network_args()) {
        let mut metadata = TrainingMetadata::new();
        if let Some(module) = &module {
            metadata.insert("ss_network_module", module.as_str());
        }

        let first = infer_algorithm(&metadata, &args);
        prop_assert_eq!(&first, &infer_algorithm(&metadata, &args));
        match module.as_deref() {
            None | Some("") | Some("Unknown") => prop_assert!(first.is_none()),
            Some(_) => prop_assert!(first.is_some()),
        }
    }

    #[test]
    fn block_inference_is_total_and_stable(keys in prop::collection::vec(weight_key(), 0..12)) {
        let first = infer_blocks(&keys);
        prop_assert_eq!(&first, &infer_blocks(&keys));

        if let Ok(Some(blocks)) = first {
            let mut sorted = blocks.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted, blocks);
        }
    }

    #[test]
    fn block_order_does_not_matter(keys in prop::collection::vec(weight_key(), 0..12)) {
        let mut reversed = keys.clone();
        reversed.reverse();
        // Which malformed key gets reported may differ; the outcome may not.
        prop_assert_eq!(infer_blocks(&keys).ok(), infer_blocks(&reversed).ok());
    }

    #[test]
    fn classify_never_fails(
        module in module(),
        version in prop::option::of("[a-z0-9_]{0,12}"),
        host in prop::option::of(prop_oneof![Just("SD1"), Just("SDXL"), Just("Unknown")]),
        keys in prop::option::of(prop::collection::vec(weight_key(), 0..8)),
    ) {
        let mut metadata = TrainingMetadata::new();
        if let Some(module) = module {
            metadata.insert("ss_network_module", module);
        }
        if let Some(version) = version {
            metadata.insert("ss_base_model_version", version);
        }
        let host = host.map(SdVersion::from_name);

        let input = ClassifierInput {
            host_version: host.as_ref(),
            metadata: &metadata,
            weight_keys: keys.as_deref(),
        };
        let first = classify(&input);
        prop_assert_eq!(&first, &classify(&input));
        if keys.is_none() {
            prop_assert!(first.blocks.is_none());
        }
        if host.is_some() {
            prop_assert!(first.model_type.is_some());
        }
    }
}
