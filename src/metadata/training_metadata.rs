use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::network_args::NetworkArgs;

/// Key under which trainers store the network module path.
pub const NETWORK_MODULE_KEY: &str = "ss_network_module";
/// Key under which trainers store the network arguments.
pub const NETWORK_ARGS_KEY: &str = "ss_network_args";
/// Key under which trainers store the base model version string.
pub const BASE_MODEL_VERSION_KEY: &str = "ss_base_model_version";
/// Key holding the name the trainer gave its output file.
pub const OUTPUT_NAME_KEY: &str = "ss_output_name";

/// Training metadata embedded in a model file.
///
/// Safetensors files carry this as the string-to-string `__metadata__` header
/// section, but other loaders hand over typed values, so values are kept as
/// JSON. Absent keys read as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingMetadata(BTreeMap<String, Value>);

impl TrainingMetadata {
    pub fn new() -> Self {
        TrainingMetadata(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value under `key` only when it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Network arguments stored under `ss_network_args`, parsed when stored as text.
    pub fn network_args(&self) -> NetworkArgs {
        NetworkArgs::from_value(self.get(NETWORK_ARGS_KEY))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TrainingMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TrainingMetadata(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for TrainingMetadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
