use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::literal;

/// Arguments the trainer passed to the network module (`ss_network_args`).
///
/// Lookups never fail: absent or oddly typed entries fall back to the
/// caller's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkArgs(BTreeMap<String, Value>);

impl NetworkArgs {
    /// Builds the arguments from the raw metadata value.
    ///
    /// - a JSON object is taken as-is
    /// - a string is parsed as JSON or Python literal syntax
    /// - anything else, or a parse that does not yield a mapping, is empty
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => NetworkArgs(map.clone().into_iter().collect()),
            Some(Value::String(text)) => Self::parse(text),
            _ => NetworkArgs::default(),
        }
    }

    pub fn parse(text: &str) -> Self {
        match literal::parse(text) {
            Ok(Value::Object(map)) => NetworkArgs(map.into_iter().collect()),
            Ok(other) => {
                tracing::debug!("network args are not a mapping: {}", other);
                NetworkArgs::default()
            }
            Err(e) => {
                tracing::debug!("unparsable network args {:?}: {}", text, e);
                NetworkArgs::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads `key` as a float. Numeric strings are parsed, booleans count as
    /// 1/0, anything else yields `default`.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            _ => default,
        }
    }

    /// Reads `key` as a flag. Strings count as set when they spell
    /// `true`, `1`, `yes` or `on` in any case.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
            }
            _ => false,
        }
    }

    /// Reads `key` as lowercased text; empty when absent or null.
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NetworkArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        NetworkArgs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
