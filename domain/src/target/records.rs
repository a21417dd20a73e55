//! Hierarchy objects returned by lookups against the hierarchy store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extra key → value metadata attached to hierarchy objects and tool runs.
pub type Infos = BTreeMap<String, serde_json::Value>;

/// A wave, scope or host as seen by the tool-run core: an identity plus extra infos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: String,
    #[serde(default)]
    pub infos: Infos,
}

impl TargetRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            infos: Infos::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.infos.insert(key.into(), value.into());
        self
    }
}

/// A port record, carrying the detected service and product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub infos: Infos,
}

impl PortRecord {
    pub fn new(id: impl Into<String>, service: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            service: service.into(),
            product: product.into(),
            infos: Infos::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.infos.insert(key.into(), value.into());
        self
    }
}

/// Render an info value for command text: strings without quotes, everything else as JSON.
pub fn info_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
