//! Uniqueness key and output directory derivation.

use crate::target::{HierarchyAddress, Level};
use serde::{Deserialize, Serialize};

/// Storage uniqueness key of a tool run.
///
/// Fields not meaningful at `level` are empty strings, so two tool runs
/// collide only when they target the same hierarchy object with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolKey {
    pub wave: String,
    pub scope: String,
    pub host: String,
    pub port: String,
    pub protocol: String,
    pub name: String,
    pub level: Level,
}

impl ToolKey {
    pub fn derive(name: &str, address: &HierarchyAddress) -> Self {
        let mut key = Self {
            wave: address.wave_name().to_string(),
            scope: String::new(),
            host: String::new(),
            port: String::new(),
            protocol: String::new(),
            name: name.to_string(),
            level: address.level(),
        };
        match address.level() {
            Level::Wave => {}
            Level::Domain | Level::Network => key.scope = address.scope_name().to_string(),
            Level::Host => key.host = address.host_name().to_string(),
            Level::Port => {
                key.host = address.host_name().to_string();
                key.port = address.port_number().to_string();
                key.protocol = address.protocol().to_string();
            }
        }
        key
    }

    /// The key as a store filter document.
    pub fn to_filter(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            // A struct of strings always serializes to an object.
            _ => serde_json::Map::new(),
        }
    }

    /// Filters for records of this key written under a legacy level name.
    pub fn legacy_filters(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.level
            .legacy_name()
            .map(|name| {
                let mut filter = self.to_filter();
                filter.insert("level".to_string(), serde_json::Value::String(name.to_string()));
                filter
            })
            .into_iter()
            .collect()
    }
}

/// Make a value safe to use as a single path segment.
pub fn sanitize_segment(value: &str) -> String {
    value.replace(['/', ' ', ':'], "_")
}

/// Directory an executor must create before running the tool.
///
/// Layout: `namespace/name/[wave/][scope/][host/][port/]`, where the port
/// segment is `port` for tcp and `protocol/port` otherwise.
pub fn derive_output_path(namespace: &str, name: &str, address: &HierarchyAddress) -> String {
    let mut path = format!("{}/{}/", sanitize_segment(namespace), sanitize_segment(name));
    for segment in [
        address.wave_name(),
        address.scope_name(),
        address.host_name(),
    ] {
        if !segment.is_empty() {
            path.push_str(&sanitize_segment(segment));
            path.push('/');
        }
    }
    if !address.port_number().is_empty() {
        if address.protocol() != "tcp" {
            path.push_str(&sanitize_segment(address.protocol()));
            path.push('/');
        }
        path.push_str(&sanitize_segment(address.port_number()));
        path.push('/');
    }
    path
}
