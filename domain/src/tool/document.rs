//! Persisted layout of a tool run.
//!
//! [`ToolDocument`] is what the document store holds. Timestamps are written
//! as RFC 3339; on read the legacy `dd/mm/YYYY HH:MM:SS` form and the `"None"`
//! sentinel are accepted as well.

use crate::core::error::DomainError;
use crate::target::{DEFAULT_PROTOCOL, Infos};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Collection holding tool runs.
pub const TOOLS_COLLECTION: &str = "tools";

const LEGACY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const UNSET_SENTINEL: &str = "None";

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

/// Ports may be stored as numbers; they are read back as their decimal text.
fn port_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(port) => Ok(port),
        serde_json::Value::Number(port) => Ok(port.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "invalid port {}, expected a string or number",
            other
        ))),
    }
}

/// Raw tool run fields as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wave: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, deserialize_with = "port_text")]
    pub port: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub runner_id: Option<String>,
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub result_file: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub infos: Infos,
}

impl Default for ToolDocument {
    fn default() -> Self {
        Self {
            id: None,
            parent: None,
            name: String::new(),
            wave: String::new(),
            scope: String::new(),
            host: String::new(),
            port: String::new(),
            protocol: default_protocol(),
            level: String::new(),
            text: String::new(),
            started_at: None,
            finished_at: None,
            runner_id: None,
            status: Vec::new(),
            notes: String::new(),
            result_file: String::new(),
            tags: Vec::new(),
            infos: Infos::new(),
        }
    }
}

/// Normalize an optional raw string, mapping the `"None"` sentinel and blanks to `None`.
pub fn unset_to_none(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty() && *v != UNSET_SENTINEL)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    let Some(raw) = unset_to_none(value) else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| DomainError::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
}
