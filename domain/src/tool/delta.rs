//! Partial updates produced by tool run mutations.

use super::status::StatusFlag;
use crate::target::Infos;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

/// A single persisted field changed by a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Status(Vec<StatusFlag>),
    StartedAt(Option<DateTime<Utc>>),
    FinishedAt(Option<DateTime<Utc>>),
    RunnerId(Option<String>),
    ResultFile(String),
    Notes(String),
    Tags(Vec<String>),
    Infos(Infos),
}

impl FieldChange {
    /// Persisted field name.
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Status(_) => "status",
            FieldChange::StartedAt(_) => "started_at",
            FieldChange::FinishedAt(_) => "finished_at",
            FieldChange::RunnerId(_) => "runner_id",
            FieldChange::ResultFile(_) => "result_file",
            FieldChange::Notes(_) => "notes",
            FieldChange::Tags(_) => "tags",
            FieldChange::Infos(_) => "infos",
        }
    }

    pub fn value(&self) -> Value {
        match self {
            FieldChange::Status(flags) => json!(flags),
            FieldChange::StartedAt(at) | FieldChange::FinishedAt(at) => {
                json!(at.map(|at| at.to_rfc3339()))
            }
            FieldChange::RunnerId(runner) => json!(runner),
            FieldChange::ResultFile(s) | FieldChange::Notes(s) => json!(s),
            FieldChange::Tags(tags) => json!(tags),
            FieldChange::Infos(infos) => json!(infos),
        }
    }
}

/// The set of fields a mutation changed; persisted as a partial update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolDelta {
    changes: Vec<FieldChange>,
}

impl ToolDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, change: FieldChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.changes.iter().map(FieldChange::field).collect()
    }

    /// `field → value` document for a `$set`-style store update.
    pub fn to_document(&self) -> Map<String, Value> {
        self.changes
            .iter()
            .map(|change| (change.field().to_string(), change.value()))
            .collect()
    }
}
