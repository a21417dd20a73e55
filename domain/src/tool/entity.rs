//! Tool run entity.
//!
//! A [`ToolRun`] is one command template bound to one hierarchy object.
//! Every mutation applies in memory and returns the [`ToolDelta`] of the
//! fields it touched, which the caller persists as a partial update.

use super::delta::{FieldChange, ToolDelta};
use super::document::{ToolDocument, parse_timestamp, unset_to_none};
use super::key::{ToolKey, derive_output_path};
use super::status::{RunState, StatusSet};
use super::template::{CommandTemplate, TargetMetadata, resolve_command};
use crate::core::error::DomainError;
use crate::target::{HierarchyAddress, Infos, Level};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolRun {
    id: Option<String>,
    name: String,
    address: HierarchyAddress,
    text: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    runner_id: Option<String>,
    status: StatusSet,
    notes: String,
    result_file: String,
    tags: Vec<String>,
    infos: Infos,
}

impl ToolRun {
    /// A new idle, unpersisted tool run.
    pub fn new(name: impl Into<String>, address: HierarchyAddress) -> Self {
        Self {
            id: None,
            name: name.into(),
            address,
            text: String::new(),
            started_at: None,
            finished_at: None,
            runner_id: None,
            status: StatusSet::new(),
            notes: String::new(),
            result_file: String::new(),
            tags: Vec::new(),
            infos: Infos::new(),
        }
    }

    /// Explicit command text, used instead of the catalog template.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_infos(mut self, infos: Infos) -> Self {
        self.infos = infos;
        self
    }

    pub fn with_status(mut self, status: StatusSet) -> Self {
        self.status = status;
        self
    }

    /// Hydrate from a stored document, validating level and status vocabulary.
    pub fn from_document(doc: ToolDocument) -> Result<Self, DomainError> {
        let level: Level = doc.level.parse()?;
        let status = StatusSet::parse(&doc.status)?;
        let started_at = parse_timestamp("started_at", doc.started_at.as_deref())?;
        let finished_at = parse_timestamp("finished_at", doc.finished_at.as_deref())?;
        let runner_id = unset_to_none(doc.runner_id.as_deref()).map(str::to_string);

        Ok(Self {
            id: doc.id,
            name: doc.name,
            address: HierarchyAddress::new(
                level,
                doc.wave,
                doc.scope,
                doc.host,
                doc.port,
                doc.protocol,
            ),
            text: doc.text,
            started_at,
            finished_at,
            runner_id,
            status,
            notes: doc.notes,
            result_file: doc.result_file,
            tags: doc.tags,
            infos: doc.infos,
        })
    }

    /// Full persisted layout; `parent` is the identity of the containing hierarchy object.
    pub fn to_document(&self, parent: Option<String>) -> ToolDocument {
        ToolDocument {
            id: self.id.clone(),
            parent,
            name: self.name.clone(),
            wave: self.address.wave_name().to_string(),
            scope: self.address.scope_name().to_string(),
            host: self.address.host_name().to_string(),
            port: self.address.port_number().to_string(),
            protocol: self.address.protocol().to_string(),
            level: self.address.level().to_string(),
            text: self.text.clone(),
            started_at: self.started_at.map(|at| at.to_rfc3339()),
            finished_at: self.finished_at.map(|at| at.to_rfc3339()),
            runner_id: self.runner_id.clone(),
            status: self.status.flags().iter().map(|f| f.to_string()).collect(),
            notes: self.notes.clone(),
            result_file: self.result_file.clone(),
            tags: self.tags.clone(),
            infos: self.infos.clone(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the identity assigned by the store.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &HierarchyAddress {
        &self.address
    }

    pub fn level(&self) -> Level {
        self.address.level()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn runner_id(&self) -> Option<&str> {
        self.runner_id.as_deref()
    }

    pub fn status(&self) -> &StatusSet {
        &self.status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn result_file(&self) -> &str {
        &self.result_file
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn infos(&self) -> &Infos {
        &self.infos
    }

    pub fn key(&self) -> ToolKey {
        ToolKey::derive(&self.name, &self.address)
    }

    pub fn output_path(&self, namespace: &str) -> String {
        derive_output_path(namespace, &self.name, &self.address)
    }

    /// Pick the template to resolve: explicit text first, then the catalog entry.
    pub fn template(
        &self,
        catalog_entry: Option<CommandTemplate>,
    ) -> Result<CommandTemplate, DomainError> {
        if !self.text.trim().is_empty() {
            return Ok(CommandTemplate::new(self.text.clone(), self.level()));
        }
        catalog_entry.ok_or_else(|| DomainError::TemplateNotFound(self.name.clone()))
    }

    pub fn resolve_command(
        &self,
        template: &CommandTemplate,
        output_dir: &str,
        metadata: TargetMetadata<'_>,
    ) -> String {
        resolve_command(template, &self.address, output_dir, metadata)
    }

    /// Idle → Running. Overlays are kept.
    pub fn mark_running(&mut self, runner_id: impl Into<String>, now: DateTime<Utc>) -> ToolDelta {
        let runner_id = runner_id.into();
        self.started_at = Some(now);
        self.finished_at = None;
        self.runner_id = Some(runner_id.clone());
        self.status.set_state(RunState::Running);
        ToolDelta::new()
            .with(FieldChange::StartedAt(self.started_at))
            .with(FieldChange::FinishedAt(None))
            .with(FieldChange::RunnerId(Some(runner_id)))
            .with(FieldChange::Status(self.status.flags()))
    }

    /// Any state → Done. Overlays are kept.
    pub fn mark_done(&mut self, result_file: impl Into<String>, now: DateTime<Utc>) -> ToolDelta {
        self.finished_at = Some(now);
        self.result_file = result_file.into();
        self.status.set_state(RunState::Done);
        ToolDelta::new()
            .with(FieldChange::FinishedAt(self.finished_at))
            .with(FieldChange::ResultFile(self.result_file.clone()))
            .with(FieldChange::Status(self.status.flags()))
    }

    /// Any state → Idle, clearing timestamps and runner. Overlays are kept.
    pub fn mark_not_done(&mut self) -> ToolDelta {
        self.reset(RunState::Idle)
    }

    /// Any state → Error, clearing timestamps and runner. Overlays are kept.
    pub fn mark_error(&mut self) -> ToolDelta {
        self.reset(RunState::Error)
    }

    fn reset(&mut self, state: RunState) -> ToolDelta {
        self.started_at = None;
        self.finished_at = None;
        self.runner_id = None;
        self.status.set_state(state);
        ToolDelta::new()
            .with(FieldChange::StartedAt(None))
            .with(FieldChange::FinishedAt(None))
            .with(FieldChange::RunnerId(None))
            .with(FieldChange::Status(self.status.flags()))
    }

    pub fn set_out_of_time(&mut self) -> ToolDelta {
        let changed = self.status.set_out_of_time();
        self.status_delta(changed)
    }

    pub fn set_in_time(&mut self) -> ToolDelta {
        let changed = self.status.set_in_time();
        self.status_delta(changed)
    }

    pub fn set_out_of_scope(&mut self) -> ToolDelta {
        let changed = self.status.set_out_of_scope();
        self.status_delta(changed)
    }

    pub fn set_in_scope(&mut self) -> ToolDelta {
        let changed = self.status.set_in_scope();
        self.status_delta(changed)
    }

    /// Replace the whole status, e.g. with an externally computed composite.
    pub fn set_status(&mut self, status: StatusSet) -> ToolDelta {
        self.status = status;
        self.status_delta(true)
    }

    fn status_delta(&self, changed: bool) -> ToolDelta {
        if changed {
            ToolDelta::new().with(FieldChange::Status(self.status.flags()))
        } else {
            ToolDelta::new()
        }
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> ToolDelta {
        self.notes = notes.into();
        ToolDelta::new().with(FieldChange::Notes(self.notes.clone()))
    }

    /// Append a tag; duplicates are kept in insertion order.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> ToolDelta {
        self.tags.push(tag.into());
        ToolDelta::new().with(FieldChange::Tags(self.tags.clone()))
    }

    pub fn set_info(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> ToolDelta {
        self.infos.insert(key.into(), value.into());
        ToolDelta::new().with(FieldChange::Infos(self.infos.clone()))
    }

    /// Short label: the name, prefixed with the wave for host and port tools.
    pub fn summary(&self) -> String {
        match self.level() {
            Level::Host | Level::Port => format!("{}-{}", self.address.wave_name(), self.name),
            _ => self.name.clone(),
        }
    }

    /// Label prefixed with the target it runs against.
    pub fn detailed_summary(&self) -> String {
        match self.level() {
            Level::Wave => self.summary(),
            Level::Domain | Level::Network => {
                format!("{} {}", self.address.scope_name(), self.summary())
            }
            Level::Host => format!("{} {}", self.address.host_name(), self.summary()),
            Level::Port => format!(
                "{}:{}/{} {}",
                self.address.host_name(),
                self.address.protocol(),
                self.address.port_number(),
                self.summary()
            ),
        }
    }
}

impl fmt::Display for ToolRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
