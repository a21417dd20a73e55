//! Register Tool use case.
//!
//! Creates tool runs idempotently: a tool run whose [`ToolKey`] already
//! exists is not inserted again, the existing identity is returned instead.
//! Also re-hydrates and deletes tool runs by identity.

use super::locate_parent::ParentLocator;
use crate::ports::document_store::{Document, DocumentStore, ID_FIELD, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use waverun_domain::{DomainError, TOOLS_COLLECTION, ToolDocument, ToolKey, ToolRun};

/// Errors that can occur while registering or loading tool runs.
#[derive(Error, Debug)]
pub enum RegisterToolError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid tool record: {0}")]
    Domain(#[from] DomainError),

    #[error("Could not encode tool record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Tool '{0}' has no identity")]
    NotPersisted(String),
}

/// Outcome of [`RegisterToolUseCase::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// `false` when a tool run with the same key already existed.
    pub created: bool,
    pub id: String,
}

pub struct RegisterToolUseCase {
    store: Arc<dyn DocumentStore>,
    parents: ParentLocator,
}

impl Clone for RegisterToolUseCase {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            parents: self.parents.clone(),
        }
    }
}

impl RegisterToolUseCase {
    pub fn new(store: Arc<dyn DocumentStore>, parents: ParentLocator) -> Self {
        Self { store, parents }
    }

    /// Persist `tool` unless its key is already taken; `tool` receives the identity either way.
    pub async fn execute(&self, tool: &mut ToolRun) -> Result<Registration, RegisterToolError> {
        let key = tool.key();
        if let Some(id) = self.find_legacy(&key).await? {
            debug!("Tool {} already registered as {} (legacy level)", tool.detailed_summary(), id);
            tool.assign_id(id.clone());
            return Ok(Registration { created: false, id });
        }

        let key = key.to_filter();
        let parent = self.parents.parent_id(tool.address()).await;
        let document = to_document(&tool.to_document(parent.clone()))?;

        let outcome = self
            .store
            .insert_if_absent(TOOLS_COLLECTION, &key, document, parent.as_deref())
            .await?;
        tool.assign_id(outcome.id());

        if outcome.is_inserted() {
            info!("Registered tool {} as {}", tool.detailed_summary(), outcome.id());
        } else {
            debug!(
                "Tool {} already registered as {}",
                tool.detailed_summary(),
                outcome.id()
            );
        }

        Ok(Registration {
            created: outcome.is_inserted(),
            id: outcome.id().to_string(),
        })
    }

    /// Re-hydrate a tool run by identity.
    pub async fn load(&self, id: &str) -> Result<Option<ToolRun>, RegisterToolError> {
        match self.store.find_by_id(TOOLS_COLLECTION, id).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Look a tool run up by its uniqueness key.
    pub async fn find(&self, key: &ToolKey) -> Result<Option<ToolRun>, RegisterToolError> {
        for filter in std::iter::once(key.to_filter()).chain(key.legacy_filters()) {
            if let Some(document) = self.store.find_one(TOOLS_COLLECTION, &filter).await? {
                return Ok(Some(from_document(document)?));
            }
        }
        Ok(None)
    }

    /// Identity of a record of `key` stored under a legacy level name.
    ///
    /// New records are always written with the current name, so only
    /// pre-existing records can match here.
    async fn find_legacy(&self, key: &ToolKey) -> Result<Option<String>, RegisterToolError> {
        for filter in key.legacy_filters() {
            if let Some(document) = self.store.find_one(TOOLS_COLLECTION, &filter).await? {
                let id = document
                    .get(ID_FIELD)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Every tool run matching `filter`; an empty filter lists them all.
    pub async fn list(&self, filter: &Document) -> Result<Vec<ToolRun>, RegisterToolError> {
        self.store
            .find_many(TOOLS_COLLECTION, filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Delete the stored record of `tool`. Returns whether it existed.
    pub async fn delete(&self, tool: &ToolRun) -> Result<bool, RegisterToolError> {
        let id = tool
            .id()
            .ok_or_else(|| RegisterToolError::NotPersisted(tool.summary()))?;
        let removed = self.store.delete(TOOLS_COLLECTION, id).await?;
        if removed {
            info!("Deleted tool {} ({})", tool.detailed_summary(), id);
        }
        Ok(removed)
    }
}

fn to_document(document: &ToolDocument) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(document)? {
        serde_json::Value::Object(map) => Ok(map),
        // A struct always serializes to an object.
        _ => Ok(Document::new()),
    }
}

fn from_document(document: Document) -> Result<ToolRun, RegisterToolError> {
    let document: ToolDocument = serde_json::from_value(serde_json::Value::Object(document))?;
    Ok(ToolRun::from_document(document)?)
}
