//! Command template catalog backed by the `commands` collection.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use waverun_application::ports::document_store::{Document, DocumentStore, StoreError};
use waverun_application::TemplateCatalog;
use waverun_domain::{CommandTemplate, Level};

pub const COMMANDS_COLLECTION: &str = "commands";

#[derive(Debug, Deserialize)]
struct CommandDocument {
    #[serde(default)]
    text: String,
    #[serde(default)]
    level: String,
}

pub struct DocumentTemplateCatalog {
    store: Arc<dyn DocumentStore>,
}

impl DocumentTemplateCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidDocument {
        collection: COMMANDS_COLLECTION.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl TemplateCatalog for DocumentTemplateCatalog {
    async fn find_template(&self, name: &str) -> Result<Option<CommandTemplate>, StoreError> {
        let mut filter = Document::new();
        filter.insert("name".to_string(), Value::String(name.to_string()));
        let Some(document) = self.store.find_one(COMMANDS_COLLECTION, &filter).await? else {
            debug!("No command template named {}", name);
            return Ok(None);
        };

        let command: CommandDocument =
            serde_json::from_value(Value::Object(document)).map_err(|e| invalid(e.to_string()))?;
        let level: Level = command
            .level
            .parse()
            .map_err(|e: waverun_domain::DomainError| invalid(e.to_string()))?;
        Ok(Some(CommandTemplate::new(command.text, level)))
    }
}
