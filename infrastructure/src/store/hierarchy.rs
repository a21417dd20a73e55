//! Hierarchy lookups backed by document collections.
//!
//! | Collection | Lookup fields |
//! |------------|---------------|
//! | `waves` | `wave` |
//! | `scopes` | `wave`, `scope` |
//! | `hosts` | `host` |
//! | `ports` | `host`, `port`, `protocol` |

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use waverun_application::ports::document_store::{Document, DocumentStore, ID_FIELD, StoreError};
use waverun_application::HierarchyStore;
use waverun_domain::{PortRecord, TargetRecord};

pub const WAVES_COLLECTION: &str = "waves";
pub const SCOPES_COLLECTION: &str = "scopes";
pub const HOSTS_COLLECTION: &str = "hosts";
pub const PORTS_COLLECTION: &str = "ports";

pub struct DocumentHierarchyStore {
    store: Arc<dyn DocumentStore>,
}

impl DocumentHierarchyStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn find(&self, collection: &str, filter: Value) -> Result<Option<Document>, StoreError> {
        let Value::Object(filter) = filter else {
            return Ok(None);
        };
        self.store.find_one(collection, &filter).await
    }
}

fn string_field(document: &Document, field: &str) -> String {
    match document.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    collection: &str,
    mut document: Document,
) -> Result<T, StoreError> {
    let id = string_field(&document, ID_FIELD);
    document.insert("id".to_string(), Value::String(id));
    serde_json::from_value(Value::Object(document)).map_err(|e| StoreError::InvalidDocument {
        collection: collection.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl HierarchyStore for DocumentHierarchyStore {
    async fn find_wave(&self, wave: &str) -> Result<Option<TargetRecord>, StoreError> {
        self.find(WAVES_COLLECTION, json!({"wave": wave}))
            .await?
            .map(|doc| decode(WAVES_COLLECTION, doc))
            .transpose()
    }

    async fn find_scope(
        &self,
        wave: &str,
        scope: &str,
    ) -> Result<Option<TargetRecord>, StoreError> {
        self.find(SCOPES_COLLECTION, json!({"wave": wave, "scope": scope}))
            .await?
            .map(|doc| decode(SCOPES_COLLECTION, doc))
            .transpose()
    }

    async fn find_host(&self, host: &str) -> Result<Option<TargetRecord>, StoreError> {
        self.find(HOSTS_COLLECTION, json!({"host": host}))
            .await?
            .map(|doc| decode(HOSTS_COLLECTION, doc))
            .transpose()
    }

    async fn find_port(
        &self,
        host: &str,
        port: &str,
        protocol: &str,
    ) -> Result<Option<PortRecord>, StoreError> {
        self.find(
            PORTS_COLLECTION,
            json!({"host": host, "port": port, "protocol": protocol}),
        )
        .await?
        .map(|doc| decode(PORTS_COLLECTION, doc))
        .transpose()
    }
}
