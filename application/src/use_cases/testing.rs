//! In-memory fakes of the ports, shared by use case tests.

use crate::ports::document_store::{
    Document, DocumentStore, ID_FIELD, InsertOutcome, PARENT_FIELD, StoreError, matches_filter,
};
use crate::ports::hierarchy_store::HierarchyStore;
use crate::ports::template_catalog::TemplateCatalog;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use waverun_domain::{CommandTemplate, PortRecord, TargetRecord};

#[derive(Default)]
pub struct FakeStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    pub updates: Mutex<Vec<(String, Document)>>,
    next_id: Mutex<u32>,
}

impl FakeStore {
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Store a document as-is, as if written by another client.
    pub fn seed(&self, collection: &str, document: Document) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn recorded_updates(&self) -> Vec<(String, Document)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .documents(collection)
            .into_iter()
            .find(|doc| matches_filter(doc, filter)))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|doc| matches_filter(doc, filter))
            .collect())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &Document,
        mut document: Document,
        parent: Option<&str>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs.iter().find(|doc| matches_filter(doc, key)) {
            let id = existing[ID_FIELD].as_str().unwrap_or_default().to_string();
            return Ok(InsertOutcome::Existing(id));
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("id-{}", *next);
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        if let Some(parent) = parent {
            document.insert(PARENT_FIELD.to_string(), Value::String(parent.to_string()));
        }
        docs.push(document);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn update(&self, collection: &str, id: &str, delta: Document) -> Result<(), StoreError> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), delta.clone()));
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc[ID_FIELD] == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.extend(delta);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| doc[ID_FIELD] != id);
        Ok(docs.len() != before)
    }
}

#[derive(Default)]
pub struct FakeHierarchy {
    pub waves: HashMap<String, TargetRecord>,
    pub scopes: HashMap<(String, String), TargetRecord>,
    pub hosts: HashMap<String, TargetRecord>,
    pub ports: HashMap<(String, String, String), PortRecord>,
}

#[async_trait]
impl HierarchyStore for FakeHierarchy {
    async fn find_wave(&self, wave: &str) -> Result<Option<TargetRecord>, StoreError> {
        Ok(self.waves.get(wave).cloned())
    }

    async fn find_scope(
        &self,
        wave: &str,
        scope: &str,
    ) -> Result<Option<TargetRecord>, StoreError> {
        Ok(self
            .scopes
            .get(&(wave.to_string(), scope.to_string()))
            .cloned())
    }

    async fn find_host(&self, host: &str) -> Result<Option<TargetRecord>, StoreError> {
        Ok(self.hosts.get(host).cloned())
    }

    async fn find_port(
        &self,
        host: &str,
        port: &str,
        protocol: &str,
    ) -> Result<Option<PortRecord>, StoreError> {
        Ok(self
            .ports
            .get(&(host.to_string(), port.to_string(), protocol.to_string()))
            .cloned())
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub templates: HashMap<String, CommandTemplate>,
}

#[async_trait]
impl TemplateCatalog for FakeCatalog {
    async fn find_template(&self, name: &str) -> Result<Option<CommandTemplate>, StoreError> {
        Ok(self.templates.get(name).cloned())
    }
}
