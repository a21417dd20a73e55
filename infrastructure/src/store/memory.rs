//! In-memory document store with JSON snapshot persistence.
//!
//! All collections sit behind one mutex, which makes
//! [`insert_if_absent`](DocumentStore::insert_if_absent) a single critical
//! section: the existence check and the insert cannot interleave with
//! another writer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};
use waverun_application::ports::document_store::{
    Document, DocumentStore, ID_FIELD, InsertOutcome, PARENT_FIELD, StoreError, matches_filter,
};

/// Errors while reading or writing a snapshot file.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Document>>,
}

/// Document store keeping every collection in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Snapshot>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot; a missing file yields an empty store.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let mut snapshot: Snapshot = serde_json::from_str(&raw)?;

        // Never reissue an identity already present in the file.
        let highest = snapshot
            .collections
            .values()
            .flatten()
            .filter_map(|document| document.get(ID_FIELD).and_then(Value::as_str))
            .filter_map(parse_id)
            .max()
            .unwrap_or(0);
        snapshot.next_id = snapshot.next_id.max(highest);

        // Hand-written snapshots may omit identities.
        for document in snapshot.collections.values_mut().flatten() {
            if !document.contains_key(ID_FIELD) {
                snapshot.next_id += 1;
                document.insert(ID_FIELD.to_string(), Value::String(format_id(snapshot.next_id)));
            }
        }

        info!(
            "Loaded snapshot {} ({} collections)",
            path.display(),
            snapshot.collections.len()
        );
        Ok(Self {
            inner: Mutex::new(snapshot),
        })
    }

    /// Write the whole store to `path` as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let raw = {
            let snapshot = self.lock()?;
            serde_json::to_string_pretty(&*snapshot)?
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SnapshotError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        tokio::fs::write(path, raw)
            .await
            .map_err(|source| SnapshotError::Io {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Saved snapshot {}", path.display());
        Ok(())
    }

    /// Insert unconditionally, returning the generated identity.
    pub fn insert(&self, collection: &str, mut document: Document) -> Result<String, StoreError> {
        let mut snapshot = self.lock()?;
        snapshot.next_id += 1;
        let id = format_id(snapshot.next_id);
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        snapshot
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self
            .lock()?
            .collections
            .get(collection)
            .map_or(0, Vec::len))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

fn format_id(n: u64) -> String {
    format!("{:024x}", n)
}

/// Counter behind a generated 24-hex identity, if `id` is one.
fn parse_id(id: &str) -> Option<u64> {
    if id.len() != 24 {
        return None;
    }
    u64::from_str_radix(id, 16).ok()
}

fn id_of(document: &Document) -> String {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError> {
        let snapshot = self.lock()?;
        Ok(snapshot
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches_filter(doc, filter)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Vec<Document>, StoreError> {
        let snapshot = self.lock()?;
        Ok(snapshot
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        key: &Document,
        mut document: Document,
        parent: Option<&str>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut snapshot = self.lock()?;
        if let Some(existing) = snapshot
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches_filter(doc, key)))
        {
            return Ok(InsertOutcome::Existing(id_of(existing)));
        }

        snapshot.next_id += 1;
        let id = format_id(snapshot.next_id);
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        if let Some(parent) = parent {
            document.insert(PARENT_FIELD.to_string(), Value::String(parent.to_string()));
        }
        snapshot
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn update(&self, collection: &str, id: &str, delta: Document) -> Result<(), StoreError> {
        let mut snapshot = self.lock()?;
        let document = snapshot
            .collections
            .get_mut(collection)
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (field, value) in delta {
            if field != ID_FIELD {
                document.insert(field, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut snapshot = self.lock()?;
        let Some(docs) = snapshot.collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| doc.get(ID_FIELD).and_then(Value::as_str) != Some(id));
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_returns_existing() {
        let store = InMemoryDocumentStore::new();
        let key = doc(json!({"wave": "W1", "name": "nmap", "level": "host", "host": "10.0.0.1"}));
        let mut full = key.clone();
        full.insert("status".to_string(), json!([]));

        let first = store
            .insert_if_absent("tools", &key, full.clone(), Some("host-1"))
            .await
            .unwrap();
        let second = store
            .insert_if_absent("tools", &key, full, Some("host-1"))
            .await
            .unwrap();

        assert!(first.is_inserted());
        assert_eq!(second, InsertOutcome::Existing(first.id().to_string()));
        assert_eq!(store.count("tools").unwrap(), 1);

        let stored = store.find_by_id("tools", first.id()).await.unwrap().unwrap();
        assert_eq!(stored["parent"], json!("host-1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_if_absent_inserts_once() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let key = doc(json!({"wave": "W1", "name": "nmap", "level": "wave"}));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .insert_if_absent("tools", &key, key.clone(), None)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<InsertOutcome> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_inserted()).count(), 1);
        let id = outcomes[0].id();
        assert!(outcomes.iter().all(|o| o.id() == id));
        assert_eq!(store.count("tools").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_sets_only_delta_fields() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .insert("tools", doc(json!({"name": "nmap", "tags": ["a"], "status": []})))
            .unwrap();

        store
            .update("tools", &id, doc(json!({"status": ["running"]})))
            .await
            .unwrap();

        let stored = store.find_by_id("tools", &id).await.unwrap().unwrap();
        assert_eq!(stored["status"], json!(["running"]));
        assert_eq!(stored["tags"], json!(["a"]));
        assert_eq!(stored["name"], json!("nmap"));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("tools", "nope", Document::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryDocumentStore::new();
        let id = store.insert("tools", doc(json!({"name": "nmap"}))).unwrap();
        assert!(store.delete("tools", &id).await.unwrap());
        assert!(!store.delete("tools", &id).await.unwrap());
        assert!(!store.delete("other", &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_many() {
        let store = InMemoryDocumentStore::new();
        store.insert("tools", doc(json!({"wave": "W1", "name": "a"}))).unwrap();
        store.insert("tools", doc(json!({"wave": "W1", "name": "b"}))).unwrap();
        store.insert("tools", doc(json!({"wave": "W2", "name": "c"}))).unwrap();

        let found = store
            .find_many("tools", &doc(json!({"wave": "W1"})))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find_many("missing", &Document::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = InMemoryDocumentStore::new();
        let id = store.insert("waves", doc(json!({"wave": "W1"}))).unwrap();
        store.save(&path).await.unwrap();

        let loaded = InMemoryDocumentStore::load(&path).await.unwrap();
        let wave = loaded.find_by_id("waves", &id).await.unwrap().unwrap();
        assert_eq!(wave["wave"], json!("W1"));

        let next = loaded.insert("waves", doc(json!({"wave": "W2"}))).unwrap();
        assert_ne!(next, id);
    }

    #[tokio::test]
    async fn test_load_assigns_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"collections": {"hosts": [{"host": "10.0.0.1"}]}}"#,
        )
        .unwrap();

        let store = InMemoryDocumentStore::load(&path).await.unwrap();
        let host = store
            .find_one("hosts", &doc(json!({"host": "10.0.0.1"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(host[ID_FIELD], json!("000000000000000000000001"));
    }

    #[tokio::test]
    async fn test_load_never_reissues_existing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"collections": {"hosts": [
                {"_id": "000000000000000000000001", "host": "a"},
                {"host": "b"}
            ]}}"#,
        )
        .unwrap();

        let store = InMemoryDocumentStore::load(&path).await.unwrap();
        let hosts = store.find_many("hosts", &Document::new()).await.unwrap();
        let ids: Vec<String> = hosts.iter().map(id_of).collect();
        assert_eq!(ids, vec!["000000000000000000000001", "000000000000000000000002"]);

        let next = store.insert("hosts", doc(json!({"host": "c"}))).unwrap();
        assert_eq!(next, "000000000000000000000003");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryDocumentStore::load(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(store.count("tools").unwrap(), 0);
    }
}
