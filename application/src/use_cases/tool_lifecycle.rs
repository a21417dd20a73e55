//! Tool Lifecycle use case.
//!
//! Applies status transitions and field edits to a tool run, then persists
//! only the changed fields. Field-level updates keep concurrent edits of
//! different fields (a tag edit and a status transition, say) from
//! overwriting each other. Concurrent edits of the same field are
//! last-write-wins.

use crate::ports::clock::{Clock, SystemClock};
use crate::ports::document_store::{DocumentStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use waverun_domain::{DomainError, StatusSet, TOOLS_COLLECTION, ToolDelta, ToolRun};

/// Errors that can occur during a lifecycle transition.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Tool '{0}' has not been persisted yet")]
    NotPersisted(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub struct ToolLifecycleUseCase {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl Clone for ToolLifecycleUseCase {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl ToolLifecycleUseCase {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create with a custom clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn mark_running(
        &self,
        tool: &mut ToolRun,
        runner_id: &str,
    ) -> Result<ToolDelta, LifecycleError> {
        let now = self.clock.now();
        self.apply(tool, |tool| tool.mark_running(runner_id, now))
            .await
    }

    pub async fn mark_done(
        &self,
        tool: &mut ToolRun,
        result_file: &str,
    ) -> Result<ToolDelta, LifecycleError> {
        let now = self.clock.now();
        self.apply(tool, |tool| tool.mark_done(result_file, now))
            .await
    }

    pub async fn mark_not_done(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::mark_not_done).await
    }

    pub async fn mark_error(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::mark_error).await
    }

    pub async fn set_out_of_time(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::set_out_of_time).await
    }

    pub async fn set_in_time(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::set_in_time).await
    }

    pub async fn set_out_of_scope(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::set_out_of_scope).await
    }

    pub async fn set_in_scope(&self, tool: &mut ToolRun) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, ToolRun::set_in_scope).await
    }

    /// Replace the status with raw flags; unknown or conflicting flags are rejected.
    pub async fn set_status<S: AsRef<str>>(
        &self,
        tool: &mut ToolRun,
        flags: &[S],
    ) -> Result<ToolDelta, LifecycleError> {
        let status = StatusSet::parse(flags)?;
        self.apply(tool, |tool| tool.set_status(status)).await
    }

    pub async fn set_notes(
        &self,
        tool: &mut ToolRun,
        notes: &str,
    ) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, |tool| tool.set_notes(notes)).await
    }

    pub async fn add_tag(&self, tool: &mut ToolRun, tag: &str) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, |tool| tool.add_tag(tag)).await
    }

    pub async fn set_info(
        &self,
        tool: &mut ToolRun,
        key: &str,
        value: serde_json::Value,
    ) -> Result<ToolDelta, LifecycleError> {
        self.apply(tool, |tool| tool.set_info(key, value)).await
    }

    async fn apply<F>(&self, tool: &mut ToolRun, mutate: F) -> Result<ToolDelta, LifecycleError>
    where
        F: FnOnce(&mut ToolRun) -> ToolDelta,
    {
        let id = tool
            .id()
            .map(str::to_string)
            .ok_or_else(|| LifecycleError::NotPersisted(tool.summary()))?;

        // `tool` only takes the new state once the store has accepted it.
        let mut next = tool.clone();
        let delta = mutate(&mut next);
        if delta.is_empty() {
            debug!("No change to persist for {}", tool.detailed_summary());
            return Ok(delta);
        }

        self.store
            .update(TOOLS_COLLECTION, &id, delta.to_document())
            .await?;
        *tool = next;
        info!(
            "Tool {} now {} (updated {})",
            tool.detailed_summary(),
            tool.status(),
            delta.fields().join(", ")
        );
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::FixedClock;
    use crate::ports::document_store::DocumentStore;
    use crate::use_cases::testing::FakeStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use waverun_domain::{HierarchyAddress, RunState, StatusFlag};

    async fn persisted_tool(store: &FakeStore) -> ToolRun {
        let mut tool = ToolRun::new("nikto", HierarchyAddress::port("W1", "10.0.0.1", "80", "tcp"));
        let doc = match serde_json::to_value(tool.to_document(None)).unwrap() {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let outcome = store
            .insert_if_absent(TOOLS_COLLECTION, &tool.key().to_filter(), doc, None)
            .await
            .unwrap();
        tool.assign_id(outcome.id());
        tool
    }

    fn use_case(store: Arc<FakeStore>) -> ToolLifecycleUseCase {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        ToolLifecycleUseCase::new(store).with_clock(Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_mark_running_persists_only_changed_fields() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        let use_case = use_case(store.clone());

        use_case.mark_running(&mut tool, "worker-1").await.unwrap();

        let updates = store.recorded_updates();
        assert_eq!(updates.len(), 1);
        let (id, delta) = &updates[0];
        assert_eq!(Some(id.as_str()), tool.id());
        let mut fields: Vec<&str> = delta.keys().map(String::as_str).collect();
        fields.sort();
        assert_eq!(fields, vec!["finished_at", "runner_id", "started_at", "status"]);
        assert_eq!(delta["started_at"], json!("2024-03-01T10:00:00+00:00"));
        assert_eq!(delta["runner_id"], json!("worker-1"));
    }

    #[tokio::test]
    async fn test_overlays_survive_full_cycle() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        let use_case = use_case(store.clone());

        use_case.set_out_of_time(&mut tool).await.unwrap();
        use_case.set_out_of_scope(&mut tool).await.unwrap();
        use_case.mark_running(&mut tool, "worker-1").await.unwrap();
        use_case.mark_done(&mut tool, "out/nikto.txt").await.unwrap();
        assert_eq!(
            tool.status().flags(),
            vec![StatusFlag::Done, StatusFlag::OutOfScope, StatusFlag::OutOfTime]
        );

        use_case.mark_not_done(&mut tool).await.unwrap();
        assert_eq!(tool.status().state(), RunState::Idle);
        assert!(tool.status().is_out_of_time());
        assert!(tool.status().is_out_of_scope());

        let stored = store.documents(TOOLS_COLLECTION).remove(0);
        assert_eq!(stored["status"], json!(["OOS", "OOT"]));
        assert_eq!(stored["result_file"], json!("out/nikto.txt"));
        assert_eq!(stored["runner_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_idempotent_overlay_skips_store() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        let use_case = use_case(store.clone());

        use_case.set_out_of_time(&mut tool).await.unwrap();
        let delta = use_case.set_out_of_time(&mut tool).await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(store.recorded_updates().len(), 1);

        use_case.set_in_scope(&mut tool).await.unwrap();
        assert_eq!(store.recorded_updates().len(), 1);
    }

    #[tokio::test]
    async fn test_set_status_rejects_unknown_flag() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        let use_case = use_case(store.clone());

        let err = use_case
            .set_status(&mut tool, &["done", "queued"])
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidStatus(_)));
        assert!(store.recorded_updates().is_empty());

        use_case.set_status(&mut tool, &["error", "OOT"]).await.unwrap();
        assert_eq!(tool.status().state(), RunState::Error);
    }

    #[tokio::test]
    async fn test_tag_edit_does_not_touch_status() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        let use_case = use_case(store.clone());

        use_case.add_tag(&mut tool, "interesting").await.unwrap();
        let (_, delta) = store.recorded_updates().remove(0);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["tags"], json!(["interesting"]));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_tool_unchanged() {
        let store = Arc::new(FakeStore::default());
        let mut tool = persisted_tool(&store).await;
        store.delete(TOOLS_COLLECTION, tool.id().unwrap()).await.unwrap();
        let use_case = use_case(store.clone());

        let err = use_case.mark_running(&mut tool, "worker-1").await.unwrap_err();
        assert!(matches!(err, LifecycleError::Store(StoreError::NotFound { .. })));
        assert_eq!(tool.status().state(), RunState::Idle);
        assert!(tool.started_at().is_none());
        assert!(tool.runner_id().is_none());

        let err = use_case.add_tag(&mut tool, "web").await.unwrap_err();
        assert!(matches!(err, LifecycleError::Store(_)));
        assert!(tool.tags().is_empty());
    }

    #[tokio::test]
    async fn test_unpersisted_tool_is_rejected() {
        let store = Arc::new(FakeStore::default());
        let use_case = use_case(store.clone());
        let mut tool = ToolRun::new("whois", HierarchyAddress::wave("W1"));

        let err = use_case.mark_error(&mut tool).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotPersisted(_)));
        assert_eq!(tool.status().state(), RunState::Idle);
    }
}
