//! Hierarchy store port
//!
//! Lookups for the objects a tool run can be bound to. A miss is `Ok(None)`:
//! the referenced object may simply not have been created yet.

use super::document_store::StoreError;
use async_trait::async_trait;
use waverun_domain::{PortRecord, TargetRecord};

/// Port for wave / scope / host / port lookups.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    async fn find_wave(&self, wave: &str) -> Result<Option<TargetRecord>, StoreError>;

    async fn find_scope(&self, wave: &str, scope: &str)
    -> Result<Option<TargetRecord>, StoreError>;

    async fn find_host(&self, host: &str) -> Result<Option<TargetRecord>, StoreError>;

    async fn find_port(
        &self,
        host: &str,
        port: &str,
        protocol: &str,
    ) -> Result<Option<PortRecord>, StoreError>;
}
