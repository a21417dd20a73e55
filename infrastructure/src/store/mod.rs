//! Document store adapters.
//!
//! - [`InMemoryDocumentStore`] — mutex-guarded collections with JSON snapshots
//! - [`DocumentHierarchyStore`] — hierarchy lookups over any [`DocumentStore`]
//! - [`DocumentTemplateCatalog`] — command templates over any [`DocumentStore`]
//!
//! [`DocumentStore`]: waverun_application::DocumentStore

mod catalog;
mod hierarchy;
mod memory;

pub use catalog::{COMMANDS_COLLECTION, DocumentTemplateCatalog};
pub use hierarchy::{
    DocumentHierarchyStore, HOSTS_COLLECTION, PORTS_COLLECTION, SCOPES_COLLECTION,
    WAVES_COLLECTION,
};
pub use memory::{InMemoryDocumentStore, SnapshotError};
