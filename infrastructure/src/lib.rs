//! Infrastructure layer for waverun
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat,
    FileStoreConfig,
};
pub use store::{
    DocumentHierarchyStore, DocumentTemplateCatalog, InMemoryDocumentStore, SnapshotError,
};
