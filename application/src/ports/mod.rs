//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod clock;
pub mod document_store;
pub mod hierarchy_store;
pub mod template_catalog;
