//! Application layer for waverun
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    clock::{Clock, FixedClock, SystemClock},
    document_store::{Document, DocumentStore, InsertOutcome, StoreError},
    hierarchy_store::HierarchyStore,
    template_catalog::TemplateCatalog,
};
pub use use_cases::locate_parent::ParentLocator;
pub use use_cases::prepare_command::{PrepareCommandError, PrepareCommandUseCase, PreparedCommand};
pub use use_cases::register_tool::{Registration, RegisterToolError, RegisterToolUseCase};
pub use use_cases::tool_lifecycle::{LifecycleError, ToolLifecycleUseCase};
