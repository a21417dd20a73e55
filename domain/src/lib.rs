//! Domain layer for waverun
//!
//! This crate contains the core tool-run model: hierarchy addresses, the
//! status state machine, uniqueness keys, output paths and command template
//! resolution. It has no dependencies on storage or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Target hierarchy
//!
//! An assessment is organized in waves. A wave owns scopes (domains or
//! networks), which contain hosts, which expose ports. A tool run is bound
//! to exactly one of these tiers, its [`Level`].
//!
//! ## Tool run lifecycle
//!
//! - **Idle → Running → Done**, with **Error** and reset back to **Idle**
//! - **OOT / OOS** overlays survive every primary transition

pub mod core;
pub mod target;
pub mod tool;

// Re-export commonly used types
pub use core::error::DomainError;
pub use target::{HierarchyAddress, Infos, Level, PortRecord, TargetRecord};
pub use tool::{
    CommandTemplate, FieldChange, RunState, StatusFlag, StatusSet, TOOLS_COLLECTION, TargetMetadata,
    ToolDelta, ToolDocument, ToolKey, ToolRun, derive_output_path,
};
