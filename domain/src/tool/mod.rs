//! Tool run domain module
//!
//! A tool run is a command template instantiated against one object of the
//! target hierarchy. This module owns the pure parts of its life:
//!
//! - [`ToolRun`] — the entity and its lifecycle transitions
//! - [`StatusSet`] — primary run state plus OOT / OOS overlays
//! - [`ToolKey`] / [`derive_output_path`] — storage uniqueness and output layout
//! - [`resolve_command`] — placeholder substitution for command templates
//! - [`ToolDelta`] — the partial update a mutation asks to persist
//!
//! Persistence, catalog lookups and hierarchy lookups live behind ports in the
//! application layer.

pub mod delta;
pub mod document;
pub mod entity;
pub mod key;
pub mod status;
pub mod template;

pub use delta::{FieldChange, ToolDelta};
pub use document::{TOOLS_COLLECTION, ToolDocument};
pub use entity::ToolRun;
pub use key::{ToolKey, derive_output_path, sanitize_segment};
pub use status::{RunState, StatusFlag, StatusSet};
pub use template::{
    CommandTemplate, TargetMetadata, parent_domain, residual_placeholders, resolve_command,
    substitute_infos,
};
