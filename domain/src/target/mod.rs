//! Target hierarchy
//!
//! A tool run is bound to exactly one tier of the assessment hierarchy:
//!
//! ```text
//! wave ──> scope (domain / network) ──> host ──> port
//! ```
//!
//! - [`HierarchyAddress`] — the coordinate of a tool run inside the hierarchy
//! - [`Level`] — which tier the address points at
//! - [`TargetRecord`] / [`PortRecord`] — hierarchy objects as returned by lookups

pub mod address;
pub mod records;

pub use address::{DEFAULT_PROTOCOL, HierarchyAddress, Level};
pub use records::{Infos, PortRecord, TargetRecord, info_value_to_string};
