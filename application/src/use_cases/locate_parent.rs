//! Parent identity lookup.
//!
//! Resolves the hierarchy object a tool run hangs under: the wave, the scope,
//! the host or the port, depending on the tool's level.

use crate::ports::hierarchy_store::HierarchyStore;
use std::sync::Arc;
use tracing::{debug, warn};
use waverun_domain::{HierarchyAddress, Level};

pub struct ParentLocator {
    hierarchy: Arc<dyn HierarchyStore>,
}

impl Clone for ParentLocator {
    fn clone(&self) -> Self {
        Self {
            hierarchy: self.hierarchy.clone(),
        }
    }
}

impl ParentLocator {
    pub fn new(hierarchy: Arc<dyn HierarchyStore>) -> Self {
        Self { hierarchy }
    }

    /// Identity of the containing object, or `None` when it does not exist (yet).
    ///
    /// Backend failures are logged and reported as `None` too.
    pub async fn parent_id(&self, address: &HierarchyAddress) -> Option<String> {
        let found = match address.level() {
            Level::Wave => self
                .hierarchy
                .find_wave(address.wave_name())
                .await
                .map(|r| r.map(|r| r.id)),
            Level::Domain | Level::Network => self
                .hierarchy
                .find_scope(address.wave_name(), address.scope_name())
                .await
                .map(|r| r.map(|r| r.id)),
            Level::Host => self
                .hierarchy
                .find_host(address.host_name())
                .await
                .map(|r| r.map(|r| r.id)),
            Level::Port => self
                .hierarchy
                .find_port(
                    address.host_name(),
                    address.port_number(),
                    address.protocol(),
                )
                .await
                .map(|r| r.map(|r| r.id)),
        };

        match found {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                debug!("No parent found for {} ({})", address, address.level());
                None
            }
            Err(e) => {
                warn!("Parent lookup failed for {}: {}", address, e);
                None
            }
        }
    }
}
