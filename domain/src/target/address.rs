//! Hierarchy address value object.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol assumed when a port address is built without one.
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Hierarchy tier a tool run is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Wave,
    Domain,
    Network,
    #[serde(alias = "ip")]
    Host,
    Port,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Wave => "wave",
            Level::Domain => "domain",
            Level::Network => "network",
            Level::Host => "host",
            Level::Port => "port",
        }
    }

    /// Older spelling still found in stored records.
    pub fn legacy_name(&self) -> Option<&'static str> {
        match self {
            Level::Host => Some("ip"),
            _ => None,
        }
    }

    /// Domain and network levels both target a scope.
    pub fn is_scope(&self) -> bool {
        matches!(self, Level::Domain | Level::Network)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wave" => Ok(Level::Wave),
            "domain" => Ok(Level::Domain),
            "network" => Ok(Level::Network),
            "host" | "ip" => Ok(Level::Host),
            "port" => Ok(Level::Port),
            _ => Err(DomainError::InvalidLevel(s.to_string())),
        }
    }
}

/// Position of a tool run in the target hierarchy.
///
/// Only the fields meaningful for [`Level`] are kept; the others are
/// normalized to empty strings at construction. `wave` is always kept
/// since every target belongs to a wave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyAddress {
    level: Level,
    wave: String,
    scope: String,
    host: String,
    port: String,
    protocol: String,
}

impl HierarchyAddress {
    /// Build an address from raw field values, clearing what the level does not use.
    pub fn new(
        level: Level,
        wave: impl Into<String>,
        scope: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        let mut address = Self {
            level,
            wave: wave.into(),
            scope: String::new(),
            host: String::new(),
            port: String::new(),
            protocol: String::new(),
        };
        match level {
            Level::Wave => {}
            Level::Domain | Level::Network => address.scope = scope.into(),
            Level::Host => address.host = host.into(),
            Level::Port => {
                address.host = host.into();
                address.port = port.into();
                let protocol = protocol.into();
                address.protocol = if protocol.is_empty() {
                    DEFAULT_PROTOCOL.to_string()
                } else {
                    protocol
                };
            }
        }
        address
    }

    pub fn wave(wave: impl Into<String>) -> Self {
        Self::new(Level::Wave, wave, "", "", "", "")
    }

    pub fn domain(wave: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::new(Level::Domain, wave, scope, "", "", "")
    }

    pub fn network(wave: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::new(Level::Network, wave, scope, "", "", "")
    }

    pub fn host(wave: impl Into<String>, host: impl Into<String>) -> Self {
        Self::new(Level::Host, wave, "", host, "", "")
    }

    pub fn port(
        wave: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self::new(Level::Port, wave, "", host, port, protocol)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn wave_name(&self) -> &str {
        &self.wave
    }

    pub fn scope_name(&self) -> &str {
        &self.scope
    }

    pub fn host_name(&self) -> &str {
        &self.host
    }

    pub fn port_number(&self) -> &str {
        &self.port
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }
}

impl fmt::Display for HierarchyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Wave => write!(f, "{}", self.wave),
            Level::Domain | Level::Network => write!(f, "{}/{}", self.wave, self.scope),
            Level::Host => write!(f, "{}/{}", self.wave, self.host),
            Level::Port => write!(
                f,
                "{}/{}:{}/{}",
                self.wave, self.host, self.protocol, self.port
            ),
        }
    }
}
