//! Command template resolution.
//!
//! Templates are shell command strings with `|placeholder|` tokens that are
//! filled from the tool run's hierarchy address and from host / port metadata:
//!
//! | Level | Placeholders |
//! |-------|--------------|
//! | any | `|outputDir|`, `|wave|` |
//! | domain / network | `|scope|`, `|parent_domain|` |
//! | host | `|ip|`, `|ip.infos.<key>|` |
//! | port | `|ip|`, `|port|`, `|port.proto|`, `|port.service|`, `|port.product|`, `|port.infos.<key>|` |
//!
//! Placeholders with no value are left verbatim; [`residual_placeholders`]
//! reports them so callers can warn.

use crate::target::{HierarchyAddress, Infos, Level, PortRecord, TargetRecord, info_value_to_string};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|[A-Za-z_][A-Za-z0-9_.\-]*\|").expect("placeholder pattern is valid")
});

/// A command template: raw text plus the level its placeholders are written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub text: String,
    pub level: Level,
}

impl CommandTemplate {
    pub fn new(text: impl Into<String>, level: Level) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// Metadata looked up for the resolution of a single template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetMetadata<'a> {
    pub host: Option<&'a TargetRecord>,
    pub port: Option<&'a PortRecord>,
}

/// Fill every placeholder a template can use for `address`.
pub fn resolve_command(
    template: &CommandTemplate,
    address: &HierarchyAddress,
    output_dir: &str,
    metadata: TargetMetadata<'_>,
) -> String {
    let mut command = template
        .text
        .replace("|outputDir|", output_dir)
        .replace("|wave|", address.wave_name());

    match template.level {
        Level::Wave => {}
        Level::Domain | Level::Network => {
            command = command.replace("|scope|", address.scope_name());
            if let Some(parent) = parent_domain(address.scope_name()) {
                command = command.replace("|parent_domain|", &parent);
            }
        }
        Level::Host => {
            command = command.replace("|ip|", address.host_name());
            if let Some(host) = metadata.host {
                command = substitute_infos(&command, "ip", &host.infos);
            }
        }
        Level::Port => {
            command = command
                .replace("|ip|", address.host_name())
                .replace("|port|", address.port_number())
                .replace("|port.proto|", address.protocol());
            if let Some(port) = metadata.port {
                command = command
                    .replace("|port.service|", &port.service)
                    .replace("|port.product|", &port.product);
                command = substitute_infos(&command, "port", &port.infos);
            }
        }
    }
    command
}

/// Replace `|<prefix>.infos.<key>|` with the value of every key in `infos`.
pub fn substitute_infos(command: &str, prefix: &str, infos: &Infos) -> String {
    infos.iter().fold(command.to_string(), |acc, (key, value)| {
        acc.replace(
            &format!("|{}.infos.{}|", prefix, key),
            &info_value_to_string(value),
        )
    })
}

/// Placeholder tokens still present in a resolved command, in order of appearance.
pub fn residual_placeholders(command: &str) -> Vec<String> {
    PLACEHOLDER
        .find_iter(command)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parent domain of a scope, or `None` for network scopes.
///
/// `sub.example.com` → `example.com`; scopes with two labels or fewer are
/// returned unchanged. Empty scopes and IP / CIDR literals yield `None`.
pub fn parent_domain(scope: &str) -> Option<String> {
    if scope.is_empty() || is_network_address(scope) {
        return None;
    }
    let labels: Vec<&str> = scope.split('.').collect();
    if labels.len() > 2 {
        Some(labels[1..].join("."))
    } else {
        Some(scope.to_string())
    }
}

/// IPv4 / IPv6 literal with an optional `/prefix`.
pub fn is_network_address(scope: &str) -> bool {
    let (addr, prefix) = match scope.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (scope, None),
    };
    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };
    match prefix {
        None => true,
        Some(prefix) => {
            let max = if ip.is_ipv4() { 32 } else { 128 };
            prefix.parse::<u8>().is_ok_and(|bits| bits <= max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_domain() {
        assert_eq!(parent_domain("sub.example.com").as_deref(), Some("example.com"));
        assert_eq!(parent_domain("a.b.example.com").as_deref(), Some("b.example.com"));
        assert_eq!(parent_domain("example.com").as_deref(), Some("example.com"));
        assert_eq!(parent_domain("localhost").as_deref(), Some("localhost"));
        assert_eq!(parent_domain(""), None);
        assert_eq!(parent_domain("10.0.0.0/24"), None);
        assert_eq!(parent_domain("192.168.1.1"), None);
    }

    #[test]
    fn test_is_network_address() {
        assert!(is_network_address("10.0.0.0/8"));
        assert!(is_network_address("10.0.0.1"));
        assert!(is_network_address("2001:db8::/32"));
        assert!(!is_network_address("10.0.0.0/33"));
        assert!(!is_network_address("example.com"));
        assert!(!is_network_address("10.0.0"));
    }

    #[test]
    fn test_domain_level_parent_domain() {
        let template = CommandTemplate::new("|parent_domain|", Level::Domain);
        let addr = HierarchyAddress::domain("W1", "sub.example.com");
        assert_eq!(
            resolve_command(&template, &addr, "out/", TargetMetadata::default()),
            "example.com"
        );
    }

    #[test]
    fn test_network_scope_keeps_parent_domain_placeholder() {
        let template = CommandTemplate::new("nmap |scope| |parent_domain|", Level::Network);
        let addr = HierarchyAddress::network("W1", "10.0.0.0/24");
        assert_eq!(
            resolve_command(&template, &addr, "out/", TargetMetadata::default()),
            "nmap 10.0.0.0/24 |parent_domain|"
        );
    }

    #[test]
    fn test_always_substitutes_output_dir_and_wave() {
        let template = CommandTemplate::new("echo |wave| > |outputDir|wave.txt", Level::Wave);
        let addr = HierarchyAddress::wave("W1");
        assert_eq!(
            resolve_command(&template, &addr, "proj/echo/W1/", TargetMetadata::default()),
            "echo W1 > proj/echo/W1/wave.txt"
        );
    }

    #[test]
    fn test_host_level_infos() {
        let template = CommandTemplate::new("ssh |ip.infos.user|@|ip| # |ip.infos.os|", Level::Host);
        let addr = HierarchyAddress::host("W1", "10.0.0.1");
        let host = TargetRecord::new("h1").with_info("user", "root");
        let metadata = TargetMetadata {
            host: Some(&host),
            port: None,
        };
        assert_eq!(
            resolve_command(&template, &addr, "out/", metadata),
            "ssh root@10.0.0.1 # |ip.infos.os|"
        );
    }

    #[test]
    fn test_port_level_service_and_residuals() {
        let template = CommandTemplate::new(
            "curl |port.proto|://|ip|:|port| -A |port.product| |port.service| |port.infos.path| |port.infos.vhost|",
            Level::Port,
        );
        let addr = HierarchyAddress::port("W1", "10.0.0.1", "80", "tcp");
        let port = PortRecord::new("p1", "http", "nginx").with_info("path", "/admin");
        let metadata = TargetMetadata {
            host: None,
            port: Some(&port),
        };
        let command = resolve_command(&template, &addr, "out/", metadata);
        assert_eq!(
            command,
            "curl tcp://10.0.0.1:80 -A nginx http /admin |port.infos.vhost|"
        );
        assert_eq!(residual_placeholders(&command), vec!["|port.infos.vhost|"]);
    }

    #[test]
    fn test_port_level_without_record_leaves_metadata_placeholders() {
        let template = CommandTemplate::new("|ip| |port.service|", Level::Port);
        let addr = HierarchyAddress::port("W1", "10.0.0.1", "8080", "tcp");
        let command = resolve_command(&template, &addr, "out/", TargetMetadata::default());
        assert_eq!(command, "10.0.0.1 |port.service|");
    }

    #[test]
    fn test_substitute_infos_non_string_values() {
        let mut infos = Infos::new();
        infos.insert("rate".to_string(), serde_json::json!(500));
        assert_eq!(
            substitute_infos("masscan --rate |port.infos.rate|", "port", &infos),
            "masscan --rate 500"
        );
    }

    #[test]
    fn test_residual_placeholders_ignores_shell_pipes() {
        assert!(residual_placeholders("cat a | grep b | wc -l").is_empty());
        assert_eq!(residual_placeholders("x |wave| y"), vec!["|wave|"]);
    }
}
