//! Notification records produced from snmptrapd traphandle input
//!
//! One `Notification` is built per invocation: a hostname line, an address
//! line and any number of variable bindings, in the order snmptrapd wrote them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single variable binding (`<oid> <value>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Varbind {
    pub oid: String,
    pub value: String,
    /// Value type hint. Not populated by the line format, kept for callers
    /// that construct bindings from richer sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Varbind {
    pub fn new(oid: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            value: value.into(),
            kind: None,
        }
    }
}

/// Transport endpoints of the trap, decoded from the second input line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub protocol: String,
    pub source_host: String,
    pub source_port: String,
    pub target_host: String,
    pub target_port: String,
}

impl fmt::Display for AddressInfo {
    /// Renders the address in the same layout snmptrapd uses for `%b`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]:{}->[{}]:{}",
            self.protocol, self.source_host, self.source_port, self.target_host, self.target_port
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub hostname: String,
    pub address: AddressInfo,
    pub bindings: Vec<Varbind>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HOSTNAME: {}", self.hostname)?;
        writeln!(f, "IPADDRESS: {}:{}", self.address.source_host, self.address.source_port)?;
        for varbind in &self.bindings {
            writeln!(f, "VARBIND: {}: {}", varbind.oid, varbind.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_matches_snmptrapd_layout() {
        let address = AddressInfo {
            protocol: "UDP".to_string(),
            source_host: "10.0.0.5".to_string(),
            source_port: "161".to_string(),
            target_host: "10.0.0.1".to_string(),
            target_port: "162".to_string(),
        };
        assert_eq!(address.to_string(), "UDP [10.0.0.5]:161->[10.0.0.1]:162");
    }

    #[test]
    fn test_notification_display() {
        let notification = Notification {
            hostname: "router1".to_string(),
            address: AddressInfo {
                source_host: "10.0.0.5".to_string(),
                source_port: "161".to_string(),
                ..Default::default()
            },
            bindings: vec![Varbind::new("1.3.6.1.2.1.1.3.0", "12345")],
        };
        assert_eq!(
            notification.to_string(),
            "HOSTNAME: router1\nIPADDRESS: 10.0.0.5:161\nVARBIND: 1.3.6.1.2.1.1.3.0: 12345\n"
        );
    }
}
