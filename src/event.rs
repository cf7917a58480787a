//! Sensu Go event construction
//!
//! Maps a validated notification onto a check event for the agent events API.
//! Field names follow the Sensu Go event schema (`check.metadata.name`,
//! `entity.metadata.name`, ...).

use crate::config::Config;
use crate::notification::Notification;
use crate::oid::{SNMP_TRAP_OID, SYS_UPTIME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Traps are one-shot results; Sensu still requires a positive interval.
pub const CHECK_INTERVAL: u32 = 1;

/// Notifications carrying this hostname are reported against the agent's own
/// entity instead of a proxy entity.
pub const LOCAL_HOSTNAME: &str = "localhost";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to serialise {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub metadata: ObjectMeta,
    pub interval: u32,
    pub status: u32,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub check: Check,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<Entity>,
}

impl Event {
    pub fn check_name(&self) -> &str {
        &self.check.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.check.metadata.namespace
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.check.metadata.labels
    }

    pub fn output(&self) -> &str {
        &self.check.output
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity.as_ref().map(|entity| entity.metadata.name.as_str())
    }

    /// Compact JSON body for the events API
    pub fn to_json(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(|source| EventError::Serialization {
            what: "event",
            source,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, EventError> {
        serde_json::to_string_pretty(self).map_err(|source| EventError::Serialization {
            what: "event",
            source,
        })
    }
}

/// Replace every `.` and `:` with `-`, which is what Sensu accepts in check
/// names and label keys.
pub fn dashed(oid: &str) -> String {
    oid.replace(['.', ':'], "-")
}

pub fn label_key(prefix: &str, oid: &str) -> String {
    format!("{}_{}", prefix, dashed(oid))
}

/// Build the check event for a validated notification.
///
/// Labels and output both hold one entry per distinct OID. Two OIDs that
/// differ only in `.` versus `:` produce the same label key; the later varbind
/// wins.
pub fn build_event(notification: &Notification, config: &Config) -> Result<Event, EventError> {
    let namespace = &config.sensu.check.namespace;
    let prefix = &config.sensu.check.label_prefix;
    let trap = &config.snmptrapd.defaults.trap;

    match SYS_UPTIME.resolve(&notification.bindings) {
        Some(varbind) => debug!("Found required sysUpTime OID: {} = {}", varbind.oid, varbind.value),
        None => warn!("No matching VARBIND for required OIDs {}", SYS_UPTIME),
    }

    let check_name = match SNMP_TRAP_OID.resolve(&notification.bindings) {
        Some(varbind) if !dashed(&varbind.value).trim().is_empty() => {
            info!("Found required SNMP Trap OID: {}", varbind.oid);
            dashed(&varbind.value)
        }
        Some(varbind) => {
            error!("SNMP Trap OID {} has an empty value, using default check name {}", varbind.oid, trap.name);
            trap.name.clone()
        }
        None => {
            error!("No matching VARBIND for required OIDs {}", SNMP_TRAP_OID);
            trap.name.clone()
        }
    };

    let mut output = BTreeMap::new();
    let mut labels = BTreeMap::new();
    for varbind in &notification.bindings {
        output.insert(varbind.oid.as_str(), varbind.value.as_str());
        let key = label_key(prefix, &varbind.oid);
        if labels.insert(key.clone(), varbind.value.clone()).is_some() {
            warn!("Label {} set by more than one varbind, keeping {}", key, varbind.oid);
        }
    }

    let output = serde_json::to_string_pretty(&output).map_err(|source| EventError::Serialization {
        what: "check output",
        source,
    })?;

    let entity = if notification.hostname != LOCAL_HOSTNAME {
        Some(Entity {
            metadata: ObjectMeta {
                name: notification.hostname.clone(),
                namespace: namespace.clone(),
                labels: BTreeMap::new(),
            },
        })
    } else {
        debug!("Notification from {}, attaching no entity", LOCAL_HOSTNAME);
        None
    };

    Ok(Event {
        check: Check {
            metadata: ObjectMeta {
                name: check_name,
                namespace: namespace.clone(),
                labels,
            },
            interval: CHECK_INTERVAL,
            status: trap.status,
            output,
        },
        entity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{AddressInfo, Varbind};
    use serde_json::{json, Value};

    fn notification(hostname: &str, bindings: &[(&str, &str)]) -> Notification {
        Notification {
            hostname: hostname.to_string(),
            address: AddressInfo {
                protocol: "UDP".to_string(),
                source_host: "10.0.0.5".to_string(),
                source_port: "161".to_string(),
                target_host: "10.0.0.1".to_string(),
                target_port: "162".to_string(),
            },
            bindings: bindings.iter().map(|(oid, value)| Varbind::new(*oid, *value)).collect(),
        }
    }

    #[test]
    fn test_label_key() {
        assert_eq!(label_key("snmp", "1.3.6.1.2.1.1.3.0"), "snmp_1-3-6-1-2-1-1-3-0");
        assert_eq!(label_key("snmp", "SNMPv2-MIB::sysUpTime.0"), "snmp_SNMPv2-MIB--sysUpTime-0");
    }

    #[test]
    fn test_check_name_from_trap_oid() {
        let n = notification(
            "router1",
            &[
                ("1.3.6.1.2.1.1.3.0", "12345"),
                ("SNMPv2-MIB::snmpTrapOID.0", "IF-MIB::linkDown"),
            ],
        );
        let event = build_event(&n, &Config::default()).unwrap();
        assert_eq!(event.check_name(), "IF-MIB--linkDown");
        assert_eq!(event.check.interval, 1);
        assert_eq!(event.namespace(), "default");
    }

    #[test]
    fn test_missing_trap_oid_uses_default_name() {
        let mut config = Config::default();
        config.snmptrapd.defaults.trap.name = "generic-trap".to_string();
        config.snmptrapd.defaults.trap.status = 1;

        let n = notification("router1", &[("1.3.6.1.2.1.1.3.0", "12345")]);
        let event = build_event(&n, &config).unwrap();
        assert_eq!(event.check_name(), "generic-trap");
        assert_eq!(event.check.status, 1);
    }

    #[test]
    fn test_empty_trap_oid_value_uses_default_name() {
        let n = notification("router1", &[("1.3.6.1.6.3.1.1.4.1.0", "")]);
        let event = build_event(&n, &Config::default()).unwrap();
        assert_eq!(event.check_name(), "snmp-trap");
    }

    #[test]
    fn test_labels_and_output() {
        let n = notification(
            "router1",
            &[
                ("1.3.6.1.6.3.1.1.4.1.0", "1.3.6.1.6.3.1.1.5.3"),
                ("1.3.6.1.2.1.2.2.1.1.2", "2"),
                ("1.3.6.1.2.1.2.2.1.2.2", "GigabitEthernet0/1"),
            ],
        );
        let event = build_event(&n, &Config::default()).unwrap();

        assert_eq!(event.labels().len(), 3);
        assert_eq!(event.labels()["snmp_1-3-6-1-2-1-2-2-1-2-2"], "GigabitEthernet0/1");

        let output: Value = serde_json::from_str(event.output()).unwrap();
        assert_eq!(
            output,
            json!({
                "1.3.6.1.6.3.1.1.4.1.0": "1.3.6.1.6.3.1.1.5.3",
                "1.3.6.1.2.1.2.2.1.1.2": "2",
                "1.3.6.1.2.1.2.2.1.2.2": "GigabitEthernet0/1",
            })
        );
        assert!(event.output().starts_with("{\n  \""));
    }

    #[test]
    fn test_output_is_sorted() {
        let n = notification("router1", &[("b", "2"), ("a", "1")]);
        let event = build_event(&n, &Config::default()).unwrap();
        assert_eq!(event.output(), "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}");
    }

    #[test]
    fn test_colliding_label_keys_keep_later_value() {
        let n = notification("router1", &[("1.3.6.1", "first"), ("1:3.6:1", "second")]);
        let event = build_event(&n, &Config::default()).unwrap();
        assert_eq!(event.labels().len(), 1);
        assert_eq!(event.labels()["snmp_1-3-6-1"], "second");

        let output: Value = serde_json::from_str(event.output()).unwrap();
        assert_eq!(output.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_oid_keeps_later_value() {
        let n = notification("router1", &[("1.3.6.1.2.1.1.5.0", "old"), ("1.3.6.1.2.1.1.5.0", "new")]);
        let event = build_event(&n, &Config::default()).unwrap();
        let output: Value = serde_json::from_str(event.output()).unwrap();
        assert_eq!(output["1.3.6.1.2.1.1.5.0"], "new");
    }

    #[test]
    fn test_entity_omitted_for_localhost() {
        let event = build_event(&notification("localhost", &[]), &Config::default()).unwrap();
        assert!(event.entity.is_none());

        let body: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert!(body.get("entity").is_none());
    }

    #[test]
    fn test_entity_attached_for_remote_host() {
        let mut config = Config::default();
        config.sensu.check.namespace = "network".to_string();

        let event = build_event(&notification("10_0_0_5", &[]), &config).unwrap();
        let entity = event.entity.as_ref().unwrap();
        assert_eq!(entity.metadata.name, "10_0_0_5");
        assert_eq!(entity.metadata.namespace, "network");
    }

    #[test]
    fn test_wire_format() {
        let n = notification("router1", &[("1.3.6.1.6.3.1.1.4.1.0", "1.3.6.1.6.3.1.1.5.3")]);
        let event = build_event(&n, &Config::default()).unwrap();
        let body: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "check": {
                    "metadata": {
                        "name": "1-3-6-1-6-3-1-1-5-3",
                        "namespace": "default",
                        "labels": { "snmp_1-3-6-1-6-3-1-1-4-1-0": "1.3.6.1.6.3.1.1.5.3" }
                    },
                    "interval": 1,
                    "status": 0,
                    "output": "{\n  \"1.3.6.1.6.3.1.1.4.1.0\": \"1.3.6.1.6.3.1.1.5.3\"\n}"
                },
                "entity": {
                    "metadata": { "name": "router1", "namespace": "default" }
                }
            })
        );
    }
}
