//! Configuration management for trapcheck
//!
//! Settings are read once at startup from a JSON file, optionally overridden
//! from the environment, validated, and then passed by reference to the
//! components that need them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub snmptrapd: SnmptrapdConfig,
    pub sensu: SensuConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmptrapdConfig {
    pub defaults: SnmptrapdDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmptrapdDefaults {
    pub device: DeviceDefaults,
    pub trap: TrapDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefaults {
    /// Entity name used when snmptrapd could not resolve the sender and the
    /// notification carries no source address either.
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapDefaults {
    /// Check name used when no snmpTrapOID varbind is present.
    pub name: String,
    #[serde(default)]
    pub status: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensuConfig {
    pub agent: SensuAgentConfig,
    pub check: SensuCheckConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensuAgentConfig {
    pub api: SensuAgentApiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensuAgentApiConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl SensuAgentApiConfig {
    /// The agent events API URL
    pub fn events_url(&self) -> String {
        format!("http://{}:{}/events", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensuCheckConfig {
    pub namespace: String,
    pub label_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_console_output")]
    pub console_output: bool,
    #[serde(default)]
    pub file_output: Option<String>,
}

fn default_log_level() -> String { "info".to_string() }
fn default_console_output() -> bool { true }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console_output: default_console_output(),
            file_output: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snmptrapd: SnmptrapdConfig {
                defaults: SnmptrapdDefaults {
                    device: DeviceDefaults {
                        host: "unknown-device".to_string(),
                    },
                    trap: TrapDefaults {
                        name: "snmp-trap".to_string(),
                        status: 0,
                    },
                },
            },
            sensu: SensuConfig {
                agent: SensuAgentConfig {
                    api: SensuAgentApiConfig {
                        host: "127.0.0.1".to_string(),
                        port: 3031,
                        timeout_seconds: None,
                    },
                },
                check: SensuCheckConfig {
                    namespace: "default".to_string(),
                    label_prefix: "snmp".to_string(),
                },
            },
            logging: LoggingConfig::default(),
        }
    }
}

/// Environment variables that override file settings. Empty values are
/// treated as unset.
pub const ENV_DEVICE_HOST: &str = "SNMPTRAPD_DEFAULT_DEVICE_HOST";
pub const ENV_TRAP_NAME: &str = "SNMPTRAPD_DEFAULT_TRAP_NAME";
pub const ENV_TRAP_STATUS: &str = "SNMPTRAPD_DEFAULT_TRAP_STATUS";
pub const ENV_NAMESPACE: &str = "SENSU_NAMESPACE";
pub const ENV_LABEL_PREFIX: &str = "SENSU_CHECK_LABEL_PREFIX";
pub const ENV_AGENT_API_HOST: &str = "SENSU_AGENT_API_HOST";
pub const ENV_AGENT_API_PORT: &str = "SENSU_AGENT_API_PORT";

impl Config {
    /// Parse configuration from a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse configuration JSON")
    }

    /// Load configuration from a JSON file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .context("Failed to read configuration file")?;

        Self::from_json(&content)
    }

    /// Save configuration to a JSON file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialise configuration")?;

        tokio::fs::write(path.as_ref(), content)
            .await
            .context("Failed to write configuration file")?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(host) = get(ENV_DEVICE_HOST) {
            debug!("{} overrides default device host", ENV_DEVICE_HOST);
            self.snmptrapd.defaults.device.host = host;
        }
        if let Some(name) = get(ENV_TRAP_NAME) {
            debug!("{} overrides default trap name", ENV_TRAP_NAME);
            self.snmptrapd.defaults.trap.name = name;
        }
        if let Some(status) = get(ENV_TRAP_STATUS) {
            self.snmptrapd.defaults.trap.status = status
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_TRAP_STATUS, status))?;
        }
        if let Some(namespace) = get(ENV_NAMESPACE) {
            debug!("{} overrides check namespace", ENV_NAMESPACE);
            self.sensu.check.namespace = namespace;
        }
        if let Some(prefix) = get(ENV_LABEL_PREFIX) {
            self.sensu.check.label_prefix = prefix;
        }
        if let Some(host) = get(ENV_AGENT_API_HOST) {
            debug!("{} overrides agent API host", ENV_AGENT_API_HOST);
            self.sensu.agent.api.host = host;
        }
        if let Some(port) = get(ENV_AGENT_API_PORT) {
            self.sensu.agent.api.port = port
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_AGENT_API_PORT, port))?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.snmptrapd.defaults.device.host.trim().is_empty() {
            anyhow::bail!("Default device host cannot be empty");
        }
        if self.snmptrapd.defaults.trap.name.trim().is_empty() {
            anyhow::bail!("Default trap name cannot be empty");
        }
        if self.snmptrapd.defaults.trap.status > 255 {
            anyhow::bail!(
                "Default trap status must be an exit code between 0 and 255: {}",
                self.snmptrapd.defaults.trap.status
            );
        }
        if self.sensu.check.namespace.trim().is_empty() {
            anyhow::bail!("Sensu namespace cannot be empty");
        }
        if self.sensu.agent.api.host.trim().is_empty() {
            anyhow::bail!("Sensu agent API host cannot be empty");
        }
        if self.sensu.agent.api.port == 0 {
            anyhow::bail!("Invalid Sensu agent API port: {}", self.sensu.agent.api.port);
        }
        if self.sensu.agent.api.timeout_seconds == Some(0) {
            anyhow::bail!("Sensu agent API timeout must be greater than zero");
        }

        Ok(())
    }

    pub fn events_url(&self) -> String {
        self.sensu.agent.api.events_url()
    }
}
