use crate::net::{AddressMode, MacAddress, StaticConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),
}

/// How a static configuration is confirmed before it counts as connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaticLinkPolicy {
    /// Link is checked right after configuring. The PHY may not have
    /// settled yet, so a link that is about to come up reads as down.
    #[default]
    Immediate,
    /// Link must read up on the attempt and again on the following step.
    Confirmed,
}

/// Supervisor configuration
/// All timing values are in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    pub mac: MacAddress,
    #[serde(default, rename = "addressing")]
    pub mode: AddressMode,
    /// Minimum spacing between connection attempts (default: 10000)
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
    /// SPI chip-select pin for the Ethernet controller, if it needs one
    #[serde(default)]
    pub chip_select: Option<u8>,
    #[serde(default)]
    pub static_link_policy: StaticLinkPolicy,
    /// Host run-loop cadence used by `SupervisorRuntime` (default: 10)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_retry_interval() -> u64 { 10_000 }
fn default_poll_interval() -> u64 { 10 }

impl SupervisorConfig {
    /// DHCP with default timings.
    pub fn new(mac: MacAddress) -> Self {
        SupervisorConfig {
            mac,
            mode: AddressMode::Dhcp,
            retry_interval_ms: default_retry_interval(),
            chip_select: None,
            static_link_policy: StaticLinkPolicy::default(),
            poll_interval_ms: default_poll_interval(),
        }
    }

    pub fn with_static(mut self, config: StaticConfig) -> Self {
        self.mode = AddressMode::Static(config);
        self
    }

    pub fn with_retry_interval(mut self, ms: u64) -> Self {
        self.retry_interval_ms = ms;
        self
    }

    pub fn with_chip_select(mut self, pin: u8) -> Self {
        self.chip_select = Some(pin);
        self
    }

    pub fn with_static_link_policy(mut self, policy: StaticLinkPolicy) -> Self {
        self.static_link_policy = policy;
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
