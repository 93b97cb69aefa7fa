//! Bridge configuration, loaded once from a YAML file at startup.
//!
//! Every key is optional:
//!
//! ```yaml
//! subscriber_topic: analog_input
//! channel: 0
//! listen: 0.0.0.0:7447
//! on_write_failure: terminate   # or `skip`
//! discovery_timeout_ms: 2000
//! device:
//!   serial: 470031743           # -2 selects the emulated device
//!   ip: 192.168.1.25            # skips discovery
//!   device_type: t7
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{dac_register, DeviceType, Error, LabJackSerialNumber, DEFAULT_DISCOVERY_TIMEOUT};
use crate::output::WriteFailurePolicy;
use crate::pubsub::DEFAULT_TOPIC_PORT;

pub const DEFAULT_SUBSCRIBER_TOPIC: &str = "analog_input";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Topic whose values drive the output.
    #[serde(default = "default_subscriber_topic")]
    pub subscriber_topic: String,

    /// Analog output channel, `0` for DAC0.
    #[serde(default)]
    pub channel: u8,

    /// Address the topic transport receives on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default)]
    pub on_write_failure: WriteFailurePolicy,

    #[serde(default)]
    pub device: DeviceSelector,

    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
}

/// Narrows which device the bridge connects to. Empty, it takes the first one found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSelector {
    #[serde(default)]
    pub serial: Option<LabJackSerialNumber>,

    #[serde(default)]
    pub ip: Option<IpAddr>,

    #[serde(default)]
    pub device_type: DeviceType,
}

fn default_subscriber_topic() -> String {
    DEFAULT_SUBSCRIBER_TOPIC.to_string()
}

fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_TOPIC_PORT))
}

fn default_discovery_timeout_ms() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT.as_millis() as u64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            subscriber_topic: default_subscriber_topic(),
            channel: 0,
            listen: default_listen(),
            on_write_failure: WriteFailurePolicy::default(),
            device: DeviceSelector::default(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Loading configuration from {:?}", path);

        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        BridgeConfig::from_yaml(&contents)
    }

    /// Parses and validates a YAML document. An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        let value: serde_yml::Value = serde_yml::from_str(contents)?;

        let config = match value {
            serde_yml::Value::Null => BridgeConfig::default(),
            _ => serde_yml::from_str(contents)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        dac_register(self.channel).map(|_| ())
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}
