//! Generator configuration
//!
//! Loaded from a JSON file (every field optional) and then overridden by
//! command line flags. Defaults reproduce the stock two-oven setup:
//!
//! ```json
//! {
//!   "transport": { "type": "mqtt", "mqtt": { "host": "localhost", "port": 30511 } },
//!   "thing_ids": ["org.openegiz:oven-01", "org.openegiz:oven-02"],
//!   "interval_secs": 5.0,
//!   "signal": { "cycle_period": 60 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use twinfeed_core::{SignalConfig, ThingId};
use twinfeed_transport::{TransportConfig, TransportType};

use crate::error::ConfigError;

/// Twins simulated when none are configured explicitly
pub const DEFAULT_THING_IDS: [&str; 2] = ["org.openegiz:oven-01", "org.openegiz:oven-02"];

/// Seconds between ticks
pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;

/// Root configuration for the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Broker connection settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Twin identities, published in this order every tick
    #[serde(default = "default_thing_ids")]
    pub thing_ids: Vec<String>,

    /// Pause after each tick, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Signal model settings shared by all twins
    #[serde(default)]
    pub signal: SignalConfig,

    /// How long to wait for each broker session to come up
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// How long to wait for local hand-off of each publish
    #[serde(default = "default_timeout_ms")]
    pub publish_timeout_ms: u64,
}

fn default_thing_ids() -> Vec<String> {
    DEFAULT_THING_IDS.iter().map(|s| s.to_string()).collect()
}

fn default_interval_secs() -> f64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            thing_ids: default_thing_ids(),
            interval_secs: default_interval_secs(),
            signal: SignalConfig::default(),
            connect_timeout_ms: default_timeout_ms(),
            publish_timeout_ms: default_timeout_ms(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every setting and parse the twin identities
    pub fn validate(&self) -> Result<Vec<ThingId>, ConfigError> {
        self.interval()?;

        if self.signal.cycle_period == 0 {
            return Err(ConfigError::InvalidCyclePeriod);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connect"));
        }
        if self.publish_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("publish"));
        }
        if self.thing_ids.is_empty() {
            return Err(ConfigError::NoTwins);
        }

        self.thing_ids
            .iter()
            .map(|raw| ThingId::parse(raw).map_err(ConfigError::from))
            .collect()
    }

    /// Reject transports that need an in-process reader
    ///
    /// The channel bus is only drained by library callers and tests; the
    /// binary would fill it and then fail every publish with `Full`.
    pub fn require_broker(&self) -> Result<(), ConfigError> {
        match self.transport.transport_type {
            TransportType::Mqtt => Ok(()),
            TransportType::Channel => Err(ConfigError::UnsupportedTransport("channel")),
        }
    }

    /// Tick interval
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        // `!(x > 0.0)` also rejects NaN
        if !(self.interval_secs > 0.0) {
            return Err(ConfigError::NonPositiveInterval(self.interval_secs));
        }
        Duration::try_from_secs_f64(self.interval_secs)
            .map_err(|_| ConfigError::IntervalOutOfRange(self.interval_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Apply explicit command line values on top of this configuration
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.mqtt_host {
            self.transport.mqtt.host = host;
        }
        if let Some(port) = overrides.mqtt_port {
            self.transport.mqtt.port = port;
        }
        if let Some(thing_ids) = overrides.thing_ids {
            self.thing_ids = thing_ids;
        }
        if let Some(interval) = overrides.interval_secs {
            self.interval_secs = interval;
        }
        if let Some(period) = overrides.cycle_period {
            self.signal.cycle_period = period;
        }
        if overrides.seed.is_some() {
            self.signal.seed = overrides.seed;
        }
        self
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub mqtt_host: Option<String>,
    pub mqtt_port: Option<u16>,
    pub thing_ids: Option<Vec<String>>,
    pub interval_secs: Option<f64>,
    pub cycle_period: Option<u64>,
    pub seed: Option<u64>,
}
