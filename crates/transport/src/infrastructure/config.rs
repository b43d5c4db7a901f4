//! Transport Configuration
//!
//! Configuration types for creating transports from config files.

use serde::{Deserialize, Serialize};

/// Default broker host
pub const DEFAULT_MQTT_HOST: &str = "localhost";

/// Default broker port (the OpenTwins Mosquitto NodePort)
pub const DEFAULT_MQTT_PORT: u16 = 30511;

/// Transport type selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// MQTT broker session per twin (default)
    #[default]
    Mqtt,
    /// In-process bus
    Channel,
}

/// MQTT-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name or address
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Client ID prefix; a random four-digit suffix is appended
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,
    /// Request queue capacity between client and event loop
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

fn default_mqtt_host() -> String {
    DEFAULT_MQTT_HOST.to_string()
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_client_id_prefix() -> String {
    "oven-data-gen".to_string()
}

fn default_request_capacity() -> usize {
    64
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            keep_alive_secs: default_keep_alive_secs(),
            client_id_prefix: default_client_id_prefix(),
            request_capacity: default_request_capacity(),
        }
    }
}

/// Channel-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Buffer capacity (bounded channel size)
    #[serde(default = "default_channel_capacity")]
    pub capacity: usize,
}

fn default_channel_capacity() -> usize {
    10_000
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: default_channel_capacity(),
        }
    }
}

/// Root transport configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport type
    #[serde(rename = "type", default)]
    pub transport_type: TransportType,

    /// MQTT configuration (when type = "mqtt")
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Channel configuration (when type = "channel")
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl TransportConfig {
    /// MQTT transport config for a broker address
    pub fn mqtt(host: &str, port: u16) -> Self {
        Self {
            transport_type: TransportType::Mqtt,
            mqtt: MqttConfig {
                host: host.to_string(),
                port,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// In-process channel transport config
    pub fn channel(capacity: usize) -> Self {
        Self {
            transport_type: TransportType::Channel,
            channel: ChannelConfig { capacity },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.transport_type, TransportType::Mqtt);
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 30511);
        assert_eq!(config.mqtt.keep_alive_secs, 60);
    }

    #[test]
    fn test_mqtt_config() {
        let config = TransportConfig::mqtt("192.168.1.100", 1883);
        assert_eq!(config.transport_type, TransportType::Mqtt);
        assert_eq!(config.mqtt.host, "192.168.1.100");
        assert_eq!(config.mqtt.port, 1883);
    }

    #[test]
    fn test_channel_config() {
        let config = TransportConfig::channel(500);
        assert_eq!(config.transport_type, TransportType::Channel);
        assert_eq!(config.channel.capacity, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"type": "mqtt", "mqtt": {"port": 1883}}"#).unwrap();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.client_id_prefix, "oven-data-gen");
    }

    #[test]
    fn test_config_serialization() {
        let config = TransportConfig::channel(10_000);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TransportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
