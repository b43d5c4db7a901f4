//! Infrastructure Layer - Concrete implementations
//!
//! Contains concrete transport implementations and configuration.
//! - MQTT: one rumqttc broker session per twin
//! - Channel: In-process bus via crossbeam channels (feature-gated)

#[cfg(feature = "channel")]
pub mod channel;
pub mod config;
pub mod factory;
pub mod mqtt;

#[cfg(feature = "channel")]
pub use channel::{BusEvent, ChannelBus, ChannelSubscriber, ChannelTransport, channel_bus};
pub use config::{
    ChannelConfig, DEFAULT_MQTT_HOST, DEFAULT_MQTT_PORT, MqttConfig, TransportConfig,
    TransportType,
};
pub use factory::TransportFactory;
pub use mqtt::MqttTransport;
