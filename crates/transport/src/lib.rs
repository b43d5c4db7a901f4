//! Transport Abstraction Layer
//!
//! Provides the abstract [`Transport`] session trait used by every twin, with
//! pluggable implementations:
//!
//! - **MQTT** (default): one broker session per twin via rumqttc
//! - **Channel**: In-process bus via crossbeam channels (feature-gated)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! │  ┌─────────────┐  ┌─────────────────┐  ┌─────────────┐  │
//! │  │  Transport  │  │ ConnectionState │  │   Errors    │  │
//! │  │   (trait)   │  │     (watch)     │  │             │  │
//! │  └─────────────┘  └─────────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │    MQTT     │  │   Channel   │  │     Factory     │  │
//! │  │  (rumqttc)  │  │ (crossbeam) │  │    (config)     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use twinfeed_transport::{TransportConfig, TransportFactory};
//!
//! let mut factory = TransportFactory::new(TransportConfig::mqtt("localhost", 1883))?;
//! let mut transport = factory.create("org.openegiz:oven-01")?;
//!
//! transport.connect(Duration::from_secs(5)).await?;
//! transport.publish("telemetry/org.openegiz:oven-01", b"{}", Duration::from_secs(5)).await?;
//! transport.disconnect().await?;
//! ```

pub mod application;
pub mod infrastructure;

// Re-export application layer types (ports/abstractions)
pub use application::{
    BoxTransport, ConnectionState, Transport, TransportError, wait_for_connection,
};

// Re-export infrastructure layer types (implementations)
pub use infrastructure::{
    ChannelConfig, DEFAULT_MQTT_HOST, DEFAULT_MQTT_PORT, MqttConfig, MqttTransport,
    TransportConfig, TransportFactory, TransportType,
};

// Re-export channel types when feature is enabled
#[cfg(feature = "channel")]
pub use infrastructure::{BusEvent, ChannelBus, ChannelSubscriber, ChannelTransport, channel_bus};
