//! Transport Factory
//!
//! Creates one transport per twin from configuration.

use log::debug;
use rand::Rng;
use std::collections::HashSet;

use super::config::{TransportConfig, TransportType};
use super::mqtt::MqttTransport;
use crate::application::error::TransportError;
use crate::application::traits::BoxTransport;

#[cfg(feature = "channel")]
use super::channel::{ChannelBus, ChannelSubscriber, channel_bus};

/// Random client ID draws before falling back to a counter suffix
const MAX_CLIENT_ID_DRAWS: usize = 100;

/// Factory for creating per-twin transports from configuration
pub struct TransportFactory {
    config: TransportConfig,
    issued: HashSet<String>,
    #[cfg(feature = "channel")]
    bus: Option<ChannelBus>,
    #[cfg(feature = "channel")]
    subscriber: Option<ChannelSubscriber>,
}

impl TransportFactory {
    /// Validate the configuration and prepare shared resources
    ///
    /// For the channel transport this creates the bus every twin attaches to.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        match config.transport_type {
            TransportType::Mqtt => {
                if config.mqtt.host.trim().is_empty() {
                    return Err(TransportError::Config("MQTT host is empty".to_string()));
                }
                if config.mqtt.port == 0 {
                    return Err(TransportError::Config("MQTT port must be non-zero".to_string()));
                }
            }
            TransportType::Channel => {
                #[cfg(not(feature = "channel"))]
                {
                    return Err(TransportError::Config(
                        "Channel transport not enabled. Enable 'channel' feature.".to_string(),
                    ));
                }
                #[cfg(feature = "channel")]
                {
                    if config.channel.capacity == 0 {
                        return Err(TransportError::Config(
                            "channel capacity must be non-zero".to_string(),
                        ));
                    }
                }
            }
        }

        #[cfg(feature = "channel")]
        let (bus, subscriber) = match config.transport_type {
            TransportType::Channel => {
                let (bus, subscriber) = channel_bus(config.channel.capacity);
                (Some(bus), Some(subscriber))
            }
            TransportType::Mqtt => (None, None),
        };

        Ok(Self {
            config,
            issued: HashSet::new(),
            #[cfg(feature = "channel")]
            bus,
            #[cfg(feature = "channel")]
            subscriber,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Create the transport for one twin
    ///
    /// `label` names the twin in channel client IDs; MQTT client IDs get a
    /// random four-digit suffix that is unique within this factory.
    pub fn create(&mut self, label: &str) -> Result<BoxTransport, TransportError> {
        match self.config.transport_type {
            TransportType::Mqtt => {
                let client_id = self.mqtt_client_id();
                debug!("Creating MQTT transport {} for {}", client_id, label);
                Ok(Box::new(MqttTransport::new(self.config.mqtt.clone(), client_id)))
            }
            TransportType::Channel => {
                #[cfg(feature = "channel")]
                {
                    let bus = self.bus.as_ref().ok_or_else(|| {
                        TransportError::Config("channel bus not initialised".to_string())
                    })?;
                    let client_id = format!("{}-{}", self.config.mqtt.client_id_prefix, label);
                    self.issued.insert(client_id.clone());
                    Ok(Box::new(bus.transport(client_id)))
                }
                #[cfg(not(feature = "channel"))]
                {
                    Err(TransportError::Config(
                        "Channel transport not enabled. Enable 'channel' feature.".to_string(),
                    ))
                }
            }
        }
    }

    /// Take the receiving side of the in-process bus (channel transport only)
    #[cfg(feature = "channel")]
    pub fn take_subscriber(&mut self) -> Option<ChannelSubscriber> {
        self.subscriber.take()
    }

    fn mqtt_client_id(&mut self) -> String {
        let prefix = &self.config.mqtt.client_id_prefix;
        let mut rng = rand::thread_rng();

        let drawn = (0..MAX_CLIENT_ID_DRAWS)
            .map(|_| format!("{}-{}", prefix, rng.gen_range(1000..=9999)))
            .find(|id| !self.issued.contains(id));
        let client_id = drawn.unwrap_or_else(|| format!("{}-{}", prefix, self.issued.len()));

        self.issued.insert(client_id.clone());
        client_id
    }
}
