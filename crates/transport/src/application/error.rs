//! Transport Error Types

use std::time::Duration;
use thiserror::Error;

/// Error type for transport operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Broker refused or dropped the session before it was confirmed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Confirmation did not arrive in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Operation needs an established session
    #[error("not connected")]
    NotConnected,

    /// Channel/connection is closed
    #[error("channel closed")]
    ChannelClosed,

    /// Buffer is full (backpressure)
    #[error("buffer full")]
    Full,

    /// Payload could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Client library rejected the request
    #[error("client error: {0}")]
    Client(String),

    /// Waiting was interrupted by shutdown
    #[error("cancelled by shutdown")]
    Cancelled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rumqttc::v5::ClientError> for TransportError {
    fn from(err: rumqttc::v5::ClientError) -> Self {
        TransportError::Client(err.to_string())
    }
}
