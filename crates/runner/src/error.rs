//! Runner error types
//!
//! Configuration and connection errors are fatal and surface from
//! [`Orchestrator::run`](crate::Orchestrator::run); publish and disconnect
//! failures are contained per twin and only logged.

use thiserror::Error;
use twinfeed_core::{IdentityError, ThingId};
use twinfeed_transport::TransportError;

/// Invalid or unreadable configuration, detected before any connection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("no twins configured")]
    NoTwins,

    #[error("publish interval must be a positive number of seconds, got {0}")]
    NonPositiveInterval(f64),

    #[error("publish interval of {0} seconds is out of range")]
    IntervalOutOfRange(f64),

    #[error("cycle period must be at least one step")]
    InvalidCyclePeriod,

    #[error("{0} timeout must be non-zero")]
    ZeroTimeout(&'static str),

    #[error("transport configuration: {0}")]
    Transport(TransportError),

    #[error("the {0} transport has no reader in the generator binary, use \"mqtt\"")]
    UnsupportedTransport(&'static str),
}

/// Fatal error ending a generator run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not connect {thing_id} to the broker: {source}")]
    Connection {
        thing_id: ThingId,
        source: TransportError,
    },
}
