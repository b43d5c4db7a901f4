//! Connection State
//!
//! Every transport broadcasts its session state on a `watch` channel so
//! callers can wait for confirmation and observe mid-run losses.

use std::time::Duration;
use tokio::sync::watch;

use super::error::TransportError;

/// Session lifecycle as seen by the owning twin
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session requested yet
    #[default]
    Idle,
    /// Session requested, waiting for the broker
    Connecting,
    /// Broker confirmed the session
    Connected,
    /// Session never came up
    Failed(String),
    /// Session dropped while connected
    Lost(String),
    /// Closed on request
    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether the state can still change without a new connect call
    pub fn is_pending(&self) -> bool {
        matches!(self, ConnectionState::Connecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Failed(reason) => write!(f, "failed ({})", reason),
            ConnectionState::Lost(reason) => write!(f, "lost ({})", reason),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Wait until a pending connection settles, bounded by `timeout`
pub async fn wait_for_connection(
    mut state: watch::Receiver<ConnectionState>,
    timeout: Duration,
) -> Result<(), TransportError> {
    let settled = tokio::time::timeout(timeout, state.wait_for(|s| !s.is_pending())).await;

    match settled {
        Err(_) => Err(TransportError::Timeout(timeout)),
        Ok(Err(_)) => Err(TransportError::ChannelClosed),
        Ok(Ok(current)) => match &*current {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Failed(reason) | ConnectionState::Lost(reason) => {
                Err(TransportError::ConnectionFailed(reason.clone()))
            }
            other => Err(TransportError::ConnectionFailed(other.to_string())),
        },
    }
}
