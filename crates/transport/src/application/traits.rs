//! Transport Traits
//!
//! Core abstraction for a single twin's broker session.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

use super::error::TransportError;
use super::state::ConnectionState;

/// One publish/subscribe session owned by exactly one twin
///
/// Implementations are driven from a single task; methods take `&mut self`.
#[async_trait]
pub trait Transport: Send {
    /// Client identifier presented to the broker
    fn client_id(&self) -> &str;

    /// Open the session and wait up to `timeout` for confirmation
    ///
    /// Calling `connect` on an already connected transport is a no-op.
    async fn connect(&mut self, timeout: Duration) -> Result<(), TransportError>;

    /// Hand a payload to the transport at most-once delivery
    ///
    /// Waits up to `timeout` for local hand-off only; this is not an
    /// end-to-end delivery acknowledgement.
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), TransportError>;

    /// Close the session, best effort
    ///
    /// Safe to call when never connected, already lost or already closed;
    /// only the first call on a live session has any effect.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Current session state
    fn state(&self) -> ConnectionState;

    /// Subscribe to session state transitions
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;
}

/// Boxed transport type for dynamic dispatch
pub type BoxTransport = Box<dyn Transport>;
