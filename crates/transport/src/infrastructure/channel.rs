//! Channel Transport Implementation
//!
//! In-process bus via a crossbeam bounded channel. Every transport created
//! from one bus shares the same channel, so a single subscriber sees the
//! global publish order together with session lifecycle events.

use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::debug;
use std::time::Duration;
use tokio::sync::watch;

use crate::application::error::TransportError;
use crate::application::state::ConnectionState;
use crate::application::traits::Transport;

/// Event observed on the in-process bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Connected {
        client_id: String,
    },
    Published {
        client_id: String,
        topic: String,
        payload: Vec<u8>,
    },
    Disconnected {
        client_id: String,
    },
}

impl BusEvent {
    pub fn client_id(&self) -> &str {
        match self {
            BusEvent::Connected { client_id }
            | BusEvent::Published { client_id, .. }
            | BusEvent::Disconnected { client_id } => client_id,
        }
    }
}

/// Shared sending side of the bus
#[derive(Clone)]
pub struct ChannelBus {
    tx: Sender<BusEvent>,
}

impl ChannelBus {
    /// Create a transport attached to this bus
    pub fn transport(&self, client_id: impl Into<String>) -> ChannelTransport {
        ChannelTransport::new(client_id, self.tx.clone())
    }
}

/// Channel-based transport for one twin
pub struct ChannelTransport {
    client_id: String,
    tx: Sender<BusEvent>,
    state: watch::Sender<ConnectionState>,
}

impl ChannelTransport {
    /// Create a new channel transport
    pub fn new(client_id: impl Into<String>, tx: Sender<BusEvent>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            client_id: client_id.into(),
            tx,
            state,
        }
    }

    fn send(&self, event: BusEvent) -> Result<(), TransportError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TransportError::Full),
            Err(TrySendError::Disconnected(_)) => Err(TransportError::ChannelClosed),
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn connect(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        if self.state.borrow().is_connected() {
            return Ok(());
        }

        let event = BusEvent::Connected {
            client_id: self.client_id.clone(),
        };
        match self.send(event) {
            Ok(()) => {
                self.state.send_replace(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Failed(e.to_string()));
                Err(TransportError::ConnectionFailed(e.to_string()))
            }
        }
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        if !self.state.borrow().is_connected() {
            return Err(TransportError::NotConnected);
        }

        self.send(BusEvent::Published {
            client_id: self.client_id.clone(),
            topic: topic.to_string(),
            payload: payload.to_vec(),
        })
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if !self.state.borrow().is_connected() {
            debug!("{}: disconnect on inactive session ignored", self.client_id);
            self.state.send_replace(ConnectionState::Closed);
            return Ok(());
        }

        self.state.send_replace(ConnectionState::Closed);
        self.send(BusEvent::Disconnected {
            client_id: self.client_id.clone(),
        })
    }

    fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

/// Receiving side of the bus
pub struct ChannelSubscriber {
    rx: Receiver<BusEvent>,
}

impl ChannelSubscriber {
    /// Create a new channel subscriber
    pub fn new(rx: Receiver<BusEvent>) -> Self {
        Self { rx }
    }

    /// Poll for events, calling handler for each; returns the count processed
    ///
    /// This is non-blocking - returns immediately if nothing is queued.
    pub fn poll(&self, handler: &mut dyn FnMut(&BusEvent)) -> usize {
        let mut count = 0;
        while let Ok(event) = self.rx.try_recv() {
            handler(&event);
            count += 1;
        }
        count
    }

    /// Take every queued event
    pub fn drain(&self) -> Vec<BusEvent> {
        self.rx.try_iter().collect()
    }

    /// Non-blocking check if events are available
    pub fn has_messages(&self) -> bool {
        !self.rx.is_empty()
    }
}

/// Create a bus and its subscriber
///
/// # Arguments
///
/// * `capacity` - The bounded channel capacity (backpressure threshold)
pub fn channel_bus(capacity: usize) -> (ChannelBus, ChannelSubscriber) {
    let (tx, rx) = bounded(capacity);
    (ChannelBus { tx }, ChannelSubscriber::new(rx))
}
