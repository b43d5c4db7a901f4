//! Per-twin publisher
//!
//! Wraps one transport session and knows where the twin's envelopes go.

use std::time::Duration;
use tokio::sync::watch;
use twinfeed_core::{Envelope, ThingId};
use twinfeed_transport::{BoxTransport, ConnectionState, TransportError};

use crate::shutdown::Shutdown;

/// Owns the transport session of exactly one twin
pub struct TwinPublisher {
    thing_id: ThingId,
    destination: String,
    transport: BoxTransport,
    publish_timeout: Duration,
    disconnected: bool,
}

impl TwinPublisher {
    pub fn new(thing_id: ThingId, transport: BoxTransport, publish_timeout: Duration) -> Self {
        let destination = thing_id.telemetry_topic();
        Self {
            thing_id,
            destination,
            transport,
            publish_timeout,
            disconnected: false,
        }
    }

    pub fn thing_id(&self) -> &ThingId {
        &self.thing_id
    }

    /// Transport topic, `telemetry/{namespace}:{name}`
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn client_id(&self) -> &str {
        self.transport.client_id()
    }

    /// Open the session, giving up on timeout, refusal or shutdown
    pub async fn connect(
        &mut self,
        timeout: Duration,
        shutdown: &Shutdown,
    ) -> Result<(), TransportError> {
        log::debug!(
            "[{}] connecting as {}",
            self.thing_id,
            self.transport.client_id()
        );

        tokio::select! {
            biased;
            _ = shutdown.wait() => Err(TransportError::Cancelled),
            result = self.transport.connect(timeout) => result,
        }
    }

    /// Serialize and hand one envelope to the transport (QoS 0, no retry)
    pub async fn publish(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = envelope
            .to_json()
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        log::debug!(
            "[{}] {} <- {}",
            self.thing_id,
            self.destination,
            String::from_utf8_lossy(&payload)
        );

        self.transport
            .publish(&self.destination, &payload, self.publish_timeout)
            .await
    }

    /// Close the session; only the first call reaches the transport
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        if self.disconnected {
            return Ok(());
        }
        self.disconnected = true;
        self.transport.disconnect().await
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.transport.watch_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use twinfeed_core::ReadingSet;
    use twinfeed_transport::{BusEvent, channel_bus};

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn readings() -> ReadingSet {
        ReadingSet {
            voltage_v: 221.4,
            current_a: 30.12,
            active_power_kw: 6.268,
            power_factor: 0.94,
        }
    }

    fn publisher(bus: &twinfeed_transport::ChannelBus, raw: &str) -> TwinPublisher {
        let thing_id = ThingId::parse(raw).unwrap();
        TwinPublisher::new(thing_id, Box::new(bus.transport(raw)), TIMEOUT)
    }

    #[tokio::test]
    async fn test_publish_sends_envelope_to_telemetry_topic() {
        let (bus, subscriber) = channel_bus(10);
        let mut publisher = publisher(&bus, "org.openegiz:oven-01");
        let shutdown = Shutdown::new();

        assert_eq!(publisher.destination(), "telemetry/org.openegiz:oven-01");
        publisher.connect(TIMEOUT, &shutdown).await.unwrap();
        assert_eq!(publisher.state(), ConnectionState::Connected);

        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let envelope = Envelope::for_thing(publisher.thing_id(), &readings(), ts);
        publisher.publish(&envelope).await.unwrap();

        let events = subscriber.drain();
        let BusEvent::Published { topic, payload, .. } = &events[1] else {
            panic!("expected publish, got {:?}", events[1]);
        };
        assert_eq!(topic, "telemetry/org.openegiz:oven-01");

        let json: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(
            json["topic"],
            "org.openegiz/oven-01/things/twin/commands/modify"
        );
        assert_eq!(json["value"]["voltage_v"]["properties"]["value"], 221.4);
    }

    #[tokio::test]
    async fn test_connect_cancelled_by_shutdown() {
        let (bus, subscriber) = channel_bus(10);
        let mut publisher = publisher(&bus, "org.openegiz:oven-01");
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let result = publisher.connect(TIMEOUT, &shutdown).await;
        assert_eq!(result, Err(TransportError::Cancelled));
        assert!(!subscriber.has_messages());
    }

    #[tokio::test]
    async fn test_publish_when_not_connected() {
        let (bus, _subscriber) = channel_bus(10);
        let mut publisher = publisher(&bus, "org.openegiz:oven-01");

        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let envelope = Envelope::for_thing(publisher.thing_id(), &readings(), ts);
        assert_eq!(
            publisher.publish(&envelope).await,
            Err(TransportError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_disconnect_twice_emits_one_event() {
        let (bus, subscriber) = channel_bus(10);
        let mut publisher = publisher(&bus, "org.openegiz:oven-02");
        publisher.connect(TIMEOUT, &Shutdown::new()).await.unwrap();

        publisher.disconnect().await.unwrap();
        publisher.disconnect().await.unwrap();

        assert!(publisher.is_disconnected());
        let disconnects = subscriber
            .drain()
            .into_iter()
            .filter(|e| matches!(e, BusEvent::Disconnected { .. }))
            .count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn test_disconnect_never_connected() {
        let (bus, subscriber) = channel_bus(10);
        let mut publisher = publisher(&bus, "org.openegiz:oven-03");

        publisher.disconnect().await.unwrap();
        assert!(!subscriber.has_messages());
    }
}
