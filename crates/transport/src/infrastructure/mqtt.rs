//! MQTT Transport Implementation
//!
//! One MQTT 5 session per twin (rumqttc `v5` client). The client's event
//! loop runs on its own tokio task and reports back over two channels:
//!
//! - a `watch` channel carrying [`ConnectionState`] transitions
//! - an unbounded channel signalling each outgoing PUBLISH hand-off
//!
//! Reconnection is not attempted: once the event loop errors the
//! task ends and the session stays `Lost` (or `Failed` if it never came up).

use async_trait::async_trait;
use log::{debug, info, warn};
use rumqttc::Outgoing;
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::{AsyncClient, Event, EventLoop, MqttOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::config::MqttConfig;
use crate::application::error::TransportError;
use crate::application::state::{ConnectionState, wait_for_connection};
use crate::application::traits::Transport;

/// How long disconnect waits for the event loop to flush and exit
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// MQTT broker session for one twin
pub struct MqttTransport {
    config: MqttConfig,
    client_id: String,
    client: Option<AsyncClient>,
    event_loop: Option<JoinHandle<()>>,
    handoff_rx: Option<mpsc::UnboundedReceiver<()>>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl MqttTransport {
    /// Create a transport; nothing touches the network until `connect`
    pub fn new(config: MqttConfig, client_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            config,
            client_id: client_id.into(),
            client: None,
            event_loop: None,
            handoff_rx: None,
            state: Arc::new(state),
        }
    }

    /// Broker address as `host:port`
    pub fn broker(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        options.set_clean_start(true);
        options
    }

    async fn stop_event_loop(&mut self) {
        if let Some(mut task) = self.event_loop.take() {
            if tokio::time::timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
                debug!("{}: event loop did not exit in time, aborting", self.client_id);
                task.abort();
            }
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn connect(&mut self, timeout: Duration) -> Result<(), TransportError> {
        if self.state.borrow().is_connected() {
            return Ok(());
        }
        if self.client.is_some() {
            // A previous attempt left a task behind; start clean
            self.disconnect().await.ok();
        }

        info!("{}: connecting to MQTT broker {}", self.client_id, self.broker());

        let (client, event_loop) =
            AsyncClient::new(self.options(), self.config.request_capacity.max(1));
        let (handoff_tx, handoff_rx) = mpsc::unbounded_channel();

        self.state.send_replace(ConnectionState::Connecting);
        let states = self.state.subscribe();

        self.event_loop = Some(tokio::spawn(drive_event_loop(
            event_loop,
            self.state.clone(),
            handoff_tx,
            self.client_id.clone(),
        )));
        self.client = Some(client);
        self.handoff_rx = Some(handoff_rx);

        wait_for_connection(states, timeout).await
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), TransportError> {
        if !self.state.borrow().is_connected() {
            return Err(TransportError::NotConnected);
        }
        let (Some(client), Some(handoff)) = (self.client.as_ref(), self.handoff_rx.as_mut()) else {
            return Err(TransportError::NotConnected);
        };

        // Drop confirmations left over from a publish that timed out
        while handoff.try_recv().is_ok() {}

        let send = async {
            client
                .publish(topic, QoS::AtMostOnce, false, payload.to_vec())
                .await?;
            handoff.recv().await.ok_or(TransportError::ChannelClosed)
        };

        match tokio::time::timeout(timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        self.handoff_rx = None;

        let was_connected = self.state.borrow().is_connected();
        let mut result = Ok(());

        if was_connected {
            result = match tokio::time::timeout(DISCONNECT_GRACE, client.disconnect()).await {
                Ok(sent) => sent.map_err(TransportError::from),
                Err(_) => Err(TransportError::Timeout(DISCONNECT_GRACE)),
            };
        }

        self.stop_event_loop().await;
        self.state.send_replace(ConnectionState::Closed);

        if was_connected {
            info!("{}: disconnected from MQTT broker", self.client_id);
        }
        result
    }

    fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop.take() {
            task.abort();
        }
    }
}

/// Poll the rumqttc event loop until the session ends
async fn drive_event_loop(
    mut event_loop: EventLoop,
    state: Arc<watch::Sender<ConnectionState>>,
    handoff: mpsc::UnboundedSender<()>,
    client_id: String,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("{}: connected", client_id);
                    state.send_replace(ConnectionState::Connected);
                } else {
                    warn!("{}: broker refused connection: {:?}", client_id, ack.code);
                    state.send_replace(ConnectionState::Failed(format!("{:?}", ack.code)));
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect(_))) => {
                warn!("{}: broker closed the session", client_id);
                state.send_replace(ConnectionState::Lost("broker disconnect".to_string()));
                break;
            }
            Ok(Event::Outgoing(Outgoing::Publish(_))) => {
                let _ = handoff.send(());
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                state.send_replace(ConnectionState::Closed);
            }
            Ok(_) => {}
            Err(e) => {
                let current = state.borrow().clone();
                match current {
                    ConnectionState::Connected => {
                        warn!("{}: connection lost: {}", client_id, e);
                        state.send_replace(ConnectionState::Lost(e.to_string()));
                    }
                    ConnectionState::Closed => {
                        debug!("{}: event loop finished: {}", client_id, e);
                    }
                    _ => {
                        warn!("{}: connection failed: {}", client_id, e);
                        state.send_replace(ConnectionState::Failed(e.to_string()));
                    }
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    /// MQTT 5 CONNACK: no session, success, empty properties
    const CONNACK: [u8; 5] = [0x20, 0x03, 0x00, 0x00, 0x00];
    const PUBLISH_QOS0: u8 = 0x30;
    const DISCONNECT: u8 = 0xE0;

    /// Single-session broker on a local port
    ///
    /// Acknowledges the CONNECT, then records every byte the client sends
    /// until the client hangs up or `close` fires.
    async fn local_broker() -> (MqttConfig, oneshot::Sender<()>, JoinHandle<Vec<u8>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        let broker = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];

            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0 && buf[0] == 0x10, "expected CONNECT, got {:?}", &buf[..n]);
            socket.write_all(&CONNACK).await.unwrap();

            let mut received = Vec::new();
            loop {
                tokio::select! {
                    _ = &mut close_rx => break,
                    read = socket.read(&mut buf) => match read {
                        Ok(0) | Err(_) => break,
                        Ok(n) => received.extend_from_slice(&buf[..n]),
                    },
                }
            }
            received
        });

        let config = MqttConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };
        (config, close_tx, broker)
    }

    /// Port with nothing listening on it
    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn unreachable_config() -> MqttConfig {
        MqttConfig {
            host: "127.0.0.1".to_string(),
            port: closed_port(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_transport_is_idle() {
        let transport = MqttTransport::new(MqttConfig::default(), "oven-data-gen-1234");
        assert_eq!(transport.client_id(), "oven-data-gen-1234");
        assert_eq!(transport.state(), ConnectionState::Idle);
        assert_eq!(transport.broker(), "localhost:30511");
    }

    #[tokio::test]
    async fn test_connect_refused_fails() {
        let _ = env_logger::try_init();
        let mut transport = MqttTransport::new(unreachable_config(), "refused");

        let result = transport.connect(Duration::from_secs(5)).await;
        assert!(
            matches!(result, Err(TransportError::ConnectionFailed(_))),
            "got {:?}",
            result
        );
        assert!(matches!(transport.state(), ConnectionState::Failed(_)));

        // Cleanup after a failed connect is still fine
        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_publish_before_connect() {
        let mut transport = MqttTransport::new(MqttConfig::default(), "early");

        let result = transport
            .publish("telemetry/a:b", b"{}", Duration::from_millis(10))
            .await;
        assert_eq!(result, Err(TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect() {
        let mut transport = MqttTransport::new(MqttConfig::default(), "never");

        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_live_session_publish_and_disconnect() {
        let _ = env_logger::try_init();
        let (config, _close, broker) = local_broker().await;
        let mut transport = MqttTransport::new(config, "oven-data-gen-4242");

        transport.connect(Duration::from_secs(5)).await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Connected);

        let topic = "telemetry/org.openegiz:oven-01";
        transport
            .publish(topic, br#"{"n":1}"#, Duration::from_secs(5))
            .await
            .unwrap();
        transport
            .publish(topic, br#"{"n":2}"#, Duration::from_secs(5))
            .await
            .unwrap();

        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Closed);
        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Closed);

        let received = tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .unwrap()
            .unwrap();
        let text = String::from_utf8_lossy(&received);

        assert_eq!(received.first(), Some(&PUBLISH_QOS0));
        assert!(text.contains(topic));
        let first = text.find(r#"{"n":1}"#).unwrap();
        let second = text.find(r#"{"n":2}"#).unwrap();
        assert!(first < second);
        assert!(received.contains(&DISCONNECT));
    }

    #[tokio::test]
    async fn test_broker_close_marks_session_lost() {
        let _ = env_logger::try_init();
        let (config, close, broker) = local_broker().await;
        let mut transport = MqttTransport::new(config, "oven-data-gen-4343");
        let mut states = transport.watch_state();

        transport.connect(Duration::from_secs(5)).await.unwrap();

        close.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .unwrap()
            .unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| matches!(s, ConnectionState::Lost(_))),
        )
        .await
        .unwrap()
        .unwrap();

        let result = transport
            .publish("telemetry/a:b", b"{}", Duration::from_millis(100))
            .await;
        assert_eq!(result, Err(TransportError::NotConnected));

        // Lost session: disconnect is still a clean no-op
        transport.disconnect().await.unwrap();
        assert_eq!(transport.state(), ConnectionState::Closed);
    }
}
