use std::time::Duration;

use chrono::{DateTime, Local};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{AxisSample, TelemetryStream};

const DEFAULT_PORT: u16 = 1883;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid MQTT server address '{0}'")]
    InvalidServer(String),
}

#[derive(Clone, Debug)]
pub struct MqttSettings {
    /// `HOST` or `HOST:PORT`
    pub server: String,
    pub client_id: String,
    pub slicing_topic: String,
    pub state_topic: String,
}

impl MqttSettings {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            client_id: "SpaceNavControl".to_string(),
            slicing_topic: "spacenav/slicing".to_string(),
            state_topic: "spacenav/state".to_string(),
        }
    }

    fn topic(&self, stream: TelemetryStream) -> &str {
        match stream {
            TelemetryStream::Slicing => &self.slicing_topic,
            TelemetryStream::State => &self.state_topic,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MqttStatus {
    pub connection_state: ConnectionState,
    pub messages_sent: usize,
    pub last_activity: Option<DateTime<Local>>,
}

/// Splits `HOST[:PORT]` or `[IPV6]:PORT`, defaulting to the standard MQTT port
pub fn parse_server(server: &str) -> Result<(String, u16), TelemetryError> {
    let invalid = || TelemetryError::InvalidServer(server.to_string());
    let trimmed = server.trim();
    let (host, port) = match trimmed.strip_prefix('[') {
        Some(bracketed) => {
            let (host, rest) = bracketed.split_once(']').ok_or_else(invalid)?;
            match rest.strip_prefix(':') {
                Some(port) => (host, port.parse().map_err(|_| invalid())?),
                None if rest.is_empty() => (host, DEFAULT_PORT),
                None => return Err(invalid()),
            }
        }
        // unbracketed IPv6 literals fail the port parse
        None => match trimmed.split_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
            None => (trimmed, DEFAULT_PORT),
        },
    };
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}

/// Publishes queued axis samples to an MQTT broker
///
/// Two tasks: one forwards samples from the queue to the client, the other
/// drives the rumqttc event loop and reconnects on failure.
pub struct MqttPublisher {
    client: AsyncClient,
    forwarder: JoinHandle<()>,
    event_loop: JoinHandle<()>,
    status_tx: watch::Sender<MqttStatus>,
    status: watch::Receiver<MqttStatus>,
}

impl MqttPublisher {
    pub fn spawn(
        settings: MqttSettings,
        samples: mpsc::Receiver<AxisSample>,
    ) -> Result<Self, TelemetryError> {
        let (host, port) = parse_server(&settings.server)?;
        info!("Publishing telemetry to {}:{}", host, port);

        let mut options = MqttOptions::new(settings.client_id.clone(), host, port);
        options.set_keep_alive(Duration::from_secs(5));
        let (client, event_loop) = AsyncClient::new(options, 100);

        let (status_tx, status) = watch::channel(MqttStatus::default());
        let event_loop = tokio::spawn(drive_event_loop(event_loop, status_tx.clone()));
        let forwarder = tokio::spawn(forward_samples(
            client.clone(),
            settings,
            samples,
            status_tx.clone(),
        ));

        Ok(Self {
            client,
            forwarder,
            event_loop,
            status_tx,
            status,
        })
    }

    pub fn status(&self) -> MqttStatus {
        self.status.borrow().clone()
    }

    /// Waits for queued samples to go out, then disconnects
    ///
    /// The queue drains once every sending sink is dropped. Returns the
    /// final status.
    pub async fn shutdown(self, grace: Duration) -> MqttStatus {
        match tokio::time::timeout(grace, self.forwarder).await {
            Ok(Ok(())) => debug!("Telemetry queue drained"),
            Ok(Err(e)) => error!("Telemetry forwarder failed: {}", e),
            Err(_) => warn!("Telemetry queue not drained after {:?}", grace),
        }
        if let Err(e) = self.client.disconnect().await {
            debug!("MQTT disconnect: {}", e);
        }
        self.event_loop.abort();
        self.status_tx
            .send_modify(|s| s.connection_state = ConnectionState::Disconnected);
        info!("Telemetry publisher stopped");
        self.status_tx.borrow().clone()
    }
}

async fn forward_samples(
    client: AsyncClient,
    settings: MqttSettings,
    mut samples: mpsc::Receiver<AxisSample>,
    status: watch::Sender<MqttStatus>,
) {
    while let Some(sample) = samples.recv().await {
        let topic = settings.topic(sample.stream);
        match client
            .publish(topic, QoS::AtMostOnce, false, sample.payload())
            .await
        {
            Ok(()) => status.send_modify(|s| {
                s.messages_sent += 1;
                s.last_activity = Some(sample.timestamp);
            }),
            Err(e) => warn!("Failed to publish to {}: {}", topic, e),
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop, status: watch::Sender<MqttStatus>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connected");
                status.send_modify(|s| s.connection_state = ConnectionState::Connected);
            }
            Ok(event) => debug!("MQTT event: {:?}", event),
            Err(e) => {
                warn!("MQTT connection error: {}", e);
                status.send_modify(|s| s.connection_state = ConnectionState::Reconnecting);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_port_defaults_to_1883() {
        assert_eq!(
            parse_server("localhost").unwrap(),
            ("localhost".to_string(), 1883)
        );
        assert_eq!(
            parse_server("10.0.0.2:1884").unwrap(),
            ("10.0.0.2".to_string(), 1884)
        );
    }

    #[test]
    fn bad_server_is_rejected() {
        assert!(parse_server("broker:port").is_err());
        assert!(parse_server(":1883").is_err());
        assert!(parse_server("::1").is_err());
        assert!(parse_server("[::1").is_err());
        assert!(parse_server("[]:1883").is_err());
    }

    #[test]
    fn bracketed_ipv6_hosts_are_accepted() {
        assert_eq!(parse_server("[::1]").unwrap(), ("::1".to_string(), 1883));
        assert_eq!(
            parse_server("[fe80::2]:1884").unwrap(),
            ("fe80::2".to_string(), 1884)
        );
    }

    #[tokio::test]
    async fn forwarded_samples_are_counted() {
        let settings = MqttSettings::new("localhost");
        let options = MqttOptions::new("test", "localhost", DEFAULT_PORT);
        // the unpolled event loop still buffers requests
        let (client, _event_loop) = AsyncClient::new(options, 10);
        let (status_tx, status) = watch::channel(MqttStatus::default());
        let (tx, rx) = mpsc::channel(4);

        tx.send(AxisSample::new(TelemetryStream::Slicing, 0, 0.25))
            .await
            .unwrap();
        let last = AxisSample::new(TelemetryStream::State, 2, -1.0);
        tx.send(last.clone()).await.unwrap();
        drop(tx);

        forward_samples(client, settings, rx, status_tx).await;

        let status = status.borrow().clone();
        assert_eq!(status.messages_sent, 2);
        assert_eq!(status.last_activity, Some(last.timestamp));
        assert_eq!(status.connection_state, ConnectionState::Disconnected);
    }

    #[test]
    fn streams_map_to_their_topics() {
        let settings = MqttSettings::new("localhost");
        assert_eq!(settings.topic(TelemetryStream::Slicing), "spacenav/slicing");
        assert_eq!(settings.topic(TelemetryStream::State), "spacenav/state");
    }
}
