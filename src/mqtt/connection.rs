//! Broker connection lifecycle and the real publisher adapter
//!
//! Wraps a `rumqttc::AsyncClient`: builds the client from a
//! [`BrokerConfig`], runs the event loop in its own tokio task and mirrors
//! the connection lifecycle into a `watch` state cell. The orchestrator
//! reads that cell before every publish; host layers receive the same
//! transitions as `TransferEvent::StateChanged`. Reconnection is the
//! library's behavior of re-dialing on the next poll, not logic of this
//! module.

use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS, TlsConfiguration, Transport};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::transfer::error::TransferError;
use crate::transfer::events::TransferEvent;
use crate::transfer::orchestrator::ChunkPublisher;

use super::config::BrokerConfig;

/// Lifecycle of the broker link as seen by publishers
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// An established (or in-progress) broker connection
///
/// Owns the client handle and the event-loop task. Dropping the connection
/// without calling [`disconnect`](Self::disconnect) leaves the task running
/// until the runtime shuts down.
pub struct MqttConnection {
    client: AsyncClient,
    state_rx: watch::Receiver<ConnectionState>,
    eventloop_handle: JoinHandle<()>,
}

impl MqttConnection {
    /// Starts a connection attempt and spawns the event-loop task
    ///
    /// Returns immediately; the watch cell and the event channel report when
    /// the broker acknowledges the connection.
    pub fn connect(
        config: &BrokerConfig,
        events: mpsc::Sender<TransferEvent>,
    ) -> Result<Self, TransferError> {
        let options = mqtt_options(config)?;
        info!("Connecting to {}", config.server_uri());

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let eventloop_handle = tokio::spawn(async move {
            let mut was_connected = false;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                        debug!("Broker acknowledged connection: {:?}", ack.code);
                        if state_tx.send(ConnectionState::Connected).is_err() {
                            break;
                        }
                        if !was_connected {
                            was_connected = true;
                            if let Err(e) = events.send(TransferEvent::state_changed(true)).await {
                                warn!("Failed to deliver state event: {}", e);
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT event loop error: {}", e);
                        if state_tx.send(ConnectionState::Reconnecting).is_err() {
                            break;
                        }
                        if was_connected {
                            was_connected = false;
                            if let Err(e) = events.send(TransferEvent::state_changed(false)).await {
                                warn!("Failed to deliver state event: {}", e);
                            }
                        }
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
            debug!("MQTT event loop task finished");
        });

        Ok(Self {
            client,
            state_rx,
            eventloop_handle,
        })
    }

    /// Watch cell mirroring the connection lifecycle
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Cheap cloneable adapter for the transfer orchestrator
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
        }
    }

    /// Sends the MQTT disconnect and stops the event-loop task
    pub async fn disconnect(self) -> Result<(), TransferError> {
        self.client.disconnect().await?;
        self.eventloop_handle.abort();
        info!("Disconnected from broker");
        Ok(())
    }
}

/// [`ChunkPublisher`] backed by the rumqttc client
///
/// Publishes at QoS 1, not retained.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl ChunkPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransferError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }
}

fn client_id() -> String {
    format!("mqtt-filetransfer-{}", Uuid::new_v4())
}

fn mqtt_options(config: &BrokerConfig) -> Result<MqttOptions, TransferError> {
    // For websocket transports rumqttc takes the full URI as the broker
    // address; the port argument is unused there.
    let mut options = if config.scheme.uses_websocket() {
        MqttOptions::new(client_id(), config.server_uri(), config.port)
    } else {
        MqttOptions::new(client_id(), config.host.clone(), config.port)
    };

    options.set_keep_alive(Duration::from_secs(5));
    options.set_clean_session(true);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.clone(), password.clone());
    }

    let transport = match (config.scheme.uses_websocket(), config.scheme.uses_tls()) {
        (false, false) => Transport::Tcp,
        (false, true) => Transport::Tls(tls_configuration(config)?),
        (true, false) => Transport::Ws,
        (true, true) => Transport::Wss(tls_configuration(config)?),
    };
    options.set_transport(transport);

    Ok(options)
}

fn tls_configuration(config: &BrokerConfig) -> Result<TlsConfiguration, TransferError> {
    let ca_file = config.ca_file.as_ref().ok_or_else(|| {
        TransferError::Config(format!(
            "{} broker requires a ca_file in the broker configuration",
            config.scheme
        ))
    })?;
    let ca = std::fs::read(ca_file)?;
    Ok(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: None,
    })
}
