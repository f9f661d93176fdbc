//! Transfer service worker and its handle
//!
//! The host-facing surface of the crate: initialize a broker connection,
//! send a file, publish a test message, read the connection status. The
//! service runs as a single worker task that owns the connection; callers
//! talk to it through [`TransferHandle`] with oneshot-acknowledged actions,
//! so connection ownership never crosses task boundaries.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::mqtt::config::BrokerConfig;
use crate::mqtt::connection::{MqttConnection, MqttPublisher};
use crate::transfer::error::TransferError;
use crate::transfer::events::TransferEvent;
use crate::transfer::orchestrator::{SendFileRequest, TransferOrchestrator};

/// Actions processed by the service worker
pub enum ServiceAction {
    Initialize {
        broker: BrokerConfig,
        response_tx: oneshot::Sender<Result<bool, TransferError>>,
    },
    SendFile {
        request: SendFileRequest,
        response_tx: oneshot::Sender<Result<bool, TransferError>>,
    },
    PublishTestMessage {
        topic: String,
        response_tx: oneshot::Sender<Result<bool, TransferError>>,
    },
    ConnectionStatus {
        response_tx: oneshot::Sender<bool>,
    },
}

macro_rules! respond {
    ($result:expr, $response_tx:expr) => {
        if $response_tx.send($result).is_err() {
            error!("Failed to send response, caller went away");
        }
    };
}

pub struct TransferService {
    connection: Option<MqttConnection>,
    events: mpsc::Sender<TransferEvent>,
}

impl TransferService {
    /// Spawns the worker task and returns the handle callers use
    pub fn spawn(events: mpsc::Sender<TransferEvent>) -> TransferHandle {
        let (tx, mut rx) = mpsc::channel::<ServiceAction>(32);
        let worker_handle = tokio::spawn(async move {
            let mut service = TransferService {
                connection: None,
                events,
            };
            while let Some(action) = rx.recv().await {
                service.handle_action(action).await;
            }
            if let Some(connection) = service.connection.take() {
                if let Err(e) = connection.disconnect().await {
                    warn!("Failed to close connection on shutdown: {}", e);
                }
            }
            debug!("Transfer service worker finished");
        });

        TransferHandle { tx, worker_handle }
    }

    async fn handle_action(&mut self, action: ServiceAction) {
        match action {
            ServiceAction::Initialize {
                broker,
                response_tx,
            } => {
                respond!(self.initialize(broker).await, response_tx);
            }
            ServiceAction::SendFile {
                request,
                response_tx,
            } => {
                respond!(self.send_file(&request).await, response_tx);
            }
            ServiceAction::PublishTestMessage { topic, response_tx } => {
                respond!(self.publish_test_message(&topic).await, response_tx);
            }
            ServiceAction::ConnectionStatus { response_tx } => {
                let connected = self
                    .connection
                    .as_ref()
                    .is_some_and(MqttConnection::is_connected);
                respond!(connected, response_tx);
            }
        }
    }

    async fn initialize(&mut self, broker: BrokerConfig) -> Result<bool, TransferError> {
        if let Some(previous) = self.connection.take() {
            if let Err(e) = previous.disconnect().await {
                warn!("Failed to close previous connection: {}", e);
            }
        }
        let connection = MqttConnection::connect(&broker, self.events.clone())?;
        self.connection = Some(connection);
        Ok(true)
    }

    fn orchestrator(&self) -> Result<TransferOrchestrator<MqttPublisher>, TransferError> {
        let connection = self.connection.as_ref().ok_or(TransferError::NotConnected)?;
        Ok(TransferOrchestrator::new(
            connection.publisher(),
            connection.state(),
            self.events.clone(),
        ))
    }

    async fn send_file(&self, request: &SendFileRequest) -> Result<bool, TransferError> {
        self.orchestrator()?.send_file(request).await?;
        Ok(true)
    }

    async fn publish_test_message(&self, topic: &str) -> Result<bool, TransferError> {
        self.orchestrator()?.publish_test_message(topic).await?;
        Ok(true)
    }
}

/// Caller-side handle to the service worker
pub struct TransferHandle {
    tx: mpsc::Sender<ServiceAction>,
    worker_handle: JoinHandle<()>,
}

impl TransferHandle {
    /// Opens a connection to the given broker, replacing any previous one
    pub async fn initialize(&self, broker: BrokerConfig) -> Result<bool, TransferError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceAction::Initialize {
            broker,
            response_tx,
        })
        .await?;
        Self::await_response(response_rx).await?
    }

    /// Transfers a file per the request; `true` when every publish was handed
    /// to the client
    pub async fn send_file(&self, request: SendFileRequest) -> Result<bool, TransferError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceAction::SendFile {
            request,
            response_tx,
        })
        .await?;
        Self::await_response(response_rx).await?
    }

    pub async fn publish_test_message(&self, topic: &str) -> Result<bool, TransferError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(ServiceAction::PublishTestMessage {
            topic: topic.to_string(),
            response_tx,
        })
        .await?;
        Self::await_response(response_rx).await?
    }

    /// Snapshot of the broker link; `false` when the worker is unreachable
    pub async fn connection_status(&self) -> bool {
        let (response_tx, response_rx) = oneshot::channel();
        if self
            .send(ServiceAction::ConnectionStatus { response_tx })
            .await
            .is_err()
        {
            return false;
        }
        response_rx.await.unwrap_or(false)
    }

    /// Stops the worker after the current action and closes the connection
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            warn!("Transfer service worker ended abnormally: {}", e);
        }
    }

    async fn send(&self, action: ServiceAction) -> Result<(), TransferError> {
        self.tx
            .send(action)
            .await
            .map_err(|e| TransferError::Channel(format!("Transfer service unavailable: {}", e)))
    }

    async fn await_response<T>(response_rx: oneshot::Receiver<T>) -> Result<T, TransferError> {
        response_rx
            .await
            .map_err(|e| TransferError::Channel(format!("Transfer service dropped response: {}", e)))
    }
}
