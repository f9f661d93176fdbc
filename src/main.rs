pub mod config;
pub mod mqtt;
pub mod service;
pub mod transfer;

use crate::config::AppConfig;
use crate::service::TransferService;
use crate::transfer::events::TransferEvent;
use crate::transfer::orchestrator::SendFileRequest;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

struct CliArgs {
    file_path: PathBuf,
    topic: String,
    chunk_index: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let args = parse_args()?;
    let app_config = AppConfig::load_or_default().await?;

    let (event_tx, mut event_rx) = mpsc::channel(100);
    let handle = TransferService::spawn(event_tx);

    info!(
        "Initializing MQTT connection to {}",
        app_config.broker.server_uri()
    );
    handle.initialize(app_config.broker.clone()).await?;
    wait_for_connection(&mut event_rx, Duration::from_secs(10)).await?;

    let event_logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                TransferEvent::Progress { progress, .. } => {
                    info!("Transfer progress: {}", progress);
                }
                TransferEvent::StateChanged { connected, .. } => {
                    info!("Connection state changed: connected={}", connected);
                }
            }
        }
    });

    let request = SendFileRequest {
        file_path: args.file_path,
        encoding: app_config.transfer.encoding.clone(),
        topic: args.topic,
        chunk_size: app_config.transfer.chunk_size,
        chunk_index: args.chunk_index,
    };
    handle.send_file(request).await?;

    handle.shutdown().await;
    event_logger.abort();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let file_path = args.next().map(PathBuf::from);
    let topic = args.next();
    let chunk_index = match args.next() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| eyre!("Chunk index must be a non-negative integer: {}", raw))?,
        ),
        None => None,
    };

    match (file_path, topic) {
        (Some(file_path), Some(topic)) => Ok(CliArgs {
            file_path,
            topic,
            chunk_index,
        }),
        _ => Err(eyre!(
            "Usage: mqtt-filetransfer <file> <topic> [chunk-index]"
        )),
    }
}

async fn wait_for_connection(
    events: &mut mpsc::Receiver<TransferEvent>,
    timeout: Duration,
) -> Result<()> {
    let connected = tokio::time::timeout(timeout, async {
        while let Some(event) = events.recv().await {
            if let TransferEvent::StateChanged {
                connected: true, ..
            } = event
            {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if connected {
        info!("Connected to broker");
        Ok(())
    } else {
        Err(eyre!("Timed out waiting for the broker connection"))
    }
}
