//! Error definitions for the transfer module

use std::path::PathBuf;
use thiserror::Error;

/// Error types for chunked file transfers
#[derive(Debug, Error)]
pub enum TransferError {
    /// The broker URI scheme is not one of the supported schemes
    #[error("Invalid scheme: {0}. Use 'mqtt', 'mqtts', 'ws', or 'wss'.")]
    InvalidScheme(String),

    /// A publish was attempted without an established broker connection
    #[error("MQTT client is not connected")]
    NotConnected,

    /// The file to transfer does not exist
    #[error("File not found at {0}")]
    FileNotFound(PathBuf),

    /// The requested chunk index lies past the end of the file
    #[error("Requested chunk {index} is out of range for a {file_size} byte file")]
    InvalidChunkRange { index: u64, file_size: u64 },

    /// The chunk bytes could not be represented in the requested encoding
    #[error("Failed to apply the requested encoding")]
    EncodingFailed,

    /// Chunk size must be a positive number of bytes
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    /// I/O failure while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The MQTT client rejected an operation
    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Communication with the transfer service worker failed
    #[error("Channel error: {0}")]
    Channel(String),

    /// Broker or application configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}
