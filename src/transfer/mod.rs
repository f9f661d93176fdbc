//! # Chunked File Transfer Core
//!
//! Implements the engine that slices a file into chunks, encodes each chunk
//! and hands it to a publisher, reporting progress along the way. The module
//! owns no MQTT specifics at all; everything broker-related sits behind the
//! [`ChunkPublisher`](orchestrator::ChunkPublisher) capability so that one
//! orchestrator serves any client backend (and plain mocks in tests).
//!
//! ## Module Architecture
//!
//! ```text
//! transfer/
//! ├── chunk.rs        - chunk planning (windows over the file)
//! ├── encoder.rs      - wire encodings for chunk payloads
//! ├── events.rs       - progress / state-change events for the host layer
//! ├── error.rs        - error definitions
//! └── orchestrator.rs - sequential transfer driver over ChunkPublisher
//! ```
//!
//! A transfer proceeds strictly sequentially on the calling task; chunks are
//! fired without waiting for broker acknowledgment, and a lost connection
//! surfaces through the state-change event rather than failing an in-flight
//! publish.

pub mod chunk;
pub mod encoder;
pub mod error;
pub mod events;
pub mod orchestrator;

pub use chunk::{ChunkPlan, ChunkWindow};
pub use encoder::PayloadEncoding;
pub use error::TransferError;
pub use events::{TransferEvent, TransferProgress};
pub use orchestrator::{ChunkPublisher, SendFileRequest, TransferOrchestrator};
