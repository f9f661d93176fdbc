//! # MQTT Integration Module
//!
//! Binds the chunked transfer core to a real broker through the `rumqttc`
//! client library. Everything protocol-shaped lives in the library: the wire
//! codec, QoS delivery, keep-alive, TLS and WebSocket transports, and
//! re-dialing a lost connection on the next event-loop poll. This module
//! only builds the client from a connection descriptor and adapts it to the
//! [`ChunkPublisher`](crate::transfer::ChunkPublisher) capability the
//! orchestrator consumes.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── config.rs     - scheme and broker descriptor (mqtt/mqtts/ws/wss)
//! └── connection.rs - client construction, event-loop task, state cell,
//!                     MqttPublisher adapter
//! ```
//!
//! ## Connection State
//!
//! Connect and disconnect callbacks arrive on the event-loop task while
//! publishes run on the caller's task. The lifecycle is therefore mirrored
//! into a `tokio::sync::watch` cell instead of a plain flag, giving readers
//! a synchronized snapshot and host layers a change stream.

pub mod config;
pub mod connection;

pub use config::{BrokerConfig, Scheme};
pub use connection::{ConnectionState, MqttConnection, MqttPublisher};
