//! Broker connection configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::transfer::error::TransferError;

/// URI scheme selecting transport and TLS for the broker connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Mqtt,
    Mqtts,
    Ws,
    Wss,
}

impl Scheme {
    pub fn uses_tls(&self) -> bool {
        matches!(self, Scheme::Mqtts | Scheme::Wss)
    }

    pub fn uses_websocket(&self) -> bool {
        matches!(self, Scheme::Ws | Scheme::Wss)
    }
}

impl FromStr for Scheme {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mqtt" => Ok(Scheme::Mqtt),
            "mqtts" => Ok(Scheme::Mqtts),
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            other => Err(TransferError::InvalidScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Scheme::Mqtt => "mqtt",
            Scheme::Mqtts => "mqtts",
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        };
        write!(f, "{}", name)
    }
}

/// Everything needed to reach one broker
///
/// Immutable once a connection attempt starts; re-initializing builds a
/// fresh descriptor and a fresh connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// WebSocket endpoint path, only meaningful for ws/wss
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// CA certificate file for mqtts/wss brokers
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Mqtt,
            host: "localhost".to_string(),
            port: 1883,
            path: None,
            username: None,
            password: None,
            ca_file: None,
        }
    }
}

impl BrokerConfig {
    /// Full broker URI; ws/wss default the path to `/mqtt`
    pub fn server_uri(&self) -> String {
        if self.scheme.uses_websocket() {
            let path = self.path.as_deref().unwrap_or("/mqtt");
            format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}
