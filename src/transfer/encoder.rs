//! Payload encoding for published chunks

use base64::{engine::general_purpose, Engine as _};

use super::error::TransferError;

/// Wire encoding applied to each chunk before publishing
///
/// Encoding names are matched case-insensitively; anything other than
/// "base64" or "utf8" passes the bytes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Base64,
    Utf8,
    Passthrough,
}

impl PayloadEncoding {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "base64" => Self::Base64,
            "utf8" => Self::Utf8,
            _ => Self::Passthrough,
        }
    }

    /// Encodes a chunk for publishing
    ///
    /// Base64 uses the standard alphabet without line wrapping. Utf8 fails
    /// with `EncodingFailed` when the bytes are not valid UTF-8.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>, TransferError> {
        match self {
            Self::Base64 => Ok(general_purpose::STANDARD.encode(data).into_bytes()),
            Self::Utf8 => match std::str::from_utf8(data) {
                Ok(text) => Ok(text.as_bytes().to_vec()),
                Err(_) => Err(TransferError::EncodingFailed),
            },
            Self::Passthrough => Ok(data.to_vec()),
        }
    }
}
