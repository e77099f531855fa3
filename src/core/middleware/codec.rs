//! Session payload codecs.
//!
//! Turns the session mapping into the plaintext that goes inside the token,
//! and back.

use crate::config::{Result, SessionError};
use serde_json::{Map, Value};

/// Session contents: a string-keyed JSON object.
pub type SessionData = Map<String, Value>;

/// Converts session data to and from bytes.
pub trait SessionCodec: Send + Sync {
    /// Encodes the session into the token plaintext.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Codec` if the data cannot be represented.
    fn encode(&self, data: &SessionData) -> Result<Vec<u8>>;

    /// Decodes token plaintext back into a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Codec` if the bytes are not a valid session.
    fn decode(&self, data: &[u8]) -> Result<SessionData>;
}

/// Compact UTF-8 JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl SessionCodec for JsonCodec {
    fn encode(&self, data: &SessionData) -> Result<Vec<u8>> {
        serde_json::to_vec(data).map_err(|e| SessionError::Codec(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<SessionData> {
        let text = std::str::from_utf8(data).map_err(|e| SessionError::Codec(e.to_string()))?;
        let value: Value =
            serde_json::from_str(text).map_err(|e| SessionError::Codec(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(SessionError::Codec(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}
