//! JSON serialization for the real-time channel.
//!
//! Events travel as JSON text frames; these helpers wrap `serde_json` with
//! a typed error so transport code can log and skip malformed frames
//! without string-matching serde messages.

use crate::event::BoardEvent;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// Deserialization failed (malformed frame or unknown event tag).
    #[error("decode error: {0}")]
    Decode(String),
}

/// Encodes a [`BoardEvent`] into the JSON text of one channel frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the event cannot be serialized.
pub fn encode_event(event: &BoardEvent) -> Result<String, CodecError> {
    serde_json::to_string(event).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decodes a [`BoardEvent`] from the JSON text of one channel frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the text is not a valid event.
pub fn decode_event(text: &str) -> Result<BoardEvent, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
}
