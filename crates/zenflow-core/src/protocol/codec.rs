//! JSON frame codec.
//!
//! Wire format: one self-contained JSON document per transport frame.  The
//! transport (WebSocket) owns frame boundaries, so the codec never has to
//! look for delimiters or length prefixes.
//!
//! ```text
//! inbound:  {"type": <category>, "action": <string>, "data": {...}}
//! outbound: {"type": "response"|"pong"|"error", "action": ..., "status": ...,
//!            "message": ..., "data": ..., "timestamp": <ISO-8601>}
//! ```

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::protocol::command::Command;
use crate::protocol::response::Response;

/// Errors that can occur while decoding an inbound frame.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The frame is not valid JSON.
    #[error("invalid JSON syntax: {0}")]
    InvalidSyntax(String),

    /// The frame is valid JSON but its top level is not an object.
    #[error("malformed command: {0}")]
    MalformedCommand(String),
}

/// Errors that can occur while encoding an outbound frame.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Decodes a text frame into a [`Command`].
///
/// # Errors
///
/// Returns [`DecodeError::InvalidSyntax`] for malformed JSON and
/// [`DecodeError::MalformedCommand`] for a non-object document.
///
/// # Example
///
/// ```rust
/// use zenflow_core::{decode_command, Category};
///
/// let cmd = decode_command(r#"{"type":"mouse","action":"move","data":{"x":1,"y":2}}"#).unwrap();
/// assert_eq!(cmd.category(), &Category::Mouse);
/// ```
pub fn decode_command(frame: &str) -> Result<Command, DecodeError> {
    let value: Value = serde_json::from_str(frame).map_err(|e| {
        trace!(len = frame.len(), "rejecting frame with invalid JSON: {e}");
        DecodeError::InvalidSyntax(e.to_string())
    })?;
    Command::from_value(value)
}

/// Decodes a raw byte frame into a [`Command`].
///
/// # Errors
///
/// Same as [`decode_command`]; invalid UTF-8 is reported as
/// [`DecodeError::InvalidSyntax`].
pub fn decode_command_bytes(frame: &[u8]) -> Result<Command, DecodeError> {
    let value: Value =
        serde_json::from_slice(frame).map_err(|e| DecodeError::InvalidSyntax(e.to_string()))?;
    Command::from_value(value)
}

/// Encodes a [`Response`] into a text frame.
///
/// # Errors
///
/// Returns [`EncodeError::Serialize`] if serialization fails.
pub fn encode_response(response: &Response) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(response)?)
}

/// Decodes a text frame produced by [`encode_response`].
///
/// Used by clients and tests; the server itself never reads responses.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidSyntax`] if the frame is not a valid
/// response document.
pub fn decode_response(frame: &str) -> Result<Response, DecodeError> {
    serde_json::from_str(frame).map_err(|e| DecodeError::InvalidSyntax(e.to_string()))
}

/// Encodes a [`Command`] into a text frame (its original JSON document).
///
/// # Errors
///
/// Returns [`EncodeError::Serialize`] if serialization fails.
pub fn encode_command(command: &Command) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(command.document())?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::Category;
    use crate::protocol::response::ResponseKind;
    use serde_json::json;

    #[test]
    fn test_decode_command_invalid_json_is_invalid_syntax() {
        let result = decode_command("{not json");
        assert!(matches!(result, Err(DecodeError::InvalidSyntax(_))));
    }

    #[test]
    fn test_decode_command_empty_frame_is_invalid_syntax() {
        assert!(matches!(
            decode_command(""),
            Err(DecodeError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_decode_command_scalar_is_malformed_command() {
        assert!(matches!(
            decode_command("42"),
            Err(DecodeError::MalformedCommand(_))
        ));
    }

    #[test]
    fn test_decode_command_bytes_rejects_invalid_utf8() {
        let result = decode_command_bytes(&[0xFF, 0xFE, b'{']);
        assert!(matches!(result, Err(DecodeError::InvalidSyntax(_))));
    }

    #[test]
    fn test_decode_command_bytes_accepts_valid_frame() {
        let cmd = decode_command_bytes(br#"{"type":"ping","action":"keepalive"}"#).unwrap();
        assert_eq!(cmd.category(), &Category::KeepalivePing);
        assert_eq!(cmd.action(), "keepalive");
    }

    #[test]
    fn test_encode_command_round_trips_document() {
        // Arrange
        let frame = r#"{"type":"gamepad","action":"rumble","data":{"strength":0.5}}"#;
        let cmd = decode_command(frame).unwrap();

        // Act
        let encoded = encode_command(&cmd).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        // Assert
        assert_eq!(
            reparsed,
            json!({"type":"gamepad","action":"rumble","data":{"strength":0.5}})
        );
    }

    #[test]
    fn test_encode_then_decode_response_preserves_kind_and_fields() {
        for original in [
            Response::ack("keyboard_ack", "Key combo: ctrl+c"),
            Response::error("Invalid button type").with_action("mouse_ack"),
            Response::keepalive_pong(),
            Response::test_pong(json!({"echo_data": {"client": "android"}})),
            Response::echo(json!({"type": "x", "data": [1, 2]})),
        ] {
            let decoded = decode_response(&encode_response(&original).unwrap()).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_decode_response_error_kind_from_wire() {
        let r = decode_response(
            r#"{"type":"error","message":"Invalid JSON format","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.message.as_deref(), Some("Invalid JSON format"));
    }
}
