//! Outbound response frames.
//!
//! On the wire a response looks like:
//!
//! ```json
//! {"type":"response","action":"mouse_ack","status":"success",
//!  "message":"left click at (10, 20)","timestamp":"2024-05-01T12:00:00Z"}
//! ```
//!
//! The wire `type` field only distinguishes `response`, `pong` and `error`.
//! Acks and echoes share `"type":"response"` and are told apart by
//! `"action":"echo"`, so [`Response`] (de)serializes through a private
//! [`ResponseFrame`] that performs that mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action name carried by echo responses.
pub const ECHO_ACTION: &str = "echo";

/// Action name carried by application keep-alive pongs.
pub const KEEPALIVE_ACTION: &str = "keepalive";

/// The logical kind of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// A command was carried out.
    Ack,
    /// Answer to a test ping or keep-alive ping.
    Pong,
    /// An unrecognised command reflected back verbatim.
    Echo,
    /// The command (or the frame carrying it) could not be processed.
    Error,
}

/// Outcome status carried by most responses.  Keep-alive pongs omit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResponseFrame", from = "ResponseFrame")]
pub struct Response {
    pub kind: ResponseKind,
    pub action: Option<String>,
    pub status: Option<Status>,
    pub message: Option<String>,
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl Response {
    /// A successful acknowledgement, e.g. `("mouse_ack", "Mouse moved to (1, 2)")`.
    pub fn ack(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Ack,
            action: Some(action.into()),
            status: Some(Status::Success),
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// An error response with no associated action.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Error,
            action: None,
            status: Some(Status::Error),
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// Answer to a test ping; `data` carries the echoed payload and server info.
    pub fn test_pong(data: Value) -> Self {
        Self {
            kind: ResponseKind::Pong,
            action: Some("response".to_string()),
            status: Some(Status::Success),
            message: Some("pong".to_string()),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    /// Answer to an application keep-alive: a timestamp and nothing else.
    pub fn keepalive_pong() -> Self {
        Self {
            kind: ResponseKind::Pong,
            action: Some(KEEPALIVE_ACTION.to_string()),
            status: None,
            message: None,
            data: None,
            timestamp: Utc::now(),
        }
    }

    /// Reflects an unrecognised document back to the client.
    pub fn echo(document: Value) -> Self {
        Self {
            kind: ResponseKind::Echo,
            action: Some(ECHO_ACTION.to_string()),
            status: Some(Status::Success),
            message: None,
            data: Some(document),
            timestamp: Utc::now(),
        }
    }

    /// Attaches an action name, e.g. to tag an error with `mouse_ack`.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Replaces the timestamp with the current time.
    ///
    /// Called immediately before a frame is written so the timestamp reflects
    /// send time rather than construction time.
    pub fn restamp(&mut self) {
        self.timestamp = Utc::now();
    }

    /// `true` unless the response reports an error.
    pub fn is_success(&self) -> bool {
        self.kind != ResponseKind::Error && self.status != Some(Status::Error)
    }
}

// ── Wire representation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FrameType {
    Response,
    Pong,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseFrame {
    #[serde(rename = "type")]
    frame_type: FrameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    timestamp: DateTime<Utc>,
}

impl From<Response> for ResponseFrame {
    fn from(r: Response) -> Self {
        let frame_type = match r.kind {
            ResponseKind::Ack | ResponseKind::Echo => FrameType::Response,
            ResponseKind::Pong => FrameType::Pong,
            ResponseKind::Error => FrameType::Error,
        };
        Self {
            frame_type,
            action: r.action,
            status: r.status,
            message: r.message,
            data: r.data,
            timestamp: r.timestamp,
        }
    }
}

impl From<ResponseFrame> for Response {
    fn from(f: ResponseFrame) -> Self {
        let kind = match f.frame_type {
            FrameType::Response if f.action.as_deref() == Some(ECHO_ACTION) => ResponseKind::Echo,
            FrameType::Response => ResponseKind::Ack,
            FrameType::Pong => ResponseKind::Pong,
            FrameType::Error => ResponseKind::Error,
        };
        Self {
            kind,
            action: f.action,
            status: f.status,
            message: f.message,
            data: f.data,
            timestamp: f.timestamp,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ack_serializes_as_response_type() {
        // Arrange
        let r = Response::ack("mouse_ack", "done");

        // Act
        let v = serde_json::to_value(&r).unwrap();

        // Assert
        assert_eq!(v["type"], "response");
        assert_eq!(v["action"], "mouse_ack");
        assert_eq!(v["status"], "success");
        assert_eq!(v["message"], "done");
        assert!(v.get("data").is_none());
    }

    #[test]
    fn test_keepalive_pong_has_only_type_action_and_timestamp() {
        let v = serde_json::to_value(Response::keepalive_pong()).unwrap();
        let obj = v.as_object().unwrap();

        assert_eq!(obj.len(), 3);
        assert_eq!(v["type"], "pong");
        assert_eq!(v["action"], "keepalive");
        assert!(obj.contains_key("timestamp"));
    }

    #[test]
    fn test_error_serializes_with_error_type_and_status() {
        let v = serde_json::to_value(Response::error("Invalid JSON format")).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["status"], "error");
        assert_eq!(v["message"], "Invalid JSON format");
        assert!(v.get("action").is_none());
    }

    #[test]
    fn test_echo_deserializes_back_to_echo_kind() {
        // Arrange
        let json = serde_json::to_string(&Response::echo(json!({"type": "x"}))).unwrap();

        // Act
        let back: Response = serde_json::from_str(&json).unwrap();

        // Assert
        assert_eq!(back.kind, ResponseKind::Echo);
        assert_eq!(back.data, Some(json!({"type": "x"})));
    }

    #[test]
    fn test_is_success_false_for_errors() {
        assert!(!Response::error("x").is_success());
        assert!(!Response::error("x").with_action("mouse_ack").is_success());
        assert!(Response::ack("a", "b").is_success());
        assert!(Response::keepalive_pong().is_success());
    }

    #[test]
    fn test_restamp_moves_timestamp_forward() {
        let mut r = Response::ack("a", "b");
        let before = r.timestamp;
        std::thread::sleep(std::time::Duration::from_millis(2));
        r.restamp();
        assert!(r.timestamp > before);
    }
}
