//! The inbound command envelope.
//!
//! Every inbound frame is a JSON object of the form
//!
//! ```json
//! {"type": "mouse", "action": "click", "data": {"x": 10, "y": 20, "button": "left"}}
//! ```
//!
//! [`Command`] keeps the decoded envelope exactly as the client sent it.  It
//! does not reject unknown categories or actions: an unrecognised `type` is
//! preserved as [`Category::Unknown`] so the dispatcher can echo it back.
//! Strict, typed validation happens later in [`crate::input`].
//!
//! # Category aliases
//!
//! | Category        | Accepted `type` values        |
//! |-----------------|-------------------------------|
//! | `Mouse`         | `mouse`                       |
//! | `Keyboard`      | `keyboard`                    |
//! | `TestPing`      | `test`, `test-ping`           |
//! | `KeepalivePing` | `ping`, `keepalive-ping`      |
//!
//! The category may be supplied under either the `type` or the `category`
//! key; `type` wins when both are present.

use serde_json::{Map, Value};

use crate::protocol::codec::DecodeError;

/// Action reported when the client omits the `action` field.
pub const UNKNOWN_ACTION: &str = "unknown";

/// Category reported when the client omits both `type` and `category`.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// The category of an inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Pointer movement, clicks, scrolling and drags.
    Mouse,
    /// Key presses, text entry and key combinations.
    Keyboard,
    /// Connectivity probe from the client; answered with an echoing pong.
    TestPing,
    /// Application-level keep-alive; answered with a bare pong.
    KeepalivePing,
    /// Anything else.  The original `type` string is kept verbatim.
    Unknown(String),
}

impl Category {
    /// Maps a wire `type` string onto a category.  Never fails.
    pub fn parse(name: &str) -> Self {
        match name {
            "mouse" => Self::Mouse,
            "keyboard" => Self::Keyboard,
            "test" | "test-ping" => Self::TestPing,
            "ping" | "keepalive-ping" => Self::KeepalivePing,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the canonical wire name for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mouse => "mouse",
            Self::Keyboard => "keyboard",
            Self::TestPing => "test",
            Self::KeepalivePing => "ping",
            Self::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound message.
///
/// Immutable once constructed: all accessors borrow.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    category: Category,
    action: String,
    payload: Map<String, Value>,
    document: Map<String, Value>,
}

impl Command {
    /// Builds a command from its parts, synthesising the wire document.
    pub fn new(category: Category, action: impl Into<String>, payload: Map<String, Value>) -> Self {
        let action = action.into();
        let mut document = Map::new();
        document.insert("type".into(), Value::String(category.as_str().to_string()));
        document.insert("action".into(), Value::String(action.clone()));
        document.insert("data".into(), Value::Object(payload.clone()));
        Self {
            category,
            action,
            payload,
            document,
        }
    }

    /// Builds a command from an already-parsed JSON value.
    ///
    /// Only the top-level shape is checked.  Missing `type`/`category` yields
    /// [`Category::Unknown`]; missing `action` yields `"unknown"`; a missing or
    /// non-object `data` field yields an empty payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedCommand`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let document = match value {
            Value::Object(map) => map,
            other => {
                return Err(DecodeError::MalformedCommand(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let category = match document.get("type").or_else(|| document.get("category")) {
            Some(Value::String(name)) => Category::parse(name),
            Some(other) => Category::Unknown(other.to_string()),
            None => Category::Unknown(UNKNOWN_CATEGORY.to_string()),
        };

        let action = match document.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(other) => other.to_string(),
            None => UNKNOWN_ACTION.to_string(),
        };

        let payload = match document.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        };

        Ok(Self {
            category,
            action,
            payload,
            document,
        })
    }

    /// The command category.
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// The free-form action string, interpreted per category.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The `data` object, or an empty map if the client sent none.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// The complete JSON document as received.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Looks up a named field, checking `data` first and then the top level.
    ///
    /// The top-level fallback exists because some clients put keyboard fields
    /// (`key`, `text`, `combination`) beside `type` instead of inside `data`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name).or_else(|| match name {
            "type" | "category" | "action" | "data" => None,
            _ => self.document.get(name),
        })
    }

    /// Consumes the command and returns its JSON document.
    pub fn into_document(self) -> Value {
        Value::Object(self.document)
    }
}

/// Returns a short human-readable name for a JSON value's type.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parse_recognises_all_aliases() {
        assert_eq!(Category::parse("mouse"), Category::Mouse);
        assert_eq!(Category::parse("keyboard"), Category::Keyboard);
        assert_eq!(Category::parse("test"), Category::TestPing);
        assert_eq!(Category::parse("test-ping"), Category::TestPing);
        assert_eq!(Category::parse("ping"), Category::KeepalivePing);
        assert_eq!(Category::parse("keepalive-ping"), Category::KeepalivePing);
    }

    #[test]
    fn test_category_parse_preserves_unknown_names_verbatim() {
        assert_eq!(
            Category::parse("Gamepad"),
            Category::Unknown("Gamepad".to_string())
        );
    }

    #[test]
    fn test_from_value_reads_type_action_and_data() {
        // Arrange
        let value = json!({"type": "mouse", "action": "move", "data": {"x": 1, "y": 2}});

        // Act
        let cmd = Command::from_value(value).unwrap();

        // Assert
        assert_eq!(cmd.category(), &Category::Mouse);
        assert_eq!(cmd.action(), "move");
        assert_eq!(cmd.payload().get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_from_value_accepts_category_key_as_synonym_for_type() {
        let cmd = Command::from_value(json!({"category": "keyboard", "action": "type"})).unwrap();
        assert_eq!(cmd.category(), &Category::Keyboard);
    }

    #[test]
    fn test_from_value_prefers_type_over_category() {
        let cmd =
            Command::from_value(json!({"type": "mouse", "category": "keyboard", "action": "x"}))
                .unwrap();
        assert_eq!(cmd.category(), &Category::Mouse);
    }

    #[test]
    fn test_from_value_defaults_missing_fields() {
        // Arrange / Act
        let cmd = Command::from_value(json!({})).unwrap();

        // Assert
        assert_eq!(cmd.category(), &Category::Unknown("unknown".to_string()));
        assert_eq!(cmd.action(), "unknown");
        assert!(cmd.payload().is_empty());
    }

    #[test]
    fn test_from_value_non_string_type_is_unknown_category() {
        let cmd = Command::from_value(json!({"type": 7, "action": "x"})).unwrap();
        assert_eq!(cmd.category(), &Category::Unknown("7".to_string()));
    }

    #[test]
    fn test_from_value_rejects_non_object_documents() {
        // Arrange / Act
        let result = Command::from_value(json!([1, 2, 3]));

        // Assert
        assert!(matches!(result, Err(DecodeError::MalformedCommand(_))));
    }

    #[test]
    fn test_field_falls_back_to_top_level() {
        // Arrange: the keyboard key sits beside `type`, not inside `data`
        let cmd =
            Command::from_value(json!({"type": "keyboard", "action": "press", "key": "a"}))
                .unwrap();

        // Act / Assert
        assert_eq!(cmd.field("key"), Some(&json!("a")));
    }

    #[test]
    fn test_field_prefers_data_over_top_level() {
        let cmd = Command::from_value(
            json!({"type": "keyboard", "action": "press", "key": "outer", "data": {"key": "inner"}}),
        )
        .unwrap();
        assert_eq!(cmd.field("key"), Some(&json!("inner")));
    }

    #[test]
    fn test_field_never_returns_envelope_keys() {
        let cmd = Command::from_value(json!({"type": "mouse", "action": "move"})).unwrap();
        assert_eq!(cmd.field("type"), None);
        assert_eq!(cmd.field("action"), None);
    }

    #[test]
    fn test_new_synthesises_wire_document() {
        // Arrange
        let mut payload = Map::new();
        payload.insert("text".into(), json!("hi"));

        // Act
        let cmd = Command::new(Category::Keyboard, "type", payload);

        // Assert
        assert_eq!(
            cmd.into_document(),
            json!({"type": "keyboard", "action": "type", "data": {"text": "hi"}})
        );
    }
}
