//! Keyboard commands.
//!
//! | Action    | Required field |
//! |-----------|----------------|
//! | `press`   | `key`          |
//! | `release` | `key`          |
//! | `type`    | `text`         |
//! | `combo`   | `combination`  |
//!
//! Key names and combinations (e.g. `"ctrl+c"`, `"media_play_pause"`) are
//! passed through to the injector untouched.

use crate::input::{required_str, ValidationError};
use crate::protocol::command::Command;

/// Whether a key goes down or comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

impl KeyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Press => "press",
            Self::Release => "release",
        }
    }
}

/// A validated keyboard command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardCommand {
    Key { key: String, action: KeyAction },
    Type { text: String },
    Combo { combination: String },
}

impl KeyboardCommand {
    /// Human-readable description used in acknowledgement messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Key { key, action } => format!("Key {}: {key}", action.as_str()),
            Self::Type { text } => format!("Text typed: {text}"),
            Self::Combo { combination } => format!("Key combo: {combination}"),
        }
    }
}

impl TryFrom<&Command> for KeyboardCommand {
    type Error = ValidationError;

    fn try_from(command: &Command) -> Result<Self, Self::Error> {
        match command.action() {
            "press" => Ok(Self::Key {
                key: required_str(command, "key")?,
                action: KeyAction::Press,
            }),
            "release" => Ok(Self::Key {
                key: required_str(command, "key")?,
                action: KeyAction::Release,
            }),
            "type" => Ok(Self::Type {
                text: required_str(command, "text")?,
            }),
            "combo" => Ok(Self::Combo {
                combination: required_str(command, "combination")?,
            }),
            other => Err(ValidationError::UnknownAction {
                category: "keyboard".to_string(),
                action: other.to_string(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn keyboard(doc: Value) -> Result<KeyboardCommand, ValidationError> {
        KeyboardCommand::try_from(&Command::from_value(doc).unwrap())
    }

    #[test]
    fn test_press_reads_key_from_data() {
        assert_eq!(
            keyboard(json!({"type": "keyboard", "action": "press", "data": {"key": "a"}})),
            Ok(KeyboardCommand::Key {
                key: "a".to_string(),
                action: KeyAction::Press
            })
        );
    }

    #[test]
    fn test_release_reads_key_from_top_level() {
        assert_eq!(
            keyboard(json!({"type": "keyboard", "action": "release", "key": "shift"})),
            Ok(KeyboardCommand::Key {
                key: "shift".to_string(),
                action: KeyAction::Release
            })
        );
    }

    #[test]
    fn test_type_accepts_empty_text() {
        assert_eq!(
            keyboard(json!({"type": "keyboard", "action": "type", "data": {"text": ""}})),
            Ok(KeyboardCommand::Type {
                text: String::new()
            })
        );
    }

    #[test]
    fn test_combo_missing_combination_is_rejected() {
        assert_eq!(
            keyboard(json!({"type": "keyboard", "action": "combo"})),
            Err(ValidationError::MissingField("combination"))
        );
    }

    #[test]
    fn test_unknown_keyboard_action_is_rejected() {
        let err = keyboard(json!({"type": "keyboard", "action": "smash"})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown keyboard action: smash");
    }

    #[test]
    fn test_describe_combo_contains_combination() {
        let cmd = KeyboardCommand::Combo {
            combination: "media_play_pause".to_string(),
        };
        assert_eq!(cmd.describe(), "Key combo: media_play_pause");
    }
}
