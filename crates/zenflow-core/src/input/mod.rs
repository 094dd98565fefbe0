//! Typed input commands.
//!
//! A [`Command`](crate::Command) is a loose envelope.  The types in this
//! module are its strict counterparts: converting with `TryFrom<&Command>`
//! validates the action name and field values and fills in documented
//! defaults.
//!
//! # Defaults
//!
//! | Field              | Default  |
//! |--------------------|----------|
//! | coordinates        | `0`      |
//! | `button`           | `"left"` |
//! | `scroll_direction` | `"up"`   |
//! | `scroll_amount`    | `3`      |

pub mod keyboard;
pub mod mouse;

use serde_json::Value;
use thiserror::Error;

use crate::protocol::command::Command;

pub use keyboard::{KeyAction, KeyboardCommand};
pub use mouse::{MouseButton, MouseCommand, ScrollDirection};

/// Reasons a known-category command is rejected before reaching the injector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The action is not defined for this category.
    #[error("Unknown {category} action: {action}")]
    UnknownAction { category: String, action: String },

    /// The `button` field is not one of `left`, `right`, `middle`.
    #[error("Invalid button type: {0}")]
    InvalidButton(String),

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong JSON type.
    #[error("Invalid value for field {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Reads an integer field, accepting JSON integers and floats.
///
/// Floats are rounded to the nearest integer and saturate at the `i32` range.
/// An absent (or `null`) field yields `default`.
pub(crate) fn int_field(
    command: &Command,
    field: &'static str,
    default: i32,
) -> Result<i32, ValidationError> {
    match command.field(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|f| f.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
            .ok_or_else(|| ValidationError::InvalidField {
                field,
                value: n.to_string(),
            }),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

/// Returns `true` if the field is present and not `null`.
pub(crate) fn has_field(command: &Command, field: &str) -> bool {
    !matches!(command.field(field), None | Some(Value::Null))
}

/// Reads a required string field.
pub(crate) fn required_str(command: &Command, field: &'static str) -> Result<String, ValidationError> {
    match command.field(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

/// Reads an optional string field, falling back to `default`.
pub(crate) fn str_field(
    command: &Command,
    field: &'static str,
    default: &str,
) -> Result<String, ValidationError> {
    match command.field(field) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}
