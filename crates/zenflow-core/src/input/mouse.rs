//! Mouse commands.
//!
//! | Action         | Fields                                   |
//! |----------------|------------------------------------------|
//! | `move`         | `x`, `y` (absolute) or `deltaX`, `deltaY` |
//! | `click`        | `x`, `y`, `button`                       |
//! | `left_click`   | `x`, `y`                                 |
//! | `right_click`  | `x`, `y`                                 |
//! | `double_click` | `x`, `y`, `button`                       |
//! | `scroll`       | `x`, `y`, `scroll_direction`, `scroll_amount` |
//! | `drag`         | `start_x`, `start_y`, `end_x`, `end_y`   |

use std::fmt;
use std::str::FromStr;

use crate::input::{has_field, int_field, str_field, ValidationError};
use crate::protocol::command::Command;

/// Default number of scroll notches.
pub const DEFAULT_SCROLL_AMOUNT: i32 = 3;

/// A mouse button accepted by click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

impl FromStr for MouseButton {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" => Ok(Self::Middle),
            other => Err(ValidationError::InvalidButton(other.to_string())),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scroll direction.  Only the literal `"up"` scrolls up; every other value
/// scrolls down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn from_name(name: &str) -> Self {
        if name == "up" {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Applies the direction's sign to a scroll amount.
    pub fn signed(&self, amount: i32) -> i32 {
        match self {
            Self::Up => amount,
            Self::Down => amount.saturating_neg(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// A validated mouse command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MouseCommand {
    /// Move to an absolute screen position.
    Move { x: i32, y: i32 },
    /// Move by a relative offset (touchpad-style).
    MoveRelative { dx: i32, dy: i32 },
    Click { x: i32, y: i32, button: MouseButton },
    DoubleClick { x: i32, y: i32, button: MouseButton },
    Scroll {
        x: i32,
        y: i32,
        direction: ScrollDirection,
        amount: i32,
    },
    Drag {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
    },
}

impl MouseCommand {
    /// Signed scroll magnitude: positive for up, negative otherwise.
    pub fn scroll_magnitude(&self) -> Option<i32> {
        match self {
            Self::Scroll {
                direction, amount, ..
            } => Some(direction.signed(*amount)),
            _ => None,
        }
    }

    /// Relative displacement `(end - start)` for a drag.
    pub fn drag_displacement(&self) -> Option<(i32, i32)> {
        match self {
            Self::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
            } => Some((
                end_x.saturating_sub(*start_x),
                end_y.saturating_sub(*start_y),
            )),
            _ => None,
        }
    }

    /// Human-readable description used in acknowledgement messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Move { x, y } => format!("Mouse moved to ({x}, {y})"),
            Self::MoveRelative { dx, dy } => format!("Mouse moved by ({dx}, {dy})"),
            Self::Click { x, y, button } => format!("{button} click at ({x}, {y})"),
            Self::DoubleClick { x, y, button } => format!("{button} double click at ({x}, {y})"),
            Self::Scroll {
                direction, amount, ..
            } => format!("Scrolled {} by {amount}", direction.as_str()),
            Self::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
            } => format!("Dragged from ({start_x}, {start_y}) to ({end_x}, {end_y})"),
        }
    }
}

fn button_field(command: &Command, default: &str) -> Result<MouseButton, ValidationError> {
    match str_field(command, "button", default) {
        Ok(name) => name.parse(),
        Err(ValidationError::InvalidField { value, .. }) => Err(ValidationError::InvalidButton(value)),
        Err(e) => Err(e),
    }
}

impl TryFrom<&Command> for MouseCommand {
    type Error = ValidationError;

    fn try_from(command: &Command) -> Result<Self, Self::Error> {
        let xy = |c: &Command| -> Result<(i32, i32), ValidationError> {
            Ok((int_field(c, "x", 0)?, int_field(c, "y", 0)?))
        };

        match command.action() {
            "move" => {
                let absolute = has_field(command, "x") || has_field(command, "y");
                let relative = has_field(command, "deltaX") || has_field(command, "deltaY");
                if relative && !absolute {
                    Ok(Self::MoveRelative {
                        dx: int_field(command, "deltaX", 0)?,
                        dy: int_field(command, "deltaY", 0)?,
                    })
                } else {
                    let (x, y) = xy(command)?;
                    Ok(Self::Move { x, y })
                }
            }
            "click" => {
                let (x, y) = xy(command)?;
                let button = button_field(command, "left")?;
                Ok(Self::Click { x, y, button })
            }
            "left_click" => {
                let (x, y) = xy(command)?;
                Ok(Self::Click {
                    x,
                    y,
                    button: MouseButton::Left,
                })
            }
            "right_click" => {
                let (x, y) = xy(command)?;
                Ok(Self::Click {
                    x,
                    y,
                    button: MouseButton::Right,
                })
            }
            "double_click" => {
                let (x, y) = xy(command)?;
                let button = button_field(command, "left")?;
                Ok(Self::DoubleClick { x, y, button })
            }
            "scroll" => {
                let (x, y) = xy(command)?;
                let direction =
                    ScrollDirection::from_name(&str_field(command, "scroll_direction", "up")?);
                let amount = int_field(command, "scroll_amount", DEFAULT_SCROLL_AMOUNT)?;
                Ok(Self::Scroll {
                    x,
                    y,
                    direction,
                    amount,
                })
            }
            "drag" => Ok(Self::Drag {
                start_x: int_field(command, "start_x", 0)?,
                start_y: int_field(command, "start_y", 0)?,
                end_x: int_field(command, "end_x", 0)?,
                end_y: int_field(command, "end_y", 0)?,
            }),
            other => Err(ValidationError::UnknownAction {
                category: "mouse".to_string(),
                action: other.to_string(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
