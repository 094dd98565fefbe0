//! Dispatcher: routes one decoded command to its handler.
//!
//! # Routing table
//!
//! | Category         | Action      | Handler                                  |
//! |------------------|-------------|------------------------------------------|
//! | `mouse`          | any         | validate → injector → `mouse_ack`        |
//! | `keyboard`       | any         | validate → injector → `keyboard_ack`     |
//! | `test`           | `ping`      | pong with server info and echoed data    |
//! | `ping`           | `keepalive` | bare pong with a timestamp               |
//! | anything else    |             | echo the original document back          |
//!
//! [`Dispatcher::dispatch`] is total: every input, including a panicking
//! injector, yields exactly one [`Response`].  Validation failures never
//! reach the injector.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use zenflow_core::{Category, Command, KeyboardCommand, MouseCommand, Response};

use crate::application::injector::{InjectorError, InputInjector};
use crate::domain::config::ServerConfig;

/// Action name of mouse acknowledgements.
pub const MOUSE_ACK: &str = "mouse_ack";

/// Action name of keyboard acknowledgements.
pub const KEYBOARD_ACK: &str = "keyboard_ack";

/// Action a `test` command must carry to be answered with a test pong.
pub const TEST_PING_ACTION: &str = "ping";

/// Action a `ping` command must carry to be answered with a keep-alive pong.
pub const KEEPALIVE_ACTION: &str = "keepalive";

/// Routes commands to handlers and builds the single response for each.
///
/// Shared between sessions behind an `Arc`; it holds no per-session state.
pub struct Dispatcher {
    injector: Arc<dyn InputInjector>,
    server_name: String,
    version: String,
    move_duration: Duration,
    drag_duration: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher that injects through `injector` and takes its
    /// server identity and animation timings from `config`.
    pub fn new(injector: Arc<dyn InputInjector>, config: &ServerConfig) -> Self {
        Self {
            injector,
            server_name: config.server_name.clone(),
            version: config.version.clone(),
            move_duration: config.move_duration,
            drag_duration: config.drag_duration,
        }
    }

    /// Handles one command and returns its response.
    ///
    /// Never panics: a panic raised by the injector is caught here and
    /// reported as a `Server error: ...` response.
    pub fn dispatch(&self, command: &Command) -> Response {
        match panic::catch_unwind(AssertUnwindSafe(|| self.route(command))) {
            Ok(response) => response,
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                error!(
                    category = %command.category(),
                    action = command.action(),
                    "handler panicked: {detail}"
                );
                Response::error(format!("Server error: {detail}"))
            }
        }
    }

    fn route(&self, command: &Command) -> Response {
        match command.category() {
            Category::Mouse => self.handle_mouse(command),
            Category::Keyboard => self.handle_keyboard(command),
            Category::TestPing if command.action() == TEST_PING_ACTION => self.test_pong(command),
            Category::KeepalivePing if command.action() == KEEPALIVE_ACTION => {
                Response::keepalive_pong()
            }
            other => {
                debug!(category = %other, action = command.action(), "echoing unrecognised command");
                Response::echo(Value::Object(command.document().clone()))
            }
        }
    }

    // ── Mouse ─────────────────────────────────────────────────────────────────

    fn handle_mouse(&self, command: &Command) -> Response {
        let mouse = match MouseCommand::try_from(command) {
            Ok(mouse) => mouse,
            Err(e) => {
                warn!(action = command.action(), "rejected mouse command: {e}");
                return Response::error(e.to_string()).with_action(MOUSE_ACK);
            }
        };

        match self.inject_mouse(&mouse) {
            Ok(()) => Response::ack(MOUSE_ACK, mouse.describe()),
            Err(e) => {
                warn!("mouse injection failed: {e}");
                Response::error(e.to_string()).with_action(MOUSE_ACK)
            }
        }
    }

    fn inject_mouse(&self, mouse: &MouseCommand) -> Result<(), InjectorError> {
        match *mouse {
            MouseCommand::Move { x, y } => self.injector.move_to(x, y, self.move_duration),
            MouseCommand::MoveRelative { dx, dy } => self.injector.move_relative(dx, dy),
            MouseCommand::Click { x, y, button } => self.injector.click(x, y, button),
            MouseCommand::DoubleClick { x, y, button } => {
                self.injector.click(x, y, button)?;
                self.injector.click(x, y, button)
            }
            MouseCommand::Scroll { x, y, direction, amount } => {
                self.injector.scroll(direction.signed(amount), x, y)
            }
            MouseCommand::Drag { .. } => {
                let (dx, dy) = mouse.drag_displacement().unwrap_or((0, 0));
                self.injector.drag_relative(dx, dy, self.drag_duration)
            }
        }
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    fn handle_keyboard(&self, command: &Command) -> Response {
        let keyboard = match KeyboardCommand::try_from(command) {
            Ok(keyboard) => keyboard,
            Err(e) => {
                warn!(action = command.action(), "rejected keyboard command: {e}");
                return Response::error(e.to_string()).with_action(KEYBOARD_ACK);
            }
        };

        let result = match &keyboard {
            KeyboardCommand::Key { key, action } => self.injector.key_action(key, *action),
            KeyboardCommand::Type { text } => self.injector.type_text(text),
            KeyboardCommand::Combo { combination } => self.injector.key_combo(combination),
        };

        match result {
            Ok(()) => Response::ack(KEYBOARD_ACK, keyboard.describe()),
            Err(e) => {
                warn!("keyboard injection failed: {e}");
                Response::error(e.to_string()).with_action(KEYBOARD_ACK)
            }
        }
    }

    // ── Test ping ─────────────────────────────────────────────────────────────

    fn test_pong(&self, command: &Command) -> Response {
        Response::test_pong(json!({
            "server": self.server_name,
            "version": self.version,
            "echo_data": Value::Object(command.payload().clone()),
            "server_time": Utc::now().to_rfc3339(),
        }))
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::injector::MockInputInjector;
    use mockall::predicate::eq;
    use zenflow_core::{decode_command, KeyAction, MouseButton, ResponseKind, Status};

    fn dispatcher(mock: MockInputInjector) -> Dispatcher {
        Dispatcher::new(Arc::new(mock), &ServerConfig::default())
    }

    fn command(frame: &str) -> Command {
        decode_command(frame).expect("test frame must decode")
    }

    #[test]
    fn test_scroll_down_injects_negative_amount_and_acks() {
        // Arrange
        let mut mock = MockInputInjector::new();
        mock.expect_scroll()
            .with(eq(-5), eq(10), eq(20))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let d = dispatcher(mock);

        // Act
        let r = d.dispatch(&command(
            r#"{"type":"mouse","action":"scroll","data":{"x":10,"y":20,"scroll_direction":"down","scroll_amount":5}}"#,
        ));

        // Assert
        assert_eq!(r.kind, ResponseKind::Ack);
        assert_eq!(r.action.as_deref(), Some(MOUSE_ACK));
        assert_eq!(r.status, Some(Status::Success));
        assert_eq!(r.message.as_deref(), Some("Scrolled down by 5"));
    }

    #[test]
    fn test_move_passes_configured_duration() {
        let mut mock = MockInputInjector::new();
        mock.expect_move_to()
            .with(eq(100), eq(200), eq(Duration::from_millis(100)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"mouse","action":"move","data":{"x":100,"y":200}}"#,
        ));

        assert_eq!(r.message.as_deref(), Some("Mouse moved to (100, 200)"));
    }

    #[test]
    fn test_relative_move_uses_move_relative() {
        let mut mock = MockInputInjector::new();
        mock.expect_move_relative()
            .with(eq(4), eq(-3))
            .times(1)
            .returning(|_, _| Ok(()));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"mouse","action":"move","data":{"deltaX":3.6,"deltaY":-2.8}}"#,
        ));

        assert!(r.is_success());
    }

    #[test]
    fn test_double_click_clicks_twice() {
        let mut mock = MockInputInjector::new();
        mock.expect_click()
            .with(eq(5), eq(6), eq(MouseButton::Left))
            .times(2)
            .returning(|_, _, _| Ok(()));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"mouse","action":"double_click","data":{"x":5,"y":6}}"#,
        ));

        assert_eq!(r.message.as_deref(), Some("left double click at (5, 6)"));
    }

    #[test]
    fn test_drag_injects_displacement_with_drag_duration() {
        let mut mock = MockInputInjector::new();
        mock.expect_drag_relative()
            .with(eq(90), eq(-40), eq(Duration::from_millis(300)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"mouse","action":"drag","data":{"start_x":10,"start_y":50,"end_x":100,"end_y":10}}"#,
        ));

        assert!(r.is_success());
    }

    #[test]
    fn test_invalid_button_never_reaches_injector() {
        // Arrange: no expectations, so any injector call fails the test.
        let d = dispatcher(MockInputInjector::new());

        // Act
        let r = d.dispatch(&command(
            r#"{"type":"mouse","action":"click","data":{"x":1,"y":1,"button":"up"}}"#,
        ));

        // Assert
        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.action.as_deref(), Some(MOUSE_ACK));
        assert_eq!(r.message.as_deref(), Some("Invalid button type: up"));
    }

    #[test]
    fn test_unknown_mouse_action_is_reported() {
        let r = dispatcher(MockInputInjector::new())
            .dispatch(&command(r#"{"type":"mouse","action":"wiggle"}"#));

        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.message.as_deref(), Some("Unknown mouse action: wiggle"));
    }

    #[test]
    fn test_injector_failure_becomes_error_response() {
        let mut mock = MockInputInjector::new();
        mock.expect_click()
            .returning(|_, _, _| Err(InjectorError::Platform("display locked".to_string())));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"mouse","action":"click","data":{"x":1,"y":1}}"#,
        ));

        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.status, Some(Status::Error));
        assert_eq!(r.message.as_deref(), Some("platform error: display locked"));
    }

    #[test]
    fn test_injector_panic_is_contained() {
        let mut mock = MockInputInjector::new();
        mock.expect_type_text().returning(|_| panic!("backend exploded"));

        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"keyboard","action":"type","data":{"text":"hi"}}"#,
        ));

        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.message.as_deref(), Some("Server error: backend exploded"));
    }

    #[test]
    fn test_keyboard_combo_is_passed_verbatim() {
        // Arrange
        let mut mock = MockInputInjector::new();
        mock.expect_key_combo()
            .with(eq("ctrl+c"))
            .times(1)
            .returning(|_| Ok(()));

        // Act
        let r = dispatcher(mock).dispatch(&command(
            r#"{"type":"keyboard","action":"combo","data":{"combination":"ctrl+c"}}"#,
        ));

        // Assert
        assert_eq!(r.action.as_deref(), Some(KEYBOARD_ACK));
        assert_eq!(r.message.as_deref(), Some("Key combo: ctrl+c"));
    }

    #[test]
    fn test_keyboard_press_reads_top_level_key() {
        let mut mock = MockInputInjector::new();
        mock.expect_key_action()
            .with(eq("enter"), eq(KeyAction::Press))
            .times(1)
            .returning(|_, _| Ok(()));

        let r = dispatcher(mock)
            .dispatch(&command(r#"{"type":"keyboard","action":"press","key":"enter"}"#));

        assert_eq!(r.message.as_deref(), Some("Key press: enter"));
    }

    #[test]
    fn test_keyboard_missing_text_is_rejected() {
        let r = dispatcher(MockInputInjector::new())
            .dispatch(&command(r#"{"type":"keyboard","action":"type"}"#));

        assert_eq!(r.kind, ResponseKind::Error);
        assert_eq!(r.action.as_deref(), Some(KEYBOARD_ACK));
    }

    #[test]
    fn test_test_ping_echoes_data_and_reports_server() {
        // Arrange
        let d = dispatcher(MockInputInjector::new());

        // Act
        let r = d.dispatch(&command(
            r#"{"type":"test","action":"ping","data":{"client":"android","n":7}}"#,
        ));

        // Assert
        assert_eq!(r.kind, ResponseKind::Pong);
        assert_eq!(r.action.as_deref(), Some("response"));
        assert_eq!(r.message.as_deref(), Some("pong"));
        let data = r.data.expect("test pong carries data");
        assert_eq!(data["echo_data"], json!({"client": "android", "n": 7}));
        assert_eq!(data["server"], "Zenflow PC Server");
        assert_eq!(data["version"], "1.0");
        assert!(chrono::DateTime::parse_from_rfc3339(data["server_time"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_keepalive_returns_bare_pong() {
        let r = dispatcher(MockInputInjector::new())
            .dispatch(&command(r#"{"type":"ping","action":"keepalive"}"#));

        assert_eq!(r.kind, ResponseKind::Pong);
        assert_eq!(r.action.as_deref(), Some(KEEPALIVE_ACTION));
        assert!(r.data.is_none());
        assert!(r.message.is_none());
    }

    #[test]
    fn test_unknown_category_is_echoed_verbatim() {
        let frame = json!({"type": "gamepad", "action": "rumble", "data": {"ms": 250}, "extra": true});

        let r = dispatcher(MockInputInjector::new()).dispatch(&command(&frame.to_string()));

        assert_eq!(r.kind, ResponseKind::Echo);
        assert_eq!(r.data, Some(frame));
    }

    #[test]
    fn test_test_category_with_other_action_is_echoed() {
        let r = dispatcher(MockInputInjector::new())
            .dispatch(&command(r#"{"type":"test","action":"hello"}"#));

        assert_eq!(r.kind, ResponseKind::Echo);
    }
}
