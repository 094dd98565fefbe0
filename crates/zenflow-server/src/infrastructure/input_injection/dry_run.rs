//! Dry-run injector: logs instead of injecting.

use std::time::Duration;

use tracing::info;
use zenflow_core::{KeyAction, MouseButton};

use crate::application::injector::{InjectorError, InputInjector};

/// Logs each requested input event at `info` level and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInjector;

impl DryRunInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for DryRunInjector {
    fn move_to(&self, x: i32, y: i32, duration: Duration) -> Result<(), InjectorError> {
        info!(x, y, duration_ms = duration.as_millis() as u64, "inject: move to");
        Ok(())
    }

    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError> {
        info!(dx, dy, "inject: move relative");
        Ok(())
    }

    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectorError> {
        info!(x, y, button = button.as_str(), "inject: click");
        Ok(())
    }

    fn scroll(&self, amount: i32, x: i32, y: i32) -> Result<(), InjectorError> {
        info!(amount, x, y, "inject: scroll");
        Ok(())
    }

    fn drag_relative(&self, dx: i32, dy: i32, duration: Duration) -> Result<(), InjectorError> {
        info!(dx, dy, duration_ms = duration.as_millis() as u64, "inject: drag");
        Ok(())
    }

    fn key_action(&self, key: &str, action: KeyAction) -> Result<(), InjectorError> {
        info!(key, action = action.as_str(), "inject: key");
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), InjectorError> {
        info!(chars = text.chars().count(), "inject: type text");
        Ok(())
    }

    fn key_combo(&self, combination: &str) -> Result<(), InjectorError> {
        info!(combination, "inject: key combo");
        Ok(())
    }
}
