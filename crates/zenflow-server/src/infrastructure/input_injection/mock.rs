//! Recording input injector for tests.
//!
//! `RecordingInjector` replaces all host input calls with in-memory
//! recording.  Every call is pushed into a single `Mutex<Vec<InjectedEvent>>`
//! so assertions can check both what was injected and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let injector = Arc::new(RecordingInjector::new());
//! let dispatcher = Dispatcher::new(injector.clone(), &ServerConfig::default());
//!
//! dispatcher.dispatch(&scroll_command);
//!
//! assert_eq!(injector.events(), vec![InjectedEvent::Scroll { amount: -5, x: 10, y: 20 }]);
//! ```
//!
//! # Failure and latency simulation
//!
//! [`RecordingInjector::failing`] makes every call return
//! [`InjectorError::Platform`]; [`RecordingInjector::with_latency`] makes
//! every call sleep first, which is how tests observe that a slow injection
//! does not stall other sessions.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use zenflow_core::{KeyAction, MouseButton};

use crate::application::injector::{InjectorError, InputInjector};

/// One recorded injector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedEvent {
    MoveTo { x: i32, y: i32 },
    MoveRelative { dx: i32, dy: i32 },
    Click { x: i32, y: i32, button: MouseButton },
    Scroll { amount: i32, x: i32, y: i32 },
    DragRelative { dx: i32, dy: i32 },
    Key { key: String, action: KeyAction },
    Type { text: String },
    Combo { combination: String },
}

/// An injector that records all calls without touching the desktop.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<InjectedEvent>>,
    should_fail: bool,
    latency: Duration,
}

impl RecordingInjector {
    /// Creates a recorder that accepts every call immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder whose every call fails with a platform error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Makes every call block for `latency` before recording.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns a snapshot of all recorded calls, oldest first.
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.lock().clone()
    }

    /// Number of calls recorded so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InjectedEvent>> {
        // A test thread that panicked mid-push leaves the Vec intact.
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectorError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if self.should_fail {
            return Err(InjectorError::Platform("mock failure".to_string()));
        }
        self.lock().push(event);
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn move_to(&self, x: i32, y: i32, _duration: Duration) -> Result<(), InjectorError> {
        self.record(InjectedEvent::MoveTo { x, y })
    }

    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError> {
        self.record(InjectedEvent::MoveRelative { dx, dy })
    }

    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectorError> {
        self.record(InjectedEvent::Click { x, y, button })
    }

    fn scroll(&self, amount: i32, x: i32, y: i32) -> Result<(), InjectorError> {
        self.record(InjectedEvent::Scroll { amount, x, y })
    }

    fn drag_relative(&self, dx: i32, dy: i32, _duration: Duration) -> Result<(), InjectorError> {
        self.record(InjectedEvent::DragRelative { dx, dy })
    }

    fn key_action(&self, key: &str, action: KeyAction) -> Result<(), InjectorError> {
        self.record(InjectedEvent::Key {
            key: key.to_string(),
            action,
        })
    }

    fn type_text(&self, text: &str) -> Result<(), InjectorError> {
        self.record(InjectedEvent::Type {
            text: text.to_string(),
        })
    }

    fn key_combo(&self, combination: &str) -> Result<(), InjectorError> {
        self.record(InjectedEvent::Combo {
            combination: combination.to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
