//! Host input injection on top of a platform backend.
//!
//! [`NativeInjector`] implements [`InputInjector`] once for every platform:
//! pointer animation, click and drag sequencing, and key combinations all
//! live here.  A platform only supplies an [`InputBackend`], a handful of
//! primitive operations (warp the pointer, press a button, turn the wheel,
//! press a key, type text).
//!
//! Moves and drags glide in small steps over the requested duration, so the
//! calling thread sleeps for that long.  The session layer runs dispatch on
//! the blocking pool for this reason.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use zenflow_core::{KeyAction, MouseButton};

use crate::application::injector::{InjectorError, InputInjector};
use crate::infrastructure::input_injection::keys::{parse_combo, parse_key, HostKey};

/// Interval between pointer updates while gliding.
const GLIDE_STEP: Duration = Duration::from_millis(10);

/// Upper bound on pointer updates for one glide.
const MAX_GLIDE_STEPS: u32 = 500;

/// Primitive input operations of one desktop platform.
pub trait InputBackend: Send {
    /// Current pointer position in screen pixels.
    fn cursor_position(&mut self) -> Result<(i32, i32), InjectorError>;

    /// Places the pointer at `(x, y)` immediately.
    fn warp(&mut self, x: i32, y: i32) -> Result<(), InjectorError>;

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectorError>;

    /// Turns the vertical wheel by `notches`; positive is up.
    fn wheel(&mut self, notches: i32) -> Result<(), InjectorError>;

    fn key(&mut self, key: HostKey, pressed: bool) -> Result<(), InjectorError>;

    /// Types `text` through the platform's text input path.
    fn text(&mut self, text: &str) -> Result<(), InjectorError>;
}

/// [`InputInjector`] backed by a platform [`InputBackend`].
///
/// Calls are serialized: the host has a single pointer and keyboard, so two
/// sessions never interleave halves of a drag or a combination.
pub struct NativeInjector<B> {
    backend: Mutex<B>,
}

impl<B: InputBackend> NativeInjector<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    fn lock(&self) -> MutexGuard<'_, B> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: InputBackend> InputInjector for NativeInjector<B> {
    fn move_to(&self, x: i32, y: i32, duration: Duration) -> Result<(), InjectorError> {
        let mut backend = self.lock();
        let from = backend.cursor_position()?;
        glide(&mut *backend, from, (x, y), duration)
    }

    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError> {
        let mut backend = self.lock();
        let (x, y) = backend.cursor_position()?;
        backend.warp(x.saturating_add(dx), y.saturating_add(dy))
    }

    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectorError> {
        let mut backend = self.lock();
        backend.warp(x, y)?;
        backend.button(button, true)?;
        backend.button(button, false)
    }

    fn scroll(&self, amount: i32, x: i32, y: i32) -> Result<(), InjectorError> {
        let mut backend = self.lock();
        backend.warp(x, y)?;
        backend.wheel(amount)
    }

    fn drag_relative(&self, dx: i32, dy: i32, duration: Duration) -> Result<(), InjectorError> {
        let mut backend = self.lock();
        let from = backend.cursor_position()?;
        let to = (from.0.saturating_add(dx), from.1.saturating_add(dy));

        backend.button(MouseButton::Left, true)?;
        let moved = glide(&mut *backend, from, to, duration);
        // The button must come back up even if the glide failed part-way.
        let released = backend.button(MouseButton::Left, false);
        moved.and(released)
    }

    fn key_action(&self, key: &str, action: KeyAction) -> Result<(), InjectorError> {
        let key = parse_key(key)?;
        self.lock().key(key, action == KeyAction::Press)
    }

    fn type_text(&self, text: &str) -> Result<(), InjectorError> {
        if text.is_empty() {
            return Ok(());
        }
        self.lock().text(text)
    }

    fn key_combo(&self, combination: &str) -> Result<(), InjectorError> {
        let keys = parse_combo(combination)?;
        let mut backend = self.lock();

        let mut held = Vec::with_capacity(keys.len());
        let mut pressed = Ok(());
        for key in keys {
            if let Err(e) = backend.key(key, true) {
                pressed = Err(e);
                break;
            }
            held.push(key);
        }

        let mut released = Ok(());
        for key in held.into_iter().rev() {
            if let Err(e) = backend.key(key, false) {
                warn!("failed to release {key:?} after combo '{combination}': {e}");
                released = released.and(Err(e));
            }
        }
        pressed.and(released)
    }
}

/// Moves the pointer from `from` to `to` in even steps spread over
/// `duration`.  A zero duration jumps straight to `to`.
fn glide<B: InputBackend + ?Sized>(
    backend: &mut B,
    from: (i32, i32),
    to: (i32, i32),
    duration: Duration,
) -> Result<(), InjectorError> {
    if duration.is_zero() || from == to {
        return backend.warp(to.0, to.1);
    }
    let steps = (duration.as_millis() / GLIDE_STEP.as_millis()).clamp(1, u128::from(MAX_GLIDE_STEPS));
    let steps = steps as u32;
    let pause = duration / steps;
    debug!(?from, ?to, steps, "glide");

    for i in 1..=steps {
        thread::sleep(pause);
        let t = f64::from(i) / f64::from(steps);
        let x = lerp(from.0, to.0, t);
        let y = lerp(from.1, to.1, t);
        backend.warp(x, y)?;
    }
    Ok(())
}

fn lerp(from: i32, to: i32, t: f64) -> i32 {
    (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
