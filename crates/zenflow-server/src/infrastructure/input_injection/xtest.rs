//! Linux X11 input backend via the XTest extension.
//!
//! Uses `XTestFakeMotionEvent`, `XTestFakeButtonEvent` and
//! `XTestFakeKeyEvent`; the X server delivers the synthesized events to the
//! focused window exactly like physical input.
//!
//! # Key codes
//!
//! XTest takes X11 *keycodes*, so every key goes through its KeySym:
//!
//! ```text
//! HostKey → KeySym → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! Characters use their Latin-1 KeySym, or `0x0100_0000 | codepoint` beyond
//! Latin-1.  A character whose keycode produces it only on the shifted level
//! (`'A'`, `'!'`) is typed with Shift held.
//!
//! # Scrolling
//!
//! X11 has no wheel API; each notch is a press and release of button 4 (up)
//! or 5 (down).
//!
//! # Permissions
//!
//! The process needs access to the display named by `DISPLAY`, which is the
//! case when it runs in the user's session.

#![cfg(all(target_os = "linux", feature = "xtest"))]

use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;

use x11::xlib;
use x11::xtest;
use zenflow_core::MouseButton;

use crate::application::injector::InjectorError;
use crate::infrastructure::input_injection::keys::{HostKey, NamedKey};
use crate::infrastructure::input_injection::native::InputBackend;

/// `CurrentTime`: deliver synthesized events immediately.
const CURRENT_TIME: c_ulong = 0;

/// Screen `-1`: the screen the pointer is on.
const SCREEN_DEFAULT: c_int = -1;

const BUTTON_WHEEL_UP: c_uint = 4;
const BUTTON_WHEEL_DOWN: c_uint = 5;

// KeySyms from X11/keysymdef.h and X11/XF86keysym.h.
const XK_BACKSPACE: c_ulong = 0xff08;
const XK_TAB: c_ulong = 0xff09;
const XK_RETURN: c_ulong = 0xff0d;
const XK_ESCAPE: c_ulong = 0xff1b;
const XK_HOME: c_ulong = 0xff50;
const XK_LEFT: c_ulong = 0xff51;
const XK_UP: c_ulong = 0xff52;
const XK_RIGHT: c_ulong = 0xff53;
const XK_DOWN: c_ulong = 0xff54;
const XK_PAGE_UP: c_ulong = 0xff55;
const XK_PAGE_DOWN: c_ulong = 0xff56;
const XK_END: c_ulong = 0xff57;
const XK_INSERT: c_ulong = 0xff63;
const XK_F1: c_ulong = 0xffbe;
const XK_SHIFT_L: c_ulong = 0xffe1;
const XK_CONTROL_L: c_ulong = 0xffe3;
const XK_CAPS_LOCK: c_ulong = 0xffe5;
const XK_ALT_L: c_ulong = 0xffe9;
const XK_SUPER_L: c_ulong = 0xffeb;
const XK_DELETE: c_ulong = 0xffff;
const XK_SPACE: c_ulong = 0x0020;
const XF86XK_AUDIO_LOWER_VOLUME: c_ulong = 0x1008_ff11;
const XF86XK_AUDIO_MUTE: c_ulong = 0x1008_ff12;
const XF86XK_AUDIO_RAISE_VOLUME: c_ulong = 0x1008_ff13;
const XF86XK_AUDIO_PLAY: c_ulong = 0x1008_ff14;
const XF86XK_AUDIO_PREV: c_ulong = 0x1008_ff16;
const XF86XK_AUDIO_NEXT: c_ulong = 0x1008_ff17;

/// Owned connection to the X display.
pub struct XTestBackend {
    display: *mut xlib::Display,
}

// SAFETY: the display connection is only used through `&mut self`, and
// `NativeInjector` serializes all access behind a mutex.
unsafe impl Send for XTestBackend {}

impl XTestBackend {
    /// Opens the display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::Platform`] if the display cannot be opened.
    pub fn open() -> Result<Self, InjectorError> {
        // SAFETY: a null name selects the `DISPLAY` environment variable.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(InjectorError::Platform(
                "cannot open X display (is DISPLAY set?)".to_string(),
            ));
        }
        Ok(Self { display })
    }

    fn flush(&mut self) {
        // SAFETY: `display` is a live connection owned by `self`.
        unsafe {
            xlib::XFlush(self.display);
        }
    }

    fn keycode(&mut self, keysym: c_ulong) -> Result<c_uint, InjectorError> {
        // SAFETY: `display` is a live connection owned by `self`.
        let code = unsafe { xlib::XKeysymToKeycode(self.display, keysym) };
        if code == 0 {
            return Err(InjectorError::Unsupported(format!(
                "no keycode for keysym {keysym:#x} in the current keymap"
            )));
        }
        Ok(c_uint::from(code))
    }

    fn fake_key(&mut self, keycode: c_uint, pressed: bool) -> Result<(), InjectorError> {
        // SAFETY: `display` is a live connection owned by `self`.
        let ok = unsafe {
            xtest::XTestFakeKeyEvent(self.display, keycode, xlib_bool(pressed), CURRENT_TIME)
        };
        if ok == 0 {
            return Err(InjectorError::Platform("XTestFakeKeyEvent failed".to_string()));
        }
        Ok(())
    }

    fn fake_button(&mut self, button: c_uint, pressed: bool) -> Result<(), InjectorError> {
        // SAFETY: `display` is a live connection owned by `self`.
        let ok = unsafe {
            xtest::XTestFakeButtonEvent(self.display, button, xlib_bool(pressed), CURRENT_TIME)
        };
        if ok == 0 {
            return Err(InjectorError::Platform("XTestFakeButtonEvent failed".to_string()));
        }
        Ok(())
    }

    /// Whether `keycode` yields `keysym` only with Shift held.
    fn needs_shift(&mut self, keycode: c_uint, keysym: c_ulong) -> bool {
        // SAFETY: `display` is a live connection owned by `self`; keycodes
        // from `XKeysymToKeycode` fit in a byte.
        #[allow(deprecated)]
        let unshifted = unsafe { xlib::XKeycodeToKeysym(self.display, keycode as u8, 0) };
        unshifted != keysym
    }

    /// Presses and releases one character, holding Shift if the layout needs it.
    fn tap_char(&mut self, c: char) -> Result<(), InjectorError> {
        let keysym = match c {
            '\n' => XK_RETURN,
            '\t' => XK_TAB,
            _ => char_keysym(c),
        };
        let keycode = self.keycode(keysym)?;
        let shift = if self.needs_shift(keycode, keysym) {
            Some(self.keycode(XK_SHIFT_L)?)
        } else {
            None
        };
        if let Some(shift) = shift {
            self.fake_key(shift, true)?;
        }
        let typed = self
            .fake_key(keycode, true)
            .and_then(|()| self.fake_key(keycode, false));
        if let Some(shift) = shift {
            self.fake_key(shift, false)?;
        }
        typed
    }
}

impl Drop for XTestBackend {
    fn drop(&mut self) {
        // SAFETY: `display` came from `XOpenDisplay` and is closed once.
        unsafe {
            xlib::XCloseDisplay(self.display);
        }
    }
}

impl InputBackend for XTestBackend {
    fn cursor_position(&mut self) -> Result<(i32, i32), InjectorError> {
        let (mut root_ret, mut child_ret): (xlib::Window, xlib::Window) = (0, 0);
        let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        let mut mask: c_uint = 0;
        // SAFETY: `display` is live and every out-pointer refers to a local.
        let on_screen = unsafe {
            let root = xlib::XDefaultRootWindow(self.display);
            xlib::XQueryPointer(
                self.display,
                root,
                &mut root_ret,
                &mut child_ret,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        if on_screen == 0 {
            return Err(InjectorError::Platform(
                "pointer is not on the default screen".to_string(),
            ));
        }
        Ok((root_x, root_y))
    }

    fn warp(&mut self, x: i32, y: i32) -> Result<(), InjectorError> {
        // SAFETY: `display` is a live connection owned by `self`.
        let ok = unsafe {
            xtest::XTestFakeMotionEvent(self.display, SCREEN_DEFAULT, x, y, CURRENT_TIME)
        };
        if ok == 0 {
            return Err(InjectorError::Platform("XTestFakeMotionEvent failed".to_string()));
        }
        self.flush();
        Ok(())
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectorError> {
        let xbutton = match button {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        };
        self.fake_button(xbutton, pressed)?;
        self.flush();
        Ok(())
    }

    fn wheel(&mut self, notches: i32) -> Result<(), InjectorError> {
        let button = if notches > 0 {
            BUTTON_WHEEL_UP
        } else {
            BUTTON_WHEEL_DOWN
        };
        for _ in 0..notches.unsigned_abs() {
            self.fake_button(button, true)?;
            self.fake_button(button, false)?;
        }
        self.flush();
        Ok(())
    }

    fn key(&mut self, key: HostKey, pressed: bool) -> Result<(), InjectorError> {
        let keysym = match key {
            HostKey::Char(c) => char_keysym(c),
            HostKey::Named(named) => named_keysym(named),
        };
        let keycode = self.keycode(keysym)?;
        self.fake_key(keycode, pressed)?;
        self.flush();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), InjectorError> {
        let result = text.chars().try_for_each(|c| self.tap_char(c));
        self.flush();
        result
    }
}

fn xlib_bool(value: bool) -> c_int {
    if value {
        xlib::True
    } else {
        xlib::False
    }
}

fn char_keysym(c: char) -> c_ulong {
    let cp = c_ulong::from(u32::from(c));
    if cp < 0x100 {
        cp
    } else {
        0x0100_0000 | cp
    }
}

fn named_keysym(key: NamedKey) -> c_ulong {
    match key {
        NamedKey::Enter => XK_RETURN,
        NamedKey::Tab => XK_TAB,
        NamedKey::Space => XK_SPACE,
        NamedKey::Backspace => XK_BACKSPACE,
        NamedKey::Delete => XK_DELETE,
        NamedKey::Escape => XK_ESCAPE,
        NamedKey::Up => XK_UP,
        NamedKey::Down => XK_DOWN,
        NamedKey::Left => XK_LEFT,
        NamedKey::Right => XK_RIGHT,
        NamedKey::Home => XK_HOME,
        NamedKey::End => XK_END,
        NamedKey::PageUp => XK_PAGE_UP,
        NamedKey::PageDown => XK_PAGE_DOWN,
        NamedKey::Insert => XK_INSERT,
        NamedKey::Shift => XK_SHIFT_L,
        NamedKey::Ctrl => XK_CONTROL_L,
        NamedKey::Alt => XK_ALT_L,
        NamedKey::Meta => XK_SUPER_L,
        NamedKey::CapsLock => XK_CAPS_LOCK,
        NamedKey::Function(n) => XK_F1 + c_ulong::from(n - 1),
        NamedKey::VolumeUp => XF86XK_AUDIO_RAISE_VOLUME,
        NamedKey::VolumeDown => XF86XK_AUDIO_LOWER_VOLUME,
        NamedKey::VolumeMute => XF86XK_AUDIO_MUTE,
        NamedKey::PlayPause => XF86XK_AUDIO_PLAY,
        NamedKey::NextTrack => XF86XK_AUDIO_NEXT,
        NamedKey::PrevTrack => XF86XK_AUDIO_PREV,
    }
}
