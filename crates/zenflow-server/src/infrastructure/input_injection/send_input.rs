//! Windows input backend via the SendInput API.
//!
//! The pointer is placed with `SetCursorPos` in physical pixels, buttons and
//! the wheel go through `SendInput`, keys are sent as Virtual-Key codes, and
//! text is sent as `KEYEVENTF_UNICODE` UTF-16 units so it does not depend on
//! the active keyboard layout.

#![cfg(target_os = "windows")]

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL, MOUSEINPUT,
    MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};
use zenflow_core::MouseButton;

use crate::application::injector::InjectorError;
use crate::infrastructure::input_injection::keys::{HostKey, NamedKey};
use crate::infrastructure::input_injection::native::InputBackend;

/// One wheel notch.
const WHEEL_DELTA: i32 = 120;

// Virtual-Key codes.
const VK_BACK: u16 = 0x08;
const VK_TAB: u16 = 0x09;
const VK_RETURN: u16 = 0x0D;
const VK_SHIFT: u16 = 0x10;
const VK_CONTROL: u16 = 0x11;
const VK_MENU: u16 = 0x12;
const VK_CAPITAL: u16 = 0x14;
const VK_ESCAPE: u16 = 0x1B;
const VK_SPACE: u16 = 0x20;
const VK_PRIOR: u16 = 0x21;
const VK_NEXT: u16 = 0x22;
const VK_END: u16 = 0x23;
const VK_HOME: u16 = 0x24;
const VK_LEFT: u16 = 0x25;
const VK_UP: u16 = 0x26;
const VK_RIGHT: u16 = 0x27;
const VK_DOWN: u16 = 0x28;
const VK_INSERT: u16 = 0x2D;
const VK_DELETE: u16 = 0x2E;
const VK_LWIN: u16 = 0x5B;
const VK_F1: u16 = 0x70;
const VK_VOLUME_MUTE: u16 = 0xAD;
const VK_VOLUME_DOWN: u16 = 0xAE;
const VK_VOLUME_UP: u16 = 0xAF;
const VK_MEDIA_NEXT_TRACK: u16 = 0xB0;
const VK_MEDIA_PREV_TRACK: u16 = 0xB1;
const VK_MEDIA_PLAY_PAUSE: u16 = 0xB3;

/// Keys that need `KEYEVENTF_EXTENDEDKEY`.
const EXTENDED_VKS: &[u16] = &[
    VK_PRIOR, VK_NEXT, VK_END, VK_HOME, VK_LEFT, VK_UP, VK_RIGHT, VK_DOWN, VK_INSERT, VK_DELETE,
    VK_LWIN,
];

/// SendInput-based [`InputBackend`].
#[derive(Debug, Default)]
pub struct SendInputBackend;

impl SendInputBackend {
    pub fn new() -> Self {
        Self
    }
}

impl InputBackend for SendInputBackend {
    fn cursor_position(&mut self) -> Result<(i32, i32), InjectorError> {
        let mut point = POINT::default();
        // SAFETY: `point` is a valid out-pointer for the duration of the call.
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| InjectorError::Platform(format!("GetCursorPos failed: {e}")))?;
        Ok((point.x, point.y))
    }

    fn warp(&mut self, x: i32, y: i32) -> Result<(), InjectorError> {
        // SAFETY: SetCursorPos takes plain integers.
        unsafe { SetCursorPos(x, y) }
            .map_err(|e| InjectorError::Platform(format!("SetCursorPos failed: {e}")))
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectorError> {
        let flags = match (button, pressed) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
        };
        send(&[mouse_input(flags, 0)])
    }

    fn wheel(&mut self, notches: i32) -> Result<(), InjectorError> {
        if notches == 0 {
            return Ok(());
        }
        // mouseData carries the signed delta in its bit pattern.
        let delta = notches.saturating_mul(WHEEL_DELTA);
        send(&[mouse_input(MOUSEEVENTF_WHEEL, delta as u32)])
    }

    fn key(&mut self, key: HostKey, pressed: bool) -> Result<(), InjectorError> {
        let vk = match key {
            HostKey::Named(named) => named_vk(named),
            HostKey::Char(c) => char_vk(c)?,
        };
        send(&[vk_input(vk, pressed)])
    }

    fn text(&mut self, text: &str) -> Result<(), InjectorError> {
        let inputs: Vec<INPUT> = text
            .encode_utf16()
            .flat_map(|unit| [unicode_input(unit, true), unicode_input(unit, false)])
            .collect();
        send(&inputs)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn send(inputs: &[INPUT]) -> Result<(), InjectorError> {
    // SAFETY: every element is a fully initialised INPUT structure.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(InjectorError::Platform(format!(
            "SendInput accepted {sent} of {} events (blocked by a higher-integrity window?)",
            inputs.len()
        )));
    }
    Ok(())
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS, mouse_data: u32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: mouse_data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn vk_input(vk: u16, pressed: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    if EXTENDED_VKS.contains(&vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    keyboard_input(vk, 0, flags)
}

fn unicode_input(unit: u16, pressed: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    keyboard_input(0, unit, flags)
}

/// Virtual-Key code of the key that produces `c` in the active layout.
fn char_vk(c: char) -> Result<u16, InjectorError> {
    let mut units = [0u16; 2];
    let encoded = c.encode_utf16(&mut units);
    if encoded.len() != 1 {
        return Err(InjectorError::Unsupported(format!("no key produces '{c}'")));
    }
    // SAFETY: VkKeyScanW takes a plain UTF-16 unit.
    let scan = unsafe { VkKeyScanW(encoded[0]) };
    if scan == -1 {
        return Err(InjectorError::Unsupported(format!(
            "no key produces '{c}' in the current layout"
        )));
    }
    // Low byte is the key; the high byte holds the shift state.
    Ok((scan as u16) & 0x00FF)
}

fn named_vk(key: NamedKey) -> u16 {
    match key {
        NamedKey::Enter => VK_RETURN,
        NamedKey::Tab => VK_TAB,
        NamedKey::Space => VK_SPACE,
        NamedKey::Backspace => VK_BACK,
        NamedKey::Delete => VK_DELETE,
        NamedKey::Escape => VK_ESCAPE,
        NamedKey::Up => VK_UP,
        NamedKey::Down => VK_DOWN,
        NamedKey::Left => VK_LEFT,
        NamedKey::Right => VK_RIGHT,
        NamedKey::Home => VK_HOME,
        NamedKey::End => VK_END,
        NamedKey::PageUp => VK_PRIOR,
        NamedKey::PageDown => VK_NEXT,
        NamedKey::Insert => VK_INSERT,
        NamedKey::Shift => VK_SHIFT,
        NamedKey::Ctrl => VK_CONTROL,
        NamedKey::Alt => VK_MENU,
        NamedKey::Meta => VK_LWIN,
        NamedKey::CapsLock => VK_CAPITAL,
        NamedKey::Function(n) => VK_F1 + u16::from(n - 1),
        NamedKey::VolumeUp => VK_VOLUME_UP,
        NamedKey::VolumeDown => VK_VOLUME_DOWN,
        NamedKey::VolumeMute => VK_VOLUME_MUTE,
        NamedKey::PlayPause => VK_MEDIA_PLAY_PAUSE,
        NamedKey::NextTrack => VK_MEDIA_NEXT_TRACK,
        NamedKey::PrevTrack => VK_MEDIA_PREV_TRACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys_map_to_contiguous_vks() {
        assert_eq!(named_vk(NamedKey::Function(1)), 0x70);
        assert_eq!(named_vk(NamedKey::Function(24)), 0x87);
    }

    #[test]
    fn test_navigation_keys_are_extended() {
        assert!(EXTENDED_VKS.contains(&named_vk(NamedKey::Left)));
        assert!(!EXTENDED_VKS.contains(&named_vk(NamedKey::Enter)));
    }

    #[test]
    fn test_text_is_sent_as_utf16_press_release_pairs() {
        // "é€" is two UTF-16 units, so four events.
        let units: Vec<u16> = "é€".encode_utf16().collect();
        assert_eq!(units.len(), 2);
        let down = unicode_input(units[0], true);
        // SAFETY: the union was written through its `ki` field.
        let ki = unsafe { down.Anonymous.ki };
        assert_eq!(ki.wScan, units[0]);
        assert_eq!(ki.dwFlags, KEYEVENTF_UNICODE);
    }
}
