//! Key names sent by the mobile keyboard, resolved to host-independent keys.
//!
//! The client sends either a single printable character (`"a"`, `"7"`,
//! `"/"`) or a lower-case name (`"enter"`, `"ctrl"`, `"f5"`,
//! `"volumeup"`).  Combinations join names with `+` (`"ctrl+shift+t"`).
//! Each platform backend maps a [`HostKey`] to its own key code.

use crate::application::injector::InjectorError;

/// A key the native backends know how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    /// A printable character, typed through the active layout.
    Char(char),
    Named(NamedKey),
}

/// Non-printing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Shift,
    Ctrl,
    Alt,
    Meta,
    CapsLock,
    /// `F1` to `F24`.
    Function(u8),
    VolumeUp,
    VolumeDown,
    VolumeMute,
    PlayPause,
    NextTrack,
    PrevTrack,
}

impl NamedKey {
    /// Looks up a lower-case key name, accepting the common aliases.
    fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "space" | "spacebar" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "esc" | "escape" => Self::Escape,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" | "page_up" => Self::PageUp,
            "pagedown" | "pgdn" | "page_down" => Self::PageDown,
            "insert" => Self::Insert,
            "shift" => Self::Shift,
            "ctrl" | "control" => Self::Ctrl,
            "alt" | "option" => Self::Alt,
            "win" | "super" | "meta" | "cmd" | "command" => Self::Meta,
            "capslock" | "caps_lock" => Self::CapsLock,
            "volumeup" | "volume_up" => Self::VolumeUp,
            "volumedown" | "volume_down" => Self::VolumeDown,
            "volumemute" | "volume_mute" | "mute" => Self::VolumeMute,
            "playpause" | "media_play_pause" => Self::PlayPause,
            "nexttrack" | "media_next" | "media_next_track" => Self::NextTrack,
            "prevtrack" | "media_previous" | "media_prev_track" => Self::PrevTrack,
            _ => {
                let n: u8 = name.strip_prefix('f')?.parse().ok()?;
                if !(1..=24).contains(&n) {
                    return None;
                }
                Self::Function(n)
            }
        };
        Some(key)
    }
}

/// Resolves one key name.
///
/// A single character is taken literally (case preserved); anything longer
/// is matched case-insensitively against the known names.
///
/// # Errors
///
/// Returns [`InjectorError::Unsupported`] for empty or unknown names.
pub fn parse_key(name: &str) -> Result<HostKey, InjectorError> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Err(InjectorError::Unsupported("empty key name".to_string())),
        (Some(' '), None) => Ok(HostKey::Named(NamedKey::Space)),
        (Some(c), None) => Ok(HostKey::Char(c)),
        _ => NamedKey::from_name(&name.to_ascii_lowercase())
            .map(HostKey::Named)
            .ok_or_else(|| InjectorError::Unsupported(format!("unknown key '{name}'"))),
    }
}

/// Resolves a `+`-joined combination into the keys to hold, in press order.
///
/// # Errors
///
/// Returns [`InjectorError::Unsupported`] if any part is empty or unknown.
pub fn parse_combo(combination: &str) -> Result<Vec<HostKey>, InjectorError> {
    if combination.chars().count() == 1 {
        return Ok(vec![parse_key(combination)?]);
    }
    combination.split('+').map(|part| parse_key(part.trim())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_character_is_taken_literally() {
        assert_eq!(parse_key("a").unwrap(), HostKey::Char('a'));
        assert_eq!(parse_key("A").unwrap(), HostKey::Char('A'));
        assert_eq!(parse_key("/").unwrap(), HostKey::Char('/'));
        assert_eq!(parse_key("é").unwrap(), HostKey::Char('é'));
    }

    #[test]
    fn test_names_and_aliases_resolve() {
        assert_eq!(parse_key("enter").unwrap(), HostKey::Named(NamedKey::Enter));
        assert_eq!(parse_key("Return").unwrap(), HostKey::Named(NamedKey::Enter));
        assert_eq!(parse_key("esc").unwrap(), HostKey::Named(NamedKey::Escape));
        assert_eq!(parse_key("cmd").unwrap(), HostKey::Named(NamedKey::Meta));
        assert_eq!(parse_key(" ").unwrap(), HostKey::Named(NamedKey::Space));
        assert_eq!(
            parse_key("media_play_pause").unwrap(),
            HostKey::Named(NamedKey::PlayPause)
        );
    }

    #[test]
    fn test_function_keys_are_bounded() {
        assert_eq!(parse_key("f5").unwrap(), HostKey::Named(NamedKey::Function(5)));
        assert_eq!(parse_key("F12").unwrap(), HostKey::Named(NamedKey::Function(12)));
        assert!(parse_key("f0").is_err());
        assert!(parse_key("f25").is_err());
    }

    #[test]
    fn test_unknown_and_empty_names_are_unsupported() {
        assert!(matches!(parse_key("hyper"), Err(InjectorError::Unsupported(_))));
        assert!(matches!(parse_key(""), Err(InjectorError::Unsupported(_))));
    }

    #[test]
    fn test_combo_splits_in_press_order() {
        // Arrange / Act
        let keys = parse_combo("ctrl + shift+t").unwrap();

        // Assert
        assert_eq!(
            keys,
            vec![
                HostKey::Named(NamedKey::Ctrl),
                HostKey::Named(NamedKey::Shift),
                HostKey::Char('t'),
            ]
        );
    }

    #[test]
    fn test_combo_with_unknown_part_fails_whole() {
        assert!(parse_combo("ctrl+nope").is_err());
        assert!(parse_combo("ctrl+").is_err());
    }

    #[test]
    fn test_lone_plus_is_the_plus_key() {
        assert_eq!(parse_combo("+").unwrap(), vec![HostKey::Char('+')]);
    }

    #[test]
    fn test_single_media_key_is_a_combo_of_one() {
        assert_eq!(
            parse_combo("volumeup").unwrap(),
            vec![HostKey::Named(NamedKey::VolumeUp)]
        );
    }
}
