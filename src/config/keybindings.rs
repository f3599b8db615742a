//! Keybinding configuration for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    /// Strip: previous story. Viewer: previous story (arrow control).
    pub move_left: Vec<String>,
    /// Strip: next story. Viewer: next story (arrow control).
    pub move_right: Vec<String>,
    pub select: Vec<String>,
    pub close_viewer: Vec<String>,
    /// Same as a tap on the right half.
    pub next_image: Vec<String>,
    /// Same as a tap on the left half.
    pub prev_image: Vec<String>,
    pub open_in_browser: Vec<String>,
    pub refresh: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_left: keys(&["h", "Left"]),
            move_right: keys(&["l", "Right"]),
            select: keys(&["Enter"]),
            close_viewer: keys(&["Esc"]),
            next_image: keys(&["Space", "j"]),
            prev_image: keys(&["Backspace", "k"]),
            open_in_browser: keys(&["o"]),
            refresh: keys(&["R"]),
        }
    }
}

impl KeybindingConfig {
    /// Resolve a key event to an action. Earlier entries win on conflict.
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&[String], Action); 9] = [
            (self.quit.as_slice(), Action::Quit),
            (self.close_viewer.as_slice(), Action::CloseViewer),
            (self.move_left.as_slice(), Action::MoveLeft),
            (self.move_right.as_slice(), Action::MoveRight),
            (self.select.as_slice(), Action::Select),
            (self.next_image.as_slice(), Action::NextImage),
            (self.prev_image.as_slice(), Action::PrevImage),
            (self.open_in_browser.as_slice(), Action::OpenInBrowser),
            (self.refresh.as_slice(), Action::Refresh),
        ];

        table
            .iter()
            .find(|(bindings, _)| Self::matches_key(key, bindings))
            .map(|(_, action)| *action)
            .unwrap_or(Action::None)
    }

    fn matches_key(key: &KeyEvent, bindings: &[String]) -> bool {
        bindings
            .iter()
            .filter_map(|binding| parse_key_string(binding).ok())
            .any(|parsed| parsed.matches(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored when the binding does not ask for it, since it is
    /// already folded into uppercase characters.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || self.modifiers == (key.modifiers & !KeyModifiers::SHIFT))
    }
}

/// Parse strings such as `"j"`, `"Esc"`, `"Ctrl+c"` or `"Shift+Tab"`.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    // "+" on its own is a key, not a separator.
    let (modifier_parts, key_part) = match s.rsplit_once('+') {
        Some((mods, key)) if !mods.is_empty() && !key.is_empty() => (Some(mods), key),
        _ => (None, s),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in modifier_parts.into_iter().flat_map(|m| m.split('+')) {
        modifiers |= match part.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        };
    }

    Ok(KeyBinding {
        code: parse_key_code(key_part)?,
        modifiers,
    })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "backspace" | "bs" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("Unknown key: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_parse_single_char() {
        let binding = parse_key_string("j").unwrap();
        assert_eq!(binding.code, KeyCode::Char('j'));
        assert_eq!(binding.modifiers, KeyModifiers::NONE);
    }

    #[test]
    fn test_parse_special_keys() {
        assert_eq!(parse_key_string("Esc").unwrap().code, KeyCode::Esc);
        assert_eq!(parse_key_string("escape").unwrap().code, KeyCode::Esc);
        assert_eq!(parse_key_string("Space").unwrap().code, KeyCode::Char(' '));
        assert_eq!(parse_key_string("Left").unwrap().code, KeyCode::Left);
        assert_eq!(parse_key_string("F12").unwrap().code, KeyCode::F(12));
        assert!(parse_key_string("F13").is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let binding = parse_key_string("Ctrl+c").unwrap();
        assert_eq!(binding.code, KeyCode::Char('c'));
        assert_eq!(binding.modifiers, KeyModifiers::CONTROL);

        let binding = parse_key_string("Ctrl+Shift+a").unwrap();
        assert_eq!(
            binding.modifiers,
            KeyModifiers::CONTROL | KeyModifiers::SHIFT
        );

        assert!(parse_key_string("Hyper+a").is_err());
    }

    #[test]
    fn test_parse_plus_key() {
        assert_eq!(parse_key_string("+").unwrap().code, KeyCode::Char('+'));
    }

    #[test]
    fn test_shift_folded_into_uppercase() {
        let binding = parse_key_string("R").unwrap();
        let key = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert!(binding.matches(&key));
    }

    #[test]
    fn test_default_actions() {
        let config = KeybindingConfig::default();

        assert_eq!(config.get_action(&press(KeyCode::Esc)), Action::CloseViewer);
        assert_eq!(config.get_action(&press(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(config.get_action(&press(KeyCode::Right)), Action::MoveRight);
        assert_eq!(config.get_action(&press(KeyCode::Enter)), Action::Select);
        assert_eq!(config.get_action(&press(KeyCode::Char(' '))), Action::NextImage);
        assert_eq!(config.get_action(&press(KeyCode::Backspace)), Action::PrevImage);
        assert_eq!(config.get_action(&press(KeyCode::Char('o'))), Action::OpenInBrowser);
        assert_eq!(config.get_action(&press(KeyCode::Char('x'))), Action::None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(config.get_action(&ctrl_c), Action::Quit);
    }

    #[test]
    fn test_invalid_binding_ignored() {
        let config = KeybindingConfig {
            quit: vec!["NotAKey".into(), "x".into()],
            ..Default::default()
        };
        assert_eq!(config.get_action(&press(KeyCode::Char('x'))), Action::Quit);
    }
}
