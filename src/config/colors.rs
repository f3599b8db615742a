//! Color configuration for the story strip and viewer.

use ratatui::style::Color;
use serde::{de, Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Border of the focused pane.
    #[serde(deserialize_with = "deserialize_color")]
    pub active_border: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub inactive_border: Color,
    /// Highlight for the selected story in the strip.
    #[serde(deserialize_with = "deserialize_color")]
    pub selection_bg: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub selection_fg: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub author: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub ups: Color,
    /// Progress segments for stories already seen, the current one, and
    /// the ones still ahead.
    #[serde(deserialize_with = "deserialize_color")]
    pub progress_done: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub progress_current: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub progress_pending: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub loading: Color,
    /// Slide text while a transition fades.
    #[serde(deserialize_with = "deserialize_color")]
    pub faded: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub status_fg: Color,
    #[serde(deserialize_with = "deserialize_color")]
    pub status_bg: Color,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            active_border: Color::Magenta,
            inactive_border: Color::DarkGray,
            selection_bg: Color::Magenta,
            selection_fg: Color::Black,
            author: Color::Yellow,
            ups: Color::LightRed,
            progress_done: Color::White,
            progress_current: Color::LightMagenta,
            progress_pending: Color::DarkGray,
            loading: Color::Cyan,
            faded: Color::DarkGray,
            status_fg: Color::White,
            status_bg: Color::DarkGray,
        }
    }
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_color_string(&s).map_err(de::Error::custom)
}

/// Parse a named color ("Magenta", "darkgray", ...) or a "#RRGGBB" / "#RGB"
/// hex code.
pub fn parse_color_string(s: &str) -> Result<Color, String> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex).ok_or_else(|| format!("Invalid hex color: {}", s));
    }

    let color = match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        "reset" => Color::Reset,
        _ => return Err(format!("Unknown color: {}", s)),
    };
    Ok(color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();

    match hex.len() {
        6 => Some(Color::Rgb(
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        // #RGB expands each digit: F -> FF
        3 => Some(Color::Rgb(
            channel(hex.get(0..1)?)? * 17,
            channel(hex.get(1..2)?)? * 17,
            channel(hex.get(2..3)?)? * 17,
        )),
        _ => None,
    }
}
