use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell color normalised to `#RRGGBB` (upper-case hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

pub const WHITE: &str = "#FFFFFF";
pub const BLACK: &str = "#000000";

pub const PALETTE: [&str; 16] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#00FFFF", "#FF00FF",
    "#FFA500", "#800080", "#008000", "#800000", "#808080", "#C0C0C0", "#FFC0CB", "#A52A2A",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("color must be 6 hex digits, got {0:?}")]
    InvalidLength(String),
    #[error("invalid hex digit in color {0:?}")]
    InvalidDigit(String),
}

impl Color {
    /// Accepts `#RRGGBB` or bare `RRGGBB`.
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 {
            return Err(ColorError::InvalidLength(value.to_string()));
        }
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit(value.to_string()));
        }
        Ok(Self(format!("#{}", hex.to_ascii_uppercase())))
    }

    pub fn white() -> Self {
        Self(WHITE.to_string())
    }

    pub fn black() -> Self {
        Self(BLACK.to_string())
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&self.0[range], 16).unwrap_or(0)
        };
        (channel(1..3), channel(3..5), channel(5..7))
    }

    pub fn is_white(&self) -> bool {
        self.0 == WHITE
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for Color {
    type Err = ColorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_hex_and_normalises_case() {
        assert_eq!(Color::parse("ff0000").unwrap().as_str(), "#FF0000");
        assert_eq!(Color::parse("#00ff7f").unwrap().as_str(), "#00FF7F");
    }

    #[test]
    fn rejects_short_and_non_hex() {
        assert!(matches!(Color::parse("#FFF"), Err(ColorError::InvalidLength(_))));
        assert!(matches!(Color::parse("#GG0000"), Err(ColorError::InvalidDigit(_))));
    }

    #[test]
    fn rgb_channels() {
        assert_eq!(Color::parse("#102030").unwrap().rgb(), (0x10, 0x20, 0x30));
        assert_eq!(Color::from_rgb(1, 2, 255).as_str(), "#0102FF");
    }

    #[test]
    fn palette_entries_parse() {
        for entry in PALETTE {
            assert_eq!(Color::parse(entry).unwrap().as_str(), entry);
        }
    }
}
