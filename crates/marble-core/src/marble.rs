//! Marble data model: names, colors and roster edits.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGB color, written as a lowercase `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Predefined colors for marbles.
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const PINK: Color = Color::rgb(255, 192, 203);

    /// Default marble colors, in the order the palette hands them out.
    pub const PALETTE: [Color; 8] = [
        Self::RED,
        Self::BLUE,
        Self::GREEN,
        Self::YELLOW,
        Self::PURPLE,
        Self::ORANGE,
        Self::CYAN,
        Self::PINK,
    ];

    /// Palette color for the marble at `index`, wrapping around.
    pub fn from_palette(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }

    /// Uniformly random 24-bit color.
    pub fn random(rng: &mut impl Rng) -> Self {
        let value: u32 = rng.random_range(0..=0x00ff_ffff);
        Self::from_u24(value)
    }

    /// Builds a color from a packed `0xrrggbb` value (upper bits ignored).
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u24(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Packs the color as `0xrrggbb`.
    pub const fn to_u24(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Error returned when a string is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected #rrggbb")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| ParseColorError(s.to_string()))?;
        let value = u32::from_str_radix(hex, 16).map_err(|_| ParseColorError(s.to_string()))?;
        Ok(Self::from_u24(value))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A configured racer. Identity is its position in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marble {
    pub name: String,
    pub color: Color,
}

impl Marble {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Default name for the marble that becomes number `ordinal` (1-based).
    pub fn default_name(ordinal: usize) -> String {
        format!("Marble {ordinal}")
    }

    /// Applies the fields present in `patch`.
    pub fn apply(&mut self, patch: MarblePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

/// Partial edit of a marble; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarblePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl MarblePatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }

    pub fn color(color: Color) -> Self {
        Self {
            name: None,
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_color_display_is_lowercase_hex() {
        assert_eq!(Color::rgb(255, 165, 0).to_string(), "#ffa500");
        assert_eq!(Color::rgb(0, 0, 0).to_string(), "#000000");
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("#00FF7f".parse::<Color>(), Ok(Color::rgb(0, 255, 127)));
        assert!("00ff7f".parse::<Color>().is_err());
        assert!("#00ff7".parse::<Color>().is_err());
        assert!("#00ff7g".parse::<Color>().is_err());
        assert!("#+0ff7f".parse::<Color>().is_err());
    }

    #[test]
    fn test_random_colors_are_hex() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let text = Color::random(&mut rng).to_string();
            assert_eq!(text.len(), 7);
            assert!(text.starts_with('#'));
            assert!(text[1..].bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        }
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(Color::from_palette(0), Color::RED);
        assert_eq!(Color::from_palette(8), Color::RED);
        assert_eq!(Color::from_palette(9), Color::BLUE);
    }

    #[test]
    fn test_marble_json_uses_hex_color() {
        let marble = Marble::new("Marble 1", Color::CYAN);
        let json = serde_json::to_string(&marble).unwrap();
        assert_eq!(json, r##"{"name":"Marble 1","color":"#00ffff"}"##);

        let bad = r##"{"name":"x","color":"cyan"}"##;
        assert!(serde_json::from_str::<Marble>(bad).is_err());
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let mut marble = Marble::new("Marble 1", Color::RED);
        marble.apply(MarblePatch::name("Speedy"));
        assert_eq!(marble, Marble::new("Speedy", Color::RED));

        marble.apply(MarblePatch::color(Color::GREEN));
        assert_eq!(marble, Marble::new("Speedy", Color::GREEN));

        marble.apply(MarblePatch::default());
        assert_eq!(marble, Marble::new("Speedy", Color::GREEN));
    }
}
