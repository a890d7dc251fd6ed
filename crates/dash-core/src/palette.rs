//! Chart colour palettes
//!
//! A [`Palette`] is passed explicitly into every render call; nothing reads a
//! palette from ambient state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Blend towards grey, used for hidden legend entries
    pub fn muted(&self) -> Self {
        let mix = |c: u8| ((c as u16 + 160) / 2) as u8;
        Self(mix(self.0), mix(self.1), mix(self.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid colour '{}'", s)))
    }
}

/// Named, ordered list of series colours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<Rgb>,
}

impl Palette {
    /// Indigo/purple/pink/orange/emerald, the dashboard default
    pub fn indigo() -> Self {
        Self {
            name: "indigo".to_string(),
            colors: vec![
                Rgb::new(0x63, 0x66, 0xf1),
                Rgb::new(0xa8, 0x55, 0xf7),
                Rgb::new(0xec, 0x48, 0x99),
                Rgb::new(0xf9, 0x73, 0x16),
                Rgb::new(0x10, 0xb9, 0x81),
            ],
        }
    }

    /// Eight bright categorical colours
    pub fn vivid() -> Self {
        Self {
            name: "vivid".to_string(),
            colors: vec![
                Rgb::new(100, 150, 250), // Blue
                Rgb::new(250, 150, 100), // Orange
                Rgb::new(150, 250, 100), // Green
                Rgb::new(250, 100, 150), // Pink
                Rgb::new(150, 100, 250), // Purple
                Rgb::new(250, 250, 100), // Yellow
                Rgb::new(100, 250, 250), // Cyan
                Rgb::new(250, 100, 100), // Red
            ],
        }
    }

    pub fn ocean() -> Self {
        Self {
            name: "ocean".to_string(),
            colors: vec![
                Rgb::new(0x0e, 0xa5, 0xe9),
                Rgb::new(0x06, 0xb6, 0xd4),
                Rgb::new(0x14, 0xb8, 0xa6),
                Rgb::new(0x3b, 0x82, 0xf6),
                Rgb::new(0x1e, 0x40, 0xaf),
            ],
        }
    }

    pub fn presets() -> Vec<Palette> {
        vec![Self::indigo(), Self::vivid(), Self::ocean()]
    }

    /// Look up a preset by name, falling back to the default palette
    pub fn by_name(name: &str) -> Self {
        Self::presets()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Colour for the series at `index`: `colors[index % len]`
    pub fn color_for(&self, index: usize) -> Rgb {
        if self.colors.is_empty() {
            return Rgb::new(0x63, 0x66, 0xf1);
        }
        self.colors[index % self.colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::indigo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_assignment_wraps() {
        let palette = Palette::indigo();
        assert_eq!(palette.color_for(0), palette.color_for(5));
        assert_ne!(palette.color_for(0), palette.color_for(1));
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex("#6366f1").unwrap();
        assert_eq!(c, Rgb::new(0x63, 0x66, 0xf1));
        assert_eq!(c.to_hex(), "#6366f1");
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_empty_palette_still_yields_color() {
        let palette = Palette {
            name: "empty".into(),
            colors: vec![],
        };
        let _ = palette.color_for(3);
        assert_eq!(Palette::by_name("OCEAN").name, "ocean");
        assert_eq!(Palette::by_name("unknown").name, "indigo");
    }
}
