//! 24-bit RGB colors as used by section palettes and materials.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Rgb(u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color value {0:#x} does not fit in 24 bits")]
    OutOfRange(u64),
    #[error("color string {0:?} is not of the form #rrggbb")]
    Malformed(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u64),
    Text(String),
}

impl TryFrom<ColorRepr> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: ColorRepr) -> Result<Self, Self::Error> {
        match value {
            ColorRepr::Hex(raw) => {
                if raw > 0xff_ffff {
                    return Err(ColorParseError::OutOfRange(raw));
                }
                Ok(Rgb(raw as u32))
            }
            ColorRepr::Text(text) => Rgb::parse(&text),
        }
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);
    pub const BLACK: Rgb = Rgb(0x000000);

    pub const fn from_hex(hex: u32) -> Self {
        Rgb(hex & 0xff_ffff)
    }

    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Accepts `#rrggbb`, `rrggbb`, or `0xrrggbb`.
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() != 6 {
            return Err(ColorParseError::Malformed(text.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb)
            .map_err(|_| ColorParseError::Malformed(text.to_string()))
    }

    pub fn channels(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    pub fn from_channels(channels: [u8; 3]) -> Self {
        Rgb(((channels[0] as u32) << 16) | ((channels[1] as u32) << 8) | channels[2] as u32)
    }

    /// Channels normalized to `0.0..=1.0` (sRGB encoded).
    pub fn to_array(self) -> [f32; 3] {
        let [r, g, b] = self.channels();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }

    /// Per-channel linear blend; `t = 0` keeps `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let from = self.channels();
        let to = other.channels();
        let mut out = [0u8; 3];
        for channel in 0..3 {
            let a = from[channel] as f32;
            let b = to[channel] as f32;
            out[channel] = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
        Rgb::from_channels(out)
    }

    /// Pale accent used for the heatbed platform.
    pub fn pale(self) -> Rgb {
        self.lerp(Rgb::WHITE, 0.7)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Housing color plus the filament/print color of one printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub color: Rgb,
    pub print_color: Rgb,
}

impl ColorPair {
    pub const fn new(color: Rgb, print_color: Rgb) -> Self {
        Self { color, print_color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hash_and_hex_prefixes() {
        assert_eq!(Rgb::parse("#f06292"), Ok(Rgb::from_hex(0xf06292)));
        assert_eq!(Rgb::parse("0xFFC107"), Ok(Rgb::from_hex(0xffc107)));
        assert!(Rgb::parse("#fff").is_err());
    }

    #[test]
    fn pale_blends_seventy_percent_towards_white() {
        let pale = Rgb::from_hex(0x000000).pale();
        assert_eq!(pale.channels(), [179, 179, 179]);
        assert_eq!(Rgb::WHITE.pale(), Rgb::WHITE);
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let pair: ColorPair =
            serde_json::from_str(r##"{"color": 15753874, "print_color": "#f48fb1"}"##)
                .expect("color pair parses");
        assert_eq!(pair.color, Rgb::from_hex(0xf06292));
        assert_eq!(pair.print_color, Rgb::from_hex(0xf48fb1));
        let encoded = serde_json::to_string(&pair.color).expect("color serializes");
        assert_eq!(encoded, "\"#f06292\"");
    }
}
