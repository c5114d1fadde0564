//! 24-bit RGB color cells

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single board cell color (no alpha channel)
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Error returned when parsing a `#rrggbb` color string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid color '{0}': expected #rrggbb")]
pub struct ParseColorError(String);

impl Color {
    /// Light grey used for freshly created boards
    pub const DEFAULT_FILL: Color = Color::new(221, 221, 221);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in transfer order (r, g, b)
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Render as lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode(self.to_bytes()))
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return Err(ParseColorError(s.to_string()));
        }

        let mut bytes = [0u8; 3];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| ParseColorError(s.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
