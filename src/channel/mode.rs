use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{SdfError, SdfResult};

const CHANNEL_LETTERS: [char; 4] = ['r', 'g', 'b', 'a'];

/// Set of RGBA channels that get their own distance solve.
///
/// Bit `i` selects channel `i` (0 = R, 1 = G, 2 = B, 3 = A). Serializes as a lowercase letter
/// string such as `"a"` or `"rgba"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelMode(u8);

impl ChannelMode {
    pub const R: Self = Self(0x01);
    pub const G: Self = Self(0x02);
    pub const B: Self = Self(0x04);
    pub const A: Self = Self(0x08);
    pub const RGB: Self = Self(0x07);
    pub const RGBA: Self = Self(0x0f);

    /// The empty set. Rejected by [`ChannelMode::channels_to_solve`].
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a mode from raw bits; bits above the four channels are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0f)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether channel index `c` is selected.
    pub const fn has_channel(self, c: usize) -> bool {
        c < 4 && self.0 & (1 << c) != 0
    }

    /// Whether any of R, G or B is selected.
    pub const fn touches_color(self) -> bool {
        self.0 & Self::RGB.0 != 0
    }

    /// Channel indices to solve, highest first.
    pub fn channels_to_solve(self) -> SdfResult<Vec<usize>> {
        if self.is_empty() {
            return Err(SdfError::InvalidMode);
        }
        Ok((0..4).rev().filter(|&c| self.has_channel(c)).collect())
    }
}

impl Default for ChannelMode {
    fn default() -> Self {
        Self::A
    }
}

impl std::ops::BitOr for ChannelMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (c, letter) in CHANNEL_LETTERS.iter().enumerate() {
            if self.has_channel(c) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ChannelMode {
    type Err = SdfError;

    fn from_str(s: &str) -> SdfResult<Self> {
        let s = s.trim();
        // `none` is how the empty mode displays.
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Err(SdfError::InvalidMode);
        }
        let mut bits = 0u8;
        for ch in s.chars() {
            let lower = ch.to_ascii_lowercase();
            let c = CHANNEL_LETTERS
                .iter()
                .position(|&l| l == lower)
                .ok_or_else(|| {
                    SdfError::validation(format!("unknown channel '{ch}' in mode \"{s}\""))
                })?;
            bits |= 1 << c;
        }
        Ok(Self(bits))
    }
}

impl TryFrom<String> for ChannelMode {
    type Error = SdfError;

    fn try_from(s: String) -> SdfResult<Self> {
        s.parse()
    }
}

impl From<ChannelMode> for String {
    fn from(mode: ChannelMode) -> Self {
        mode.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/mode.rs"]
mod tests;
