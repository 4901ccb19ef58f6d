//! Nine-point grid placement of a watermark on a target image.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Distance in pixels kept between the watermark and the target's edges.
pub const PADDING: i64 = 20;

/// Where on the target the watermark is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    /// Top edge, left corner.
    TopLeft,
    /// Top edge, horizontally centered.
    TopCenter,
    /// Top edge, right corner.
    TopRight,
    /// Vertically centered, left edge.
    MiddleLeft,
    /// Centered on both axes.
    Center,
    /// Vertically centered, right edge.
    MiddleRight,
    /// Bottom edge, left corner.
    BottomLeft,
    /// Bottom edge, horizontally centered.
    BottomCenter,
    /// Bottom edge, right corner.
    #[default]
    BottomRight,
}

impl Position {
    /// All nine positions in reading order.
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::MiddleLeft,
        Self::Center,
        Self::MiddleRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Short settings token (`tl`, `mc`, `br`, ...).
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopCenter => "tc",
            Self::TopRight => "tr",
            Self::MiddleLeft => "ml",
            Self::Center => "mc",
            Self::MiddleRight => "mr",
            Self::BottomLeft => "bl",
            Self::BottomCenter => "bc",
            Self::BottomRight => "br",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position = match s.trim().to_ascii_lowercase().as_str() {
            "tl" | "top-left" => Self::TopLeft,
            "tc" | "top-center" => Self::TopCenter,
            "tr" | "top-right" => Self::TopRight,
            "ml" | "middle-left" => Self::MiddleLeft,
            "mc" | "c" | "center" => Self::Center,
            "mr" | "middle-right" => Self::MiddleRight,
            "bl" | "bottom-left" => Self::BottomLeft,
            "bc" | "bottom-center" => Self::BottomCenter,
            "br" | "bottom-right" => Self::BottomRight,
            other => {
                return Err(Error::InvalidConfig(format!("unknown position `{other}`")));
            }
        };
        Ok(position)
    }
}

impl TryFrom<String> for Position {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.token().to_string()
    }
}

/// Top-left offset of a `wm_w` x `wm_h` watermark on a `target_w` x `target_h` image.
///
/// Results are not clamped: a watermark larger than the target yields
/// negative coordinates, which the compositor clips.
#[must_use]
pub fn place(position: Position, target_w: u32, target_h: u32, wm_w: u32, wm_h: u32) -> (i64, i64) {
    let (tw, th) = (i64::from(target_w), i64::from(target_h));
    let (ww, wh) = (i64::from(wm_w), i64::from(wm_h));

    let left = PADDING;
    let center = tw / 2 - ww / 2;
    let right = tw - ww - PADDING;
    let top = PADDING;
    let middle = th / 2 - wh / 2;
    let bottom = th - wh - PADDING;

    match position {
        Position::TopLeft => (left, top),
        Position::TopCenter => (center, top),
        Position::TopRight => (right, top),
        Position::MiddleLeft => (left, middle),
        Position::Center => (center, middle),
        Position::MiddleRight => (right, middle),
        Position::BottomLeft => (left, bottom),
        Position::BottomCenter => (center, bottom),
        Position::BottomRight => (right, bottom),
    }
}
