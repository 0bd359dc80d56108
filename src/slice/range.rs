//! Per-axis pixel ranges
//!
//! Pixel indices are zero-based and inclusive. The two entire-axis
//! sentinels are `(0, MAX)` for `*` and `(MAX, 0)` for `-*`; they are
//! clamped to the real axis length only when a cutout is resolved.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::fits::errors::{CutoutError, CutoutResult};

lazy_static! {
    static ref SENTINEL: Regex = Regex::new(r"^(-?)\*(?::(\d+))?$").unwrap();
    static ref BOUNDED: Regex = Regex::new(r"^(\d+):(\d+)(?::(\d+))?$").unwrap();
    static ref SINGLE: Regex = Regex::new(r"^(\d+)$").unwrap();
}

/// Selected pixels along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRange {
    pub lower: u64,
    pub upper: u64,
    pub step: u64,
}

impl PixelRange {
    /// Sentinel bound meaning "end of the axis"
    pub const MAX: u64 = u64::MAX;

    /// Explicit bounds, stride 1; `lower > upper` flips the axis
    pub fn new(lower: u64, upper: u64) -> Self {
        PixelRange { lower, upper, step: 1 }
    }

    /// Same range with a different stride
    pub fn with_step(self, step: u64) -> Self {
        PixelRange { step, ..self }
    }

    /// Whole axis, ascending (`*`)
    pub fn all() -> Self {
        PixelRange::new(0, Self::MAX)
    }

    /// Whole axis, descending (`-*`)
    pub fn flipped() -> Self {
        PixelRange::new(Self::MAX, 0)
    }

    /// One pixel
    pub fn single(pixel: u64) -> Self {
        PixelRange::new(pixel, pixel)
    }

    pub fn is_all(&self) -> bool {
        self.lower == 0 && self.upper == Self::MAX
    }

    pub fn is_flipped_all(&self) -> bool {
        self.lower == Self::MAX && self.upper == 0
    }

    pub fn is_single(&self) -> bool {
        self.lower == self.upper
    }

    /// Whether pixels are taken from high to low index
    pub fn is_descending(&self) -> bool {
        self.lower > self.upper
    }

    /// Parse one comma-separated component: `lb:ub:step`, `*:step`,
    /// `-*:step`, `lb:ub`, `*`, `-*` or `n`
    pub fn parse(text: &str) -> CutoutResult<Self> {
        let text = text.trim();

        let range = if let Some(caps) = SENTINEL.captures(text) {
            let base = if &caps[1] == "-" { PixelRange::flipped() } else { PixelRange::all() };
            base.with_step(parse_step(text, caps.get(2).map(|m| m.as_str()))?)
        } else if let Some(caps) = BOUNDED.captures(text) {
            let lower = parse_pixel(text, &caps[1])?;
            let upper = parse_pixel(text, &caps[2])?;
            PixelRange::new(lower, upper).with_step(parse_step(text, caps.get(3).map(|m| m.as_str()))?)
        } else if SINGLE.is_match(text) {
            PixelRange::single(parse_pixel(text, text)?)
        } else {
            return Err(CutoutError::grammar(text, "expected lb:ub[:step], *[:step], -*[:step] or a pixel index"));
        };

        Ok(range)
    }
}

fn parse_pixel(input: &str, digits: &str) -> CutoutResult<u64> {
    match digits.parse::<u64>() {
        Ok(v) if v != PixelRange::MAX => Ok(v),
        _ => Err(CutoutError::grammar(input, format!("pixel index {} is too large", digits))),
    }
}

fn parse_step(input: &str, digits: Option<&str>) -> CutoutResult<u64> {
    let Some(digits) = digits else {
        return Ok(1);
    };
    match digits.parse::<u64>() {
        Ok(0) => Err(CutoutError::grammar(input, "step must be at least 1")),
        Ok(v) => Ok(v),
        Err(_) => Err(CutoutError::grammar(input, format!("step {} is too large", digits))),
    }
}

impl fmt::Display for PixelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            write!(f, "*")?;
        } else if self.is_flipped_all() {
            write!(f, "-*")?;
        } else if self.is_single() && self.step == 1 {
            return write!(f, "{}", self.lower);
        } else {
            write!(f, "{}:{}", self.lower, self.upper)?;
        }
        if self.step > 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

impl FromStr for PixelRange {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelRange::parse(s)
    }
}

/// Parse a full pixel spec such as `80:220,100:150`
pub fn parse_ranges(text: &str) -> CutoutResult<Vec<PixelRange>> {
    text.split(',').map(PixelRange::parse).collect()
}

/// Inverse of [`parse_ranges`]
pub fn format_ranges(ranges: &[PixelRange]) -> String {
    ranges.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
}
