//! Slice specification grammar
//!
//! A specification is a run of bracket groups:
//! `[selector][pixels][selector][pixels]...`, where each pixel group is
//! optional. Grouping is decided by position only:
//!
//! - a group containing `:` or `*` is always a pixel spec, never an
//!   extension name; where a selector is expected it applies to the
//!   primary HDU;
//! - a group directly after a selector that looks like pixels (digits,
//!   `,`) is that selector's pixel spec, so `[foo,2][100]` means pixel
//!   100 of axis 1, not extension 100;
//! - anything else starts a new selector.
//!
//! The source is never consulted, so the same text always parses the same
//! way.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::slice::range::parse_ranges;
use crate::slice::selector::{ExtensionId, ExtensionSelector};

lazy_static! {
    static ref BRACKET_GROUP: Regex = Regex::new(r"\[([^\[\]]*)\]").unwrap();
    static ref PIXEL_TOKEN: Regex = Regex::new(r"^[0-9:*,\-\s]+$").unwrap();
}

/// Ordered list of selectors parsed from one specification string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SliceSpec {
    selectors: Vec<ExtensionSelector>,
}

impl SliceSpec {
    pub fn new(selectors: Vec<ExtensionSelector>) -> Self {
        SliceSpec { selectors }
    }

    /// Parse a specification such as `[SCI,10][80:220,100:150]`
    pub fn parse(input: &str) -> CutoutResult<Self> {
        let tokens = tokenize(input)?;
        let mut selectors = Vec::new();
        let mut pending: Option<ExtensionId> = None;

        for token in tokens {
            match pending.take() {
                Some(extension) if looks_like_pixels(token) || must_be_pixels(token) => {
                    selectors.push(ExtensionSelector::new(extension, parse_ranges(token)?));
                }
                Some(extension) => {
                    selectors.push(ExtensionSelector::whole(extension));
                    pending = Some(ExtensionId::parse(token)?);
                }
                None if must_be_pixels(token) => {
                    selectors.push(ExtensionSelector::new(ExtensionId::Index(0), parse_ranges(token)?));
                }
                None => pending = Some(ExtensionId::parse(token)?),
            }
        }
        if let Some(extension) = pending {
            selectors.push(ExtensionSelector::whole(extension));
        }

        let spec = SliceSpec { selectors };
        debug!("Parsed cutout specification '{}' as {}", input.trim(), spec);
        Ok(spec)
    }

    pub fn selectors(&self) -> &[ExtensionSelector] {
        &self.selectors
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtensionSelector> {
        self.selectors.iter()
    }
}

/// Split into bracket contents; only whitespace may sit between groups
fn tokenize(input: &str) -> CutoutResult<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for caps in BRACKET_GROUP.captures_iter(input) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let gap = &input[last_end..whole.start];
        if !gap.trim().is_empty() {
            return Err(CutoutError::grammar(gap.trim(), "text outside of brackets"));
        }
        let content = caps.get(1).map_or("", |m| m.as_str()).trim();
        if content.is_empty() {
            return Err(CutoutError::grammar(input, "empty bracket group"));
        }
        tokens.push(content);
        last_end = whole.end;
    }

    let tail = &input[last_end..];
    if !tail.trim().is_empty() {
        return Err(CutoutError::grammar(tail.trim(), "text outside of brackets"));
    }
    if tokens.is_empty() {
        return Err(CutoutError::grammar(input, "no bracket groups"));
    }
    Ok(tokens)
}

fn looks_like_pixels(token: &str) -> bool {
    PIXEL_TOKEN.is_match(token)
}

/// Range syntax, valid or not; a bad one is a grammar error, not a name
fn must_be_pixels(token: &str) -> bool {
    token.contains(':') || token.contains('*')
}

/// Renders the canonical text of every spec `parse` produces
///
/// A hand-built spec with a whole-extension selector followed by an index
/// selector renders as `[1][2]`, which reads back as pixel 2 of
/// extension 1.
impl fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in &self.selectors {
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

impl FromStr for SliceSpec {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SliceSpec::parse(s)
    }
}

impl<'a> IntoIterator for &'a SliceSpec {
    type Item = &'a ExtensionSelector;
    type IntoIter = std::slice::Iter<'a, ExtensionSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.iter()
    }
}
