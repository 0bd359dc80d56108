//! Extension selectors
//!
//! A selector names one HDU by position, by EXTNAME, or by EXTNAME and
//! EXTVER, and carries the pixel ranges to cut from it.

use std::fmt;

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::fits::hdu::Hdu;
use crate::slice::range::{format_ranges, PixelRange};

/// How a selector identifies its HDU
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtensionId {
    /// Position in the file, 0 = primary
    Index(u32),
    /// EXTNAME
    Name(String),
    /// EXTNAME and EXTVER (1-based)
    NameVersion(String, u32),
}

impl ExtensionId {
    /// Classify a selector token: `name,version`, then a non-negative
    /// integer index, then a bare name
    pub fn parse(token: &str) -> CutoutResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CutoutError::grammar(token, "empty extension selector"));
        }

        if let Some((name, version)) = token.split_once(',') {
            let name = name.trim();
            let version = version.trim();
            if name.is_empty() {
                return Err(CutoutError::grammar(token, "missing extension name before ','"));
            }
            if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CutoutError::grammar(token, format!("extension version '{}' is not a number", version)));
            }
            let version = version
                .parse::<u32>()
                .map_err(|_| CutoutError::grammar(token, "extension version is too large"))?;
            // EXTVER numbering starts at 1
            return Ok(ExtensionId::NameVersion(name.to_string(), version.max(1)));
        }

        if token.bytes().all(|b| b.is_ascii_digit()) {
            let index = token
                .parse::<u32>()
                .map_err(|_| CutoutError::grammar(token, "extension index is too large"))?;
            return Ok(ExtensionId::Index(index));
        }

        Ok(ExtensionId::Name(token.to_string()))
    }

    /// Whether `hdu` is the unit this id names
    ///
    /// Names compare case-insensitively; a missing EXTVER counts as 1.
    pub fn matches(&self, hdu: &Hdu) -> bool {
        match self {
            ExtensionId::Index(i) => hdu.index == *i as usize,
            ExtensionId::Name(name) => hdu
                .extname
                .as_deref()
                .map_or(false, |n| n.eq_ignore_ascii_case(name)),
            ExtensionId::NameVersion(name, version) => {
                hdu.extver == *version
                    && hdu
                        .extname
                        .as_deref()
                        .map_or(false, |n| n.eq_ignore_ascii_case(name))
            }
        }
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionId::Index(i) => write!(f, "{}", i),
            ExtensionId::Name(name) => write!(f, "{}", name),
            ExtensionId::NameVersion(name, version) => write!(f, "{},{}", name, version),
        }
    }
}

/// One extension plus the pixel ranges to cut from it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionSelector {
    pub extension: ExtensionId,
    /// One range per axis, NAXIS1 first; empty means the whole unit
    pub ranges: Vec<PixelRange>,
}

impl ExtensionSelector {
    pub fn new(extension: ExtensionId, ranges: Vec<PixelRange>) -> Self {
        ExtensionSelector { extension, ranges }
    }

    /// Selector for a whole unit
    pub fn whole(extension: ExtensionId) -> Self {
        ExtensionSelector::new(extension, Vec::new())
    }
}

impl fmt::Display for ExtensionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.extension)?;
        if !self.ranges.is_empty() {
            write!(f, "[{}]", format_ranges(&self.ranges))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::errors::ErrorKind;

    #[test]
    fn test_disambiguation() {
        assert_eq!(ExtensionId::parse("2").unwrap(), ExtensionId::Index(2));
        assert_eq!(ExtensionId::parse("foo").unwrap(), ExtensionId::Name("foo".into()));
        assert_eq!(ExtensionId::parse("foo,2").unwrap(), ExtensionId::NameVersion("foo".into(), 2));
        assert_eq!(ExtensionId::parse("foo,0").unwrap(), ExtensionId::NameVersion("foo".into(), 1));
        assert_eq!(ExtensionId::parse(" SCI , 10 ").unwrap(), ExtensionId::NameVersion("SCI".into(), 10));
        assert_eq!(ExtensionId::parse("2a").unwrap(), ExtensionId::Name("2a".into()));
    }

    #[test]
    fn test_bad_selectors() {
        for bad in ["", "foo,", ",2", "foo,bar", "foo,-1", "99999999999"] {
            assert_eq!(ExtensionId::parse(bad).unwrap_err().kind(), ErrorKind::Grammar, "input {:?}", bad);
        }
    }

    #[test]
    fn test_display() {
        let sel = ExtensionSelector::new(
            ExtensionId::NameVersion("SCI".into(), 10),
            vec![PixelRange::new(80, 220), PixelRange::new(100, 150)],
        );
        assert_eq!(sel.to_string(), "[SCI,10][80:220,100:150]");
        assert_eq!(ExtensionSelector::whole(ExtensionId::Index(106)).to_string(), "[106]");
    }
}
