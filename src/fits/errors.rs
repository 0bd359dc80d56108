//! Error types for FITS cutout processing
//!
//! Every failure surfaced by the crate is a [`CutoutError`]. Callers that
//! need to tell "bad request" apart from "unreadable source" use
//! [`CutoutError::kind`].

use std::fmt;
use std::io;

/// Broad category of a cutout failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The slice specification is malformed
    Grammar,
    /// The requested extension does not exist in the source
    NotFound,
    /// A pixel range lies outside the extension's axes
    Range,
    /// The source could not be read
    Io,
    /// The source is not valid FITS at the current position
    Format,
}

/// Errors produced while parsing, locating, or extracting a cutout
#[derive(Debug)]
pub enum CutoutError {
    /// Slice specification does not match the grammar
    Grammar {
        /// Offending token or input
        input: String,
        /// What was wrong with it
        reason: String,
    },
    /// Extension selector matched nothing in the source
    NotFound(String),
    /// Pixel range outside `[0, length)` or axis count mismatch
    Range {
        /// Zero-based axis (0 = NAXIS1)
        axis: usize,
        /// Requested lower bound
        lower: u64,
        /// Requested upper bound
        upper: u64,
        /// Real length of the axis
        length: u64,
        /// Explanation
        reason: String,
    },
    /// Underlying I/O failure
    Io(io::Error),
    /// Non-success HTTP response from a range request or probe
    Http {
        /// Resource location
        url: String,
        /// HTTP status code
        status: u16,
        /// Status reason phrase
        reason: String,
    },
    /// Header could not be parsed as FITS
    Format(String),
}

impl CutoutError {
    /// Shorthand for a grammar error
    pub fn grammar(input: &str, reason: impl Into<String>) -> Self {
        CutoutError::Grammar {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a range error
    pub fn range(axis: usize, lower: u64, upper: u64, length: u64, reason: impl Into<String>) -> Self {
        CutoutError::Range {
            axis,
            lower,
            upper,
            length,
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CutoutError::Grammar { .. } => ErrorKind::Grammar,
            CutoutError::NotFound(_) => ErrorKind::NotFound,
            CutoutError::Range { .. } => ErrorKind::Range,
            CutoutError::Io(_) | CutoutError::Http { .. } => ErrorKind::Io,
            CutoutError::Format(_) => ErrorKind::Format,
        }
    }
}

impl fmt::Display for CutoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoutError::Grammar { input, reason } => {
                write!(f, "Invalid cutout specification '{}': {}", input, reason)
            }
            CutoutError::NotFound(what) => write!(f, "Extension not found: {}", what),
            CutoutError::Range { axis, lower, upper, length, reason } => write!(
                f,
                "Invalid range on axis {} (NAXIS{}): {}:{} against length {}: {}",
                axis,
                axis + 1,
                lower,
                upper,
                length,
                reason
            ),
            CutoutError::Io(e) => write!(f, "I/O error: {}", e),
            CutoutError::Http { url, status, reason } => {
                write!(f, "HTTP error from {}: {} {}", url, status, reason)
            }
            CutoutError::Format(msg) => write!(f, "FITS format error: {}", msg),
        }
    }
}

impl std::error::Error for CutoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CutoutError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CutoutError {
    fn from(error: io::Error) -> Self {
        // Errors that crossed a std::io::Read boundary carry the original inside
        let wraps_cutout_error = error
            .get_ref()
            .map_or(false, |inner| inner.is::<CutoutError>());
        if wraps_cutout_error {
            if let Some(inner) = error.into_inner() {
                if let Ok(original) = inner.downcast::<CutoutError>() {
                    return *original;
                }
            }
            return CutoutError::Format("unrecoverable wrapped error".to_string());
        }
        CutoutError::Io(error)
    }
}

impl From<reqwest::Error> for CutoutError {
    fn from(error: reqwest::Error) -> Self {
        CutoutError::Io(io::Error::new(io::ErrorKind::Other, error))
    }
}

/// Result type for cutout operations
pub type CutoutResult<T> = Result<T, CutoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(CutoutError::grammar("[", "unterminated").kind(), ErrorKind::Grammar);
        assert_eq!(CutoutError::NotFound("SCI".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CutoutError::range(0, 0, 600, 500, "too big").kind(), ErrorKind::Range);
        assert_eq!(CutoutError::Format("no END".into()).kind(), ErrorKind::Format);

        let http = CutoutError::Http { url: "http://x".into(), status: 404, reason: "Not Found".into() };
        assert_eq!(http.kind(), ErrorKind::Io);

        let io: CutoutError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_range_message_names_axis() {
        let msg = CutoutError::range(1, 10, 900, 500, "upper bound beyond axis").to_string();
        assert!(msg.contains("NAXIS2"));
        assert!(msg.contains("10:900"));
        assert!(msg.contains("500"));
    }
}
