//! Byte sources and stream adapters
//!
//! Everything the cutout engine reads goes through a
//! [`RandomAccessSource`], wrapped in a [`SeekableStream`].

pub mod seekable;
pub mod source;
pub mod http_source;

pub use http_source::{HttpOptions, HttpRangeSource};
pub use seekable::SeekableStream;
pub use source::{FileSource, MemorySource, RandomAccessSource};

use crate::fits::errors::CutoutResult;

/// Open a file path or an `http(s)://` URL as a boxed source
pub fn open_source(location: &str, http: &HttpOptions) -> CutoutResult<Box<dyn RandomAccessSource>> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(Box::new(HttpRangeSource::open(location, http)?))
    } else {
        Ok(Box::new(FileSource::open(location)?))
    }
}
