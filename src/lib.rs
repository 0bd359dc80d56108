pub mod fits;
pub mod io;
pub mod slice;
pub mod extractor;
pub mod config;
pub mod utils;
pub mod commands;
pub mod api;

pub use crate::api::{slice, FitsCutout};
pub use crate::config::CutoutConfig;

pub use extractor::{CutoutSummary, NDimensionalSlicer, UnitSummary};
pub use fits::{CutoutError, CutoutResult, ErrorKind, Hdu, HduKind};
pub use io::{open_source, FileSource, HttpOptions, HttpRangeSource, MemorySource, RandomAccessSource, SeekableStream};
pub use slice::{ExtensionId, ExtensionSelector, PixelRange, SliceSpec};
