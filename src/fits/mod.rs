//! FITS container handling
//!
//! This module provides just enough of the FITS format for cutouts:
//! card and header parsing, HDU geometry, sequential enumeration of the
//! units in a source, and a block-padding writer.

pub mod errors;
pub mod card;
pub mod header;
pub mod hdu;
pub mod enumerator;
pub mod writer;
pub(crate) mod constants;

pub use card::Card;
pub use enumerator::{HduCursor, HduIndex};
pub use errors::{CutoutError, CutoutResult, ErrorKind};
pub use hdu::{Hdu, HduKind};
pub use header::Header;
pub use writer::FitsWriter;

pub use constants::layout::BLOCK_SIZE;
