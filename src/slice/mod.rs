//! Cutout specification language
//!
//! Parses strings such as `[SCI,2][100:200,*:2]` into an ordered list of
//! [`ExtensionSelector`]s. Parsing is purely textual.

pub mod range;
pub mod selector;
pub mod parser;

pub use parser::SliceSpec;
pub use range::{format_ranges, parse_ranges, PixelRange};
pub use selector::{ExtensionId, ExtensionSelector};
