//! Cutout extraction
//!
//! This module turns a parsed [`SliceSpec`](crate::slice::SliceSpec) into
//! output: regions are resolved against each HDU, mapped onto byte reads,
//! and written behind rewritten headers.

mod region;
mod read_plan;
mod header_builder;
mod slicer;
#[cfg(test)]
mod tests;

pub use header_builder::HeaderBuilder;
pub use read_plan::{ReadPlan, Run};
pub use region::{Region, ResolvedRange};
pub use slicer::{CutoutSummary, NDimensionalSlicer, UnitPlan, UnitSummary, DEFAULT_BUFFER_SIZE};
