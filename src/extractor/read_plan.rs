//! Byte geometry of a cutout
//!
//! A [`ReadPlan`] maps a resolved region onto the row-major layout of a
//! FITS data unit (NAXIS1 varies fastest) and yields the reads needed to
//! produce the cutout in output order. Leading axes taken whole merge into
//! one block; the first axis that is not whole decides how each block row
//! is read:
//!
//! - ascending, stride 1: one contiguous slab per outer position
//! - anything else after whole axes: one block read per selected index
//! - anything else on NAXIS1 itself: one span read per row, then a gather
//!   of the selected elements

use crate::fits::errors::CutoutResult;

use super::region::{Region, ResolvedRange};

/// One read against the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run<'p> {
    /// Copy `len` bytes at `offset` to the output as they are
    Span { offset: u64, len: u64 },
    /// Read `len` bytes at `offset`, then emit one element at each of
    /// `picks` (byte positions within the span)
    Gather { offset: u64, len: u64, picks: &'p [u64] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Whole,
    Slab,
    Blocks,
    Gather,
}

/// Reads that produce one cutout
#[derive(Debug, Clone)]
pub struct ReadPlan {
    data_offset: u64,
    element_size: u64,
    ranges: Vec<ResolvedRange>,
    /// Element stride of each axis
    strides: Vec<u64>,
    /// First axis that is not taken whole
    inner: usize,
    mode: Mode,
    picks: Vec<u64>,
}

impl ReadPlan {
    /// Plan reads for `region` of an array with `axes` whose data starts at
    /// `data_offset`
    pub fn new(region: &Region, axes: &[u64], element_size: u64, data_offset: u64) -> Self {
        let mut strides = Vec::with_capacity(axes.len());
        let mut stride = 1u64;
        for &len in axes {
            strides.push(stride);
            stride *= len;
        }

        let ranges = region.ranges.clone();
        let inner = ranges
            .iter()
            .zip(axes)
            .take_while(|(r, len)| r.is_full(**len))
            .count();

        let mode = match ranges.get(inner) {
            None => Mode::Whole,
            Some(r) if r.is_contiguous() => Mode::Slab,
            Some(_) if inner > 0 => Mode::Blocks,
            Some(_) => Mode::Gather,
        };

        let picks = match mode {
            Mode::Gather => {
                let row = &ranges[0];
                row.indices().map(|px| (px - row.min()) * element_size).collect()
            }
            _ => Vec::new(),
        };

        ReadPlan {
            data_offset,
            element_size,
            ranges,
            strides,
            inner,
            mode,
            picks,
        }
    }

    /// Bytes the plan produces
    pub fn output_len(&self) -> u64 {
        self.ranges.iter().map(ResolvedRange::count).product::<u64>() * self.element_size
    }

    /// Number of reads the plan issues
    pub fn run_count(&self) -> u64 {
        let outer: u64 = self.ranges.iter().skip(self.inner + 1).map(ResolvedRange::count).product();
        match self.mode {
            Mode::Whole | Mode::Slab | Mode::Gather => outer,
            Mode::Blocks => outer * self.ranges[self.inner].count(),
        }
    }

    /// Visit every read in output order
    pub fn for_each_run<F>(&self, mut f: F) -> CutoutResult<()>
    where
        F: FnMut(Run<'_>) -> CutoutResult<()>,
    {
        let e = self.element_size;

        if self.mode == Mode::Whole {
            return f(Run::Span { offset: self.data_offset, len: self.output_len() });
        }

        let m = self.inner;
        let axis = &self.ranges[m];
        let stride = self.strides[m];
        let outer_ranges = &self.ranges[m + 1..];
        let outer_strides = &self.strides[m + 1..];

        for_each_outer(outer_ranges, outer_strides, |base| {
            match self.mode {
                Mode::Slab => f(Run::Span {
                    offset: self.data_offset + (base + axis.start * stride) * e,
                    len: axis.count() * stride * e,
                }),
                Mode::Blocks => {
                    for px in axis.indices() {
                        f(Run::Span {
                            offset: self.data_offset + (base + px * stride) * e,
                            len: stride * e,
                        })?;
                    }
                    Ok(())
                }
                Mode::Gather => f(Run::Gather {
                    offset: self.data_offset + (base + axis.min()) * e,
                    len: (axis.max() - axis.min() + 1) * e,
                    picks: &self.picks,
                }),
                Mode::Whole => Ok(()),
            }
        })
    }
}

/// Odometer over the selected pixels of the outer axes, fastest first;
/// calls `f` with the element offset of each combination
fn for_each_outer<F>(ranges: &[ResolvedRange], strides: &[u64], mut f: F) -> CutoutResult<()>
where
    F: FnMut(u64) -> CutoutResult<()>,
{
    let mut counters = vec![0u64; ranges.len()];
    loop {
        let base: u64 = ranges
            .iter()
            .zip(strides)
            .zip(&counters)
            .map(|((r, s), &i)| r.pixel(i) * s)
            .sum();
        f(base)?;

        let mut axis = 0;
        loop {
            if axis == ranges.len() {
                return Ok(());
            }
            counters[axis] += 1;
            if counters[axis] < ranges[axis].count() {
                break;
            }
            counters[axis] = 0;
            axis += 1;
        }
    }
}
