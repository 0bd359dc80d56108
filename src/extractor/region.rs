//! Cutout regions resolved against real axis lengths
//!
//! A [`Region`] is the pixel box an output unit covers: one
//! [`ResolvedRange`] per axis of the source HDU, with sentinels clamped and
//! every bound checked against the axis length.

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::slice::range::PixelRange;

/// Selected pixels along one real axis
///
/// `start` is the first source pixel read and `end` the last one, so a
/// flipped axis has `start > end`. Both lie in `[0, length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl ResolvedRange {
    /// Clamp sentinels and validate explicit bounds for one axis
    pub fn resolve(range: &PixelRange, axis: usize, length: u64) -> CutoutResult<Self> {
        if length == 0 {
            return Err(CutoutError::range(axis, range.lower, range.upper, length, "axis is empty"));
        }
        let last = length - 1;
        let clamp = |bound: u64| if bound == PixelRange::MAX { Ok(last) } else { Self::check(range, axis, length, bound) };

        let start = clamp(range.lower)?;
        let end = clamp(range.upper)?;
        Ok(ResolvedRange { start, end, step: range.step })
    }

    fn check(range: &PixelRange, axis: usize, length: u64, bound: u64) -> CutoutResult<u64> {
        if bound >= length {
            Err(CutoutError::range(
                axis,
                range.lower,
                range.upper,
                length,
                format!("pixel {} is outside the axis", bound),
            ))
        } else {
            Ok(bound)
        }
    }

    /// Every pixel of an axis, ascending
    pub fn full(length: u64) -> Self {
        ResolvedRange { start: 0, end: length.saturating_sub(1), step: 1 }
    }

    /// Number of pixels taken
    pub fn count(&self) -> u64 {
        self.start.abs_diff(self.end) / self.step + 1
    }

    pub fn is_descending(&self) -> bool {
        self.start > self.end
    }

    /// Whether the range covers the whole axis in storage order
    pub fn is_full(&self, length: u64) -> bool {
        self.start == 0 && self.end + 1 == length && self.step == 1
    }

    /// Ascending and stride 1, so the pixels are adjacent on disk
    pub fn is_contiguous(&self) -> bool {
        self.step == 1 && !self.is_descending()
    }

    /// Lowest pixel touched, which may be short of `end` when striding down
    pub fn min(&self) -> u64 {
        if self.is_descending() {
            self.start - (self.count() - 1) * self.step
        } else {
            self.start
        }
    }

    /// Highest pixel touched, which may be short of `end` when striding
    pub fn max(&self) -> u64 {
        if self.is_descending() {
            self.start
        } else {
            self.start + (self.count() - 1) * self.step
        }
    }

    /// Source pixel of output pixel `i`
    pub fn pixel(&self, i: u64) -> u64 {
        if self.is_descending() {
            self.start - i * self.step
        } else {
            self.start + i * self.step
        }
    }

    /// Source pixels in output order
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.count()).map(move |i| self.pixel(i))
    }
}

/// Pixel box of one cutout, NAXIS1 first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub ranges: Vec<ResolvedRange>,
}

impl Region {
    /// Resolve requested ranges against the axis lengths of an HDU
    ///
    /// Axes without a requested range are taken whole. More ranges than
    /// axes is an error.
    pub fn resolve(requested: &[PixelRange], axes: &[u64]) -> CutoutResult<Self> {
        if requested.len() > axes.len() {
            let extra = &requested[axes.len()];
            return Err(CutoutError::range(
                axes.len(),
                extra.lower,
                extra.upper,
                0,
                format!("{} ranges given for {} axes", requested.len(), axes.len()),
            ));
        }

        let mut ranges = Vec::with_capacity(axes.len());
        for (axis, &length) in axes.iter().enumerate() {
            let range = requested.get(axis).copied().unwrap_or_else(PixelRange::all);
            ranges.push(ResolvedRange::resolve(&range, axis, length)?);
        }
        Ok(Region { ranges })
    }

    /// Output axis lengths
    pub fn output_axes(&self) -> Vec<u64> {
        self.ranges.iter().map(ResolvedRange::count).collect()
    }

    /// Number of output pixels
    pub fn pixel_count(&self) -> u64 {
        self.ranges.iter().map(ResolvedRange::count).product()
    }

    /// Whether the region is the entire array
    pub fn is_full(&self, axes: &[u64]) -> bool {
        self.ranges.iter().zip(axes).all(|(r, &len)| r.is_full(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::errors::ErrorKind;

    #[test]
    fn test_sentinels_clamp() {
        let all = ResolvedRange::resolve(&PixelRange::all(), 0, 500).unwrap();
        assert_eq!((all.start, all.end), (0, 499));
        assert!(!all.is_descending());
        assert!(all.is_full(500));

        let flipped = ResolvedRange::resolve(&PixelRange::flipped(), 0, 500).unwrap();
        assert_eq!((flipped.start, flipped.end), (499, 0));
        assert!(flipped.is_descending());
        assert_eq!(flipped.count(), 500);
    }

    #[test]
    fn test_counts_and_indices() {
        let r = ResolvedRange::resolve(&PixelRange::new(1, 10).with_step(3), 0, 20).unwrap();
        assert_eq!(r.count(), 4);
        assert_eq!(r.indices().collect::<Vec<_>>(), vec![1, 4, 7, 10]);
        assert_eq!(r.max(), 10);

        let r = ResolvedRange::resolve(&PixelRange::new(0, 9).with_step(4), 0, 20).unwrap();
        assert_eq!(r.indices().collect::<Vec<_>>(), vec![0, 4, 8]);
        assert_eq!(r.max(), 8);

        let r = ResolvedRange::resolve(&PixelRange::new(9, 2).with_step(3), 0, 20).unwrap();
        assert_eq!(r.indices().collect::<Vec<_>>(), vec![9, 6, 3]);
        assert_eq!((r.min(), r.max()), (3, 9));
    }

    #[test]
    fn test_out_of_range() {
        let err = ResolvedRange::resolve(&PixelRange::new(10, 500), 1, 500).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        match err {
            CutoutError::Range { axis, upper, length, .. } => {
                assert_eq!((axis, upper, length), (1, 500, 500));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(ResolvedRange::resolve(&PixelRange::single(499), 0, 500).is_ok());
    }

    #[test]
    fn test_region_defaults_and_axis_mismatch() {
        let region = Region::resolve(&[PixelRange::new(2, 5)], &[10, 20, 3]).unwrap();
        assert_eq!(region.output_axes(), vec![4, 20, 3]);
        assert_eq!(region.pixel_count(), 240);
        assert!(!region.is_full(&[10, 20, 3]));
        assert!(Region::resolve(&[], &[10, 20]).unwrap().is_full(&[10, 20]));

        let err = Region::resolve(&[PixelRange::all(), PixelRange::all(), PixelRange::all()], &[10, 20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }
}
