//! Header/data units
//!
//! An [`Hdu`] is everything the cutout engine needs to know about one unit
//! in the source: where it starts, how big its header and data are, its
//! shape and element width, and its EXTNAME/EXTVER identity.

use log::debug;
use std::fmt;

use crate::fits::constants::layout::MAX_AXES;
use crate::fits::constants::{keywords, padded_len, xtension, VALID_BITPIX};
use crate::fits::errors::{CutoutError, CutoutResult};
use crate::fits::header::Header;

/// Kind of unit, from the first header card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HduKind {
    /// `SIMPLE = T` primary unit
    Primary,
    /// `XTENSION = 'IMAGE'`
    Image,
    /// `XTENSION = 'BINTABLE'`
    BinTable,
    /// `XTENSION = 'TABLE'`
    AsciiTable,
    /// Any other conforming extension
    Other(String),
}

impl HduKind {
    /// Whether the data unit is an N-dimensional pixel array
    pub fn is_image(&self) -> bool {
        matches!(self, HduKind::Primary | HduKind::Image)
    }

    pub fn name(&self) -> &str {
        match self {
            HduKind::Primary => "PRIMARY",
            HduKind::Image => xtension::IMAGE,
            HduKind::BinTable => xtension::BINTABLE,
            HduKind::AsciiTable => xtension::TABLE,
            HduKind::Other(name) => name,
        }
    }
}

/// One header/data unit in a source
#[derive(Debug, Clone)]
pub struct Hdu {
    /// Position in the source, 0 = primary
    pub index: usize,
    /// Byte offset of the first header block
    pub header_offset: u64,
    /// Header size on disk, padded
    pub header_len: u64,
    /// Data size without padding
    pub data_len: u64,
    /// Unit kind
    pub kind: HduKind,
    /// BITPIX value
    pub bitpix: i64,
    /// Axis lengths, NAXIS1 first
    pub axes: Vec<u64>,
    /// EXTNAME, trailing blanks removed
    pub extname: Option<String>,
    /// EXTVER, 1 when absent
    pub extver: u32,
    /// Parsed header cards
    pub header: Header,
}

impl Hdu {
    /// Interpret a header read at `header_offset` as unit number `index`
    pub fn from_header(index: usize, header_offset: u64, header: Header, header_len: u64) -> CutoutResult<Self> {
        let first = header
            .cards()
            .first()
            .ok_or_else(|| CutoutError::Format(format!("empty header at offset {}", header_offset)))?;

        let kind = match (index, first.keyword()) {
            (0, keywords::SIMPLE) => {
                if first.as_logical() != Some(true) {
                    return Err(CutoutError::Format("primary header has SIMPLE = F".to_string()));
                }
                HduKind::Primary
            }
            (0, other) => {
                return Err(CutoutError::Format(format!("not a FITS file: first keyword is '{}', expected SIMPLE", other)));
            }
            (_, keywords::XTENSION) => {
                let name = header
                    .get_string(keywords::XTENSION)
                    .ok_or_else(|| CutoutError::Format("XTENSION is not a string".to_string()))?;
                match name.as_str() {
                    xtension::IMAGE => HduKind::Image,
                    xtension::BINTABLE => HduKind::BinTable,
                    xtension::TABLE => HduKind::AsciiTable,
                    _ => HduKind::Other(name),
                }
            }
            (_, other) => {
                return Err(CutoutError::Format(format!(
                    "extension {} at offset {} starts with '{}', expected XTENSION",
                    index, header_offset, other
                )));
            }
        };

        let bitpix = header.required_integer(keywords::BITPIX)?;
        if !VALID_BITPIX.contains(&bitpix) {
            return Err(CutoutError::Format(format!("invalid BITPIX {}", bitpix)));
        }

        let naxis = header.required_integer(keywords::NAXIS)?;
        if naxis < 0 || naxis as usize > MAX_AXES {
            return Err(CutoutError::Format(format!("invalid NAXIS {}", naxis)));
        }

        let mut axes = Vec::with_capacity(naxis as usize);
        for i in 1..=naxis {
            let length = header.required_integer(&format!("{}{}", keywords::NAXIS, i))?;
            if length < 0 {
                return Err(CutoutError::Format(format!("negative NAXIS{} = {}", i, length)));
            }
            axes.push(length as u64);
        }

        let pcount = header.get_integer(keywords::PCOUNT).unwrap_or(0).max(0) as u64;
        let gcount = header.get_integer(keywords::GCOUNT).unwrap_or(1).max(0) as u64;
        let data_len = data_size(bitpix, &axes, pcount, gcount, header.get_logical(keywords::GROUPS) == Some(true))
            .ok_or_else(|| CutoutError::Format(format!("data size of HDU {} overflows: axes {:?}", index, axes)))?;

        let extname = header.get_string(keywords::EXTNAME);
        let extver = header
            .get_integer(keywords::EXTVER)
            .filter(|v| *v > 0)
            .map(|v| v as u32)
            .unwrap_or(1);

        debug!(
            "HDU {} ({}) at {}: BITPIX={} axes={:?} header={} data={}",
            index,
            kind.name(),
            header_offset,
            bitpix,
            axes,
            header_len,
            data_len
        );

        Ok(Hdu {
            index,
            header_offset,
            header_len,
            data_len,
            kind,
            bitpix,
            axes,
            extname,
            extver,
            header,
        })
    }

    /// Bytes per pixel
    pub fn element_size(&self) -> u64 {
        (self.bitpix.unsigned_abs()) / 8
    }

    /// Offset of the first data byte
    pub fn data_offset(&self) -> u64 {
        self.header_offset + self.header_len
    }

    /// Offset just past this unit's padded data, where the next unit starts
    pub fn next_offset(&self) -> u64 {
        self.data_offset() + padded_len(self.data_len)
    }

}

/// `|BITPIX|/8 * GCOUNT * (PCOUNT + product(NAXISn))`
///
/// Random-groups data skips the zero-length first axis. `None` when the
/// size does not fit in a `u64`.
fn data_size(bitpix: i64, axes: &[u64], pcount: u64, gcount: u64, groups: bool) -> Option<u64> {
    if axes.is_empty() {
        return Some(0);
    }
    let counted = if groups && axes[0] == 0 { &axes[1..] } else { axes };
    let elements = counted.iter().try_fold(1u64, |acc, &n| acc.checked_mul(n))?;
    (bitpix.unsigned_abs() / 8)
        .checked_mul(gcount)?
        .checked_mul(pcount.checked_add(elements)?)
}

impl fmt::Display for Hdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HDU #{} {}", self.index, self.kind.name())?;
        if let Some(name) = &self.extname {
            write!(f, " EXTNAME={} EXTVER={}", name, self.extver)?;
        }
        write!(f, " BITPIX={}", self.bitpix)?;
        if !self.axes.is_empty() {
            let dims: Vec<String> = self.axes.iter().map(|a| a.to_string()).collect();
            write!(f, " [{}]", dims.join("x"))?;
        }
        write!(f, " header@{} data@{} ({} bytes)", self.header_offset, self.data_offset(), self.data_len)
    }
}
