//! HDU enumeration
//!
//! [`HduIndex`] remembers every unit already scanned. [`HduCursor`] walks
//! the index first and then, once the cached units run out, continues by
//! parsing headers sequentially from the source, appending what it finds.
//! The switch from indexed to sequential happens at most once per cursor.

use log::{debug, warn};

use crate::fits::constants::layout::BLOCK_SIZE;
use crate::fits::errors::{CutoutError, CutoutResult};
use crate::fits::hdu::Hdu;
use crate::fits::header::Header;
use crate::io::{RandomAccessSource, SeekableStream};

/// Units seen so far in one source
#[derive(Debug, Default)]
pub struct HduIndex {
    hdus: Vec<Hdu>,
    /// Set once a scan reached the end of the source
    complete: bool,
}

impl HduIndex {
    pub fn new() -> Self {
        HduIndex::default()
    }

    /// Number of units indexed so far
    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    /// Whether every unit in the source is indexed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn get(&self, index: usize) -> Option<&Hdu> {
        self.hdus.get(index)
    }

    pub fn hdus(&self) -> &[Hdu] {
        &self.hdus
    }

    /// Where sequential scanning resumes
    fn resume_offset(&self) -> u64 {
        self.hdus.last().map_or(0, Hdu::next_offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// Serving cached units; `next` is the position of the next one
    Indexed { next: usize },
    /// Parsing headers from the source at `offset`
    Sequential { offset: u64 },
    Exhausted,
}

/// Forward iterator over the units of a source
pub struct HduCursor<'a, S: RandomAccessSource> {
    index: &'a mut HduIndex,
    stream: &'a mut SeekableStream<S>,
    state: CursorState,
    /// Unit probed by `has_next` and not yet returned
    peeked: Option<Hdu>,
}

impl<'a, S: RandomAccessSource> HduCursor<'a, S> {
    /// Start a pass from the first unit
    pub fn new(index: &'a mut HduIndex, stream: &'a mut SeekableStream<S>) -> Self {
        let state = if !index.is_empty() {
            CursorState::Indexed { next: 0 }
        } else if index.is_complete() {
            CursorState::Exhausted
        } else {
            CursorState::Sequential { offset: 0 }
        };

        HduCursor {
            index,
            stream,
            state,
            peeked: None,
        }
    }

    /// Whether another unit exists; probes at most once per unit
    pub fn has_next(&mut self) -> CutoutResult<bool> {
        if self.peeked.is_none() {
            self.peeked = self.advance()?;
        }
        Ok(self.peeked.is_some())
    }

    /// Next unit, or a not-found error when the source is exhausted
    pub fn next_hdu(&mut self) -> CutoutResult<Hdu> {
        if let Some(hdu) = self.peeked.take() {
            return Ok(hdu);
        }
        self.advance()?
            .ok_or_else(|| CutoutError::NotFound(format!("no more HDUs in {}", self.stream.description())))
    }

    fn advance(&mut self) -> CutoutResult<Option<Hdu>> {
        loop {
            match self.state {
                CursorState::Indexed { next } => {
                    if let Some(hdu) = self.index.get(next) {
                        self.state = CursorState::Indexed { next: next + 1 };
                        return Ok(Some(hdu.clone()));
                    }
                    self.state = if self.index.is_complete() {
                        CursorState::Exhausted
                    } else {
                        debug!("Index exhausted after {} HDUs, scanning sequentially", self.index.len());
                        CursorState::Sequential { offset: self.index.resume_offset() }
                    };
                }
                CursorState::Sequential { offset } => {
                    return match self.scan_at(offset) {
                        Ok(Some(hdu)) => {
                            self.state = CursorState::Sequential { offset: hdu.next_offset() };
                            Ok(Some(hdu))
                        }
                        Ok(None) => {
                            self.index.complete = true;
                            self.state = CursorState::Exhausted;
                            Ok(None)
                        }
                        Err(e) => {
                            self.state = CursorState::Exhausted;
                            Err(e)
                        }
                    };
                }
                CursorState::Exhausted => return Ok(None),
            }
        }
    }

    /// Parse the unit whose header starts at `offset` and index it
    fn scan_at(&mut self, offset: u64) -> CutoutResult<Option<Hdu>> {
        let length = self.stream.length();
        let remaining = length.saturating_sub(offset);
        if remaining < BLOCK_SIZE as u64 {
            if remaining > 0 {
                warn!("Ignoring {} trailing bytes after last HDU in {}", remaining, self.stream.description());
            }
            return Ok(None);
        }

        self.stream.seek_to(offset)?;
        let (header, header_len) = Header::read_from(&mut *self.stream)?;
        let hdu = Hdu::from_header(self.index.len(), offset, header, header_len)?;

        let data_end = hdu.data_offset().checked_add(hdu.data_len).ok_or_else(|| {
            CutoutError::Format(format!("HDU {} data size {} overflows", hdu.index, hdu.data_len))
        })?;
        if data_end > length {
            return Err(CutoutError::Format(format!(
                "HDU {} data ends at {} beyond end of source ({} bytes)",
                hdu.index, data_end, length
            )));
        }

        self.index.hdus.push(hdu.clone());
        Ok(Some(hdu))
    }
}

impl<'a, S: RandomAccessSource> Iterator for HduCursor<'a, S> {
    type Item = CutoutResult<Hdu>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => self.peeked.take().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
