//! Stream view over a random-access source
//!
//! [`SeekableStream`] keeps its own cursor and seeks the wrapped source
//! before every read, so code that expects `Read + Seek` semantics can run
//! unchanged over files, memory, or HTTP range requests.

use std::io::{self, Read, Seek, SeekFrom};

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::io::source::RandomAccessSource;

/// Sequential/seekable reader over a [`RandomAccessSource`]
pub struct SeekableStream<S: RandomAccessSource> {
    source: S,
    /// Logical cursor; the source's own cursor is never trusted
    position: u64,
}

impl<S: RandomAccessSource> SeekableStream<S> {
    /// Wrap a source, starting at offset 0
    pub fn new(source: S) -> Self {
        SeekableStream { source, position: 0 }
    }

    /// Current logical position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the underlying source
    pub fn length(&self) -> u64 {
        self.source.length()
    }

    /// Bytes remaining after the cursor
    pub fn available(&self) -> u64 {
        self.length().saturating_sub(self.position)
    }

    /// Location of the underlying source
    pub fn description(&self) -> &str {
        self.source.description()
    }

    /// Move to an absolute offset within `[0, length]`
    pub fn seek_to(&mut self, position: u64) -> CutoutResult<()> {
        if position > self.length() {
            return Err(CutoutError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek to {} beyond end of {} ({} bytes)", position, self.description(), self.length()),
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Advance by up to `n` bytes, clamped to the end of the source
    ///
    /// Returns the number of bytes actually skipped.
    pub fn skip(&mut self, n: u64) -> u64 {
        let skipped = n.min(self.available());
        self.position += skipped;
        skipped
    }

    /// Read a single byte; `None` at end of data
    pub fn read_byte(&mut self) -> CutoutResult<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_some(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Read up to `buf.len()` bytes; 0 means end of data
    pub fn read_some(&mut self, buf: &mut [u8]) -> CutoutResult<usize> {
        if buf.is_empty() || self.position >= self.length() {
            return Ok(0);
        }
        self.source.seek(self.position)?;
        let n = self.source.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    /// Fill `buf` completely or fail with an end-of-data error
    pub fn read_fully(&mut self, buf: &mut [u8]) -> CutoutResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_some(&mut buf[filled..])?;
            if n == 0 {
                return Err(CutoutError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "end of data in {} at offset {}: read {} of {} bytes",
                        self.description(),
                        self.position,
                        filled,
                        buf.len()
                    ),
                )));
            }
            filled += n;
        }
        Ok(())
    }

    /// Read exactly `len` bytes starting at `offset`
    pub fn read_exact_at(&mut self, offset: u64, len: usize) -> CutoutResult<Vec<u8>> {
        self.seek_to(offset)?;
        let mut buf = vec![0u8; len];
        self.read_fully(&mut buf)?;
        Ok(buf)
    }

    /// Release the underlying source
    pub fn close(&mut self) -> CutoutResult<()> {
        self.source.close()
    }
}

fn to_io_error(error: CutoutError) -> io::Error {
    match error {
        CutoutError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

impl<S: RandomAccessSource> Read for SeekableStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_some(buf).map_err(to_io_error)
    }
}

impl<S: RandomAccessSource> Seek for SeekableStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.length().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
        })?;
        self.seek_to(target).map_err(to_io_error)?;
        Ok(self.position)
    }
}
