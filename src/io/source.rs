//! Random-access byte sources
//!
//! A [`RandomAccessSource`] is the one capability the cutout engine needs
//! from storage: position, read, report length. Local files and in-memory
//! buffers live here; the HTTP range backend is in `http_source`.

use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::fits::errors::CutoutResult;

/// Uniform seek/read/length/close contract over a byte store
///
/// Implementations own their transport state exclusively. A source is
/// used by one cutout operation at a time.
pub trait RandomAccessSource: Send {
    /// Move the cursor to an absolute position
    fn seek(&mut self, position: u64) -> CutoutResult<()>;

    /// Read up to `buf.len()` bytes at the cursor, advancing it
    ///
    /// Returns 0 at end of data.
    fn read(&mut self, buf: &mut [u8]) -> CutoutResult<usize>;

    /// Total size of the source in bytes
    fn length(&self) -> u64;

    /// Current cursor position
    fn position(&self) -> u64;

    /// Release the underlying resource; later reads fail
    fn close(&mut self) -> CutoutResult<()>;

    /// Human-readable location, for logs and error messages
    fn description(&self) -> &str;
}

impl<S: RandomAccessSource + ?Sized> RandomAccessSource for Box<S> {
    fn seek(&mut self, position: u64) -> CutoutResult<()> {
        (**self).seek(position)
    }

    fn read(&mut self, buf: &mut [u8]) -> CutoutResult<usize> {
        (**self).read(buf)
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn close(&mut self) -> CutoutResult<()> {
        (**self).close()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

pub(crate) fn closed_error(description: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, format!("source {} is closed", description))
}

pub(crate) fn out_of_bounds(position: u64, length: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("seek position {} outside source of length {}", position, length),
    )
}

/// Source backed by a local file
pub struct FileSource {
    /// Open handle, `None` once closed
    file: Option<File>,
    /// File size captured at open
    length: u64,
    /// Logical cursor
    position: u64,
    /// Path, for diagnostics
    path: String,
}

impl FileSource {
    /// Open a file for random access
    pub fn open<P: AsRef<Path>>(path: P) -> CutoutResult<Self> {
        let path_str = path.as_ref().display().to_string();
        let file = File::open(path.as_ref())?;
        let length = file.metadata()?.len();
        debug!("Opened file source {} ({} bytes)", path_str, length);

        Ok(FileSource {
            file: Some(file),
            length,
            position: 0,
            path: path_str,
        })
    }
}

impl RandomAccessSource for FileSource {
    fn seek(&mut self, position: u64) -> CutoutResult<()> {
        if position > self.length {
            return Err(out_of_bounds(position, self.length).into());
        }
        self.position = position;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> CutoutResult<usize> {
        let file = self.file.as_mut().ok_or_else(|| closed_error(&self.path))?;
        if buf.is_empty() || self.position >= self.length {
            return Ok(0);
        }

        file.seek(SeekFrom::Start(self.position))?;
        let n = file.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> CutoutResult<()> {
        if self.file.take().is_some() {
            debug!("Closed file source {}", self.path);
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.path
    }
}

/// Source backed by an in-memory buffer; never performs I/O
pub struct MemorySource {
    data: Vec<u8>,
    position: u64,
    closed: bool,
}

impl MemorySource {
    /// Wrap a byte buffer
    pub fn new(data: Vec<u8>) -> Self {
        MemorySource {
            data,
            position: 0,
            closed: false,
        }
    }
}

impl From<Vec<u8>> for MemorySource {
    fn from(data: Vec<u8>) -> Self {
        MemorySource::new(data)
    }
}

impl From<&[u8]> for MemorySource {
    fn from(data: &[u8]) -> Self {
        MemorySource::new(data.to_vec())
    }
}

impl RandomAccessSource for MemorySource {
    fn seek(&mut self, position: u64) -> CutoutResult<()> {
        if position > self.data.len() as u64 {
            return Err(out_of_bounds(position, self.data.len() as u64).into());
        }
        self.position = position;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> CutoutResult<usize> {
        if self.closed {
            return Err(closed_error("memory").into());
        }
        let start = self.position as usize;
        if start >= self.data.len() {
            return Ok(0);
        }

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> CutoutResult<()> {
        self.closed = true;
        Ok(())
    }

    fn description(&self) -> &str {
        "memory"
    }
}
