//! FITS output
//!
//! [`FitsWriter`] writes headers and data units to any `Write`, keeping
//! track of how many data bytes belong to the current unit so it can pad
//! to the block boundary when the unit is finished.

use log::debug;
use std::io::Write;

use crate::fits::constants::padding_for;
use crate::fits::errors::{CutoutError, CutoutResult};
use crate::fits::header::Header;

/// Streaming writer for a sequence of HDUs
pub struct FitsWriter<'w, W: Write + ?Sized> {
    out: &'w mut W,
    /// Data bytes written for the unit in progress
    unit_data: u64,
    /// Expected data size of the unit in progress
    unit_expected: u64,
    /// Total bytes written to `out`
    written: u64,
    units: usize,
}

impl<'w, W: Write + ?Sized> FitsWriter<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        FitsWriter {
            out,
            unit_data: 0,
            unit_expected: 0,
            written: 0,
            units: 0,
        }
    }

    /// Start a unit: write its header, expect `data_len` data bytes next
    pub fn begin_unit(&mut self, header: &Header, data_len: u64) -> CutoutResult<()> {
        let bytes = header.to_bytes();
        self.out.write_all(&bytes)?;
        self.written += bytes.len() as u64;
        self.unit_data = 0;
        self.unit_expected = data_len;
        Ok(())
    }

    /// Append data bytes to the current unit
    pub fn write_data(&mut self, data: &[u8]) -> CutoutResult<()> {
        self.out.write_all(data)?;
        self.unit_data += data.len() as u64;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Pad the current unit with zeros and check its size
    pub fn finish_unit(&mut self) -> CutoutResult<()> {
        if self.unit_data != self.unit_expected {
            return Err(CutoutError::Format(format!(
                "data unit size mismatch: wrote {} bytes, header declares {}",
                self.unit_data, self.unit_expected
            )));
        }
        let padding = padding_for(self.unit_data) as usize;
        if padding > 0 {
            self.out.write_all(&vec![0u8; padding])?;
            self.written += padding as u64;
        }
        self.units += 1;
        debug!("Finished output unit {} ({} data bytes, {} padding)", self.units, self.unit_data, padding);
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> CutoutResult<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Total bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Units completed so far
    pub fn units_written(&self) -> usize {
        self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::card::Card;

    #[test]
    fn test_unit_padding() {
        let header = Header::from_cards(vec![
            Card::logical("SIMPLE", true, None),
            Card::integer("BITPIX", 8, None),
            Card::integer("NAXIS", 1, None),
            Card::integer("NAXIS1", 3, None),
        ]);

        let mut out = Vec::new();
        let mut writer = FitsWriter::new(&mut out);
        writer.begin_unit(&header, 3).unwrap();
        writer.write_data(&[1, 2]).unwrap();
        writer.write_data(&[3]).unwrap();
        writer.finish_unit().unwrap();
        assert_eq!(writer.bytes_written(), 5760);
        assert_eq!(writer.units_written(), 1);

        assert_eq!(out.len(), 5760);
        assert_eq!(&out[2880..2883], &[1, 2, 3]);
        assert!(out[2883..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let header = Header::from_cards(vec![Card::logical("SIMPLE", true, None)]);
        let mut out = Vec::new();
        let mut writer = FitsWriter::new(&mut out);
        writer.begin_unit(&header, 10).unwrap();
        writer.write_data(&[0; 4]).unwrap();
        assert!(writer.finish_unit().is_err());
    }
}
