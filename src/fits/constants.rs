//! FITS format constants
//!
//! Block geometry and the keywords the cutout engine reads or rewrites.

/// Layout of header and data units
pub mod layout {
    /// Logical record size; headers and data are padded to this
    pub const BLOCK_SIZE: usize = 2880;

    /// Size of one header card
    pub const CARD_SIZE: usize = 80;

    /// Number of cards in one header block
    pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

    /// Width of the keyword field (columns 1-8)
    pub const KEYWORD_LENGTH: usize = 8;

    /// Column where a fixed-format value ends (column 30)
    pub const FIXED_VALUE_END: usize = 30;

    /// Highest NAXIS the standard allows
    pub const MAX_AXES: usize = 999;
}

/// Header keywords
pub mod keywords {
    pub const SIMPLE: &str = "SIMPLE";
    pub const XTENSION: &str = "XTENSION";
    pub const BITPIX: &str = "BITPIX";
    pub const NAXIS: &str = "NAXIS";
    pub const EXTEND: &str = "EXTEND";
    pub const PCOUNT: &str = "PCOUNT";
    pub const GCOUNT: &str = "GCOUNT";
    pub const GROUPS: &str = "GROUPS";
    pub const BSCALE: &str = "BSCALE";
    pub const BZERO: &str = "BZERO";
    pub const BLANK: &str = "BLANK";
    pub const EXTNAME: &str = "EXTNAME";
    pub const EXTVER: &str = "EXTVER";
    pub const CHECKSUM: &str = "CHECKSUM";
    pub const DATASUM: &str = "DATASUM";
    pub const END: &str = "END";

    // WCS keywords adjusted by cutouts, suffixed with the axis number
    pub const CRPIX: &str = "CRPIX";
    pub const CDELT: &str = "CDELT";
    pub const CTYPE: &str = "CTYPE";
}

/// XTENSION values
pub mod xtension {
    pub const IMAGE: &str = "IMAGE";
    pub const BINTABLE: &str = "BINTABLE";
    pub const TABLE: &str = "TABLE";
}

/// Valid BITPIX values
pub const VALID_BITPIX: [i64; 6] = [8, 16, 32, 64, -32, -64];

/// Number of bytes needed to pad `len` up to a whole block
pub fn padding_for(len: u64) -> u64 {
    let block = layout::BLOCK_SIZE as u64;
    (block - len % block) % block
}

/// `len` rounded up to a whole number of blocks
pub fn padded_len(len: u64) -> u64 {
    len + padding_for(len)
}
