//! Output header construction
//!
//! Every output unit starts from a copy of its source header. This module
//! rewrites the structural keywords for the cut shape, keeps the world
//! coordinate reference consistent with the new pixel grid, and converts
//! headers between primary and extension form.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::fits::card::Card;
use crate::fits::constants::{keywords, xtension};
use crate::fits::header::Header;

use super::region::{Region, ResolvedRange};

lazy_static! {
    static ref NAXIS_N: Regex = Regex::new(r"^NAXIS(\d+)$").unwrap();
    static ref CRPIX_KEY: Regex = Regex::new(r"^CRPIX(\d+)([A-Z]?)$").unwrap();
    static ref CDELT_KEY: Regex = Regex::new(r"^CDELT(\d+)([A-Z]?)$").unwrap();
    static ref CD_KEY: Regex = Regex::new(r"^CD(\d+)_(\d+)([A-Z]?)$").unwrap();
}

/// Keywords that describe a primary data array and go away with it
const PRIMARY_DATA_KEYWORDS: [&str; 8] = [
    keywords::BSCALE,
    keywords::BZERO,
    keywords::BLANK,
    keywords::GROUPS,
    keywords::PCOUNT,
    keywords::GCOUNT,
    keywords::CHECKSUM,
    keywords::DATASUM,
];

/// Builds the headers written to the output stream
pub struct HeaderBuilder;

impl HeaderBuilder {
    /// Header for a cutout of `source` covering `region`
    ///
    /// NAXISn become the region's output lengths, checksums are dropped
    /// since the data changes, and the WCS is shifted for offset, stride
    /// and flip.
    pub fn cutout(source: &Header, region: &Region) -> Header {
        let mut header = source.clone();

        for (i, range) in region.ranges.iter().enumerate() {
            let keyword = format!("{}{}", keywords::NAXIS, i + 1);
            set_integer(&mut header, &keyword, range.count() as i64);
        }
        Self::strip_checksums(&mut header);
        adjust_wcs(&mut header, region);

        header
    }

    /// Header for a verbatim copy; only the checksums go since the unit may
    /// be converted between primary and extension form
    pub fn verbatim(source: &Header) -> Header {
        let mut header = source.clone();
        Self::strip_checksums(&mut header);
        header
    }

    /// Drop `CHECKSUM` and `DATASUM`
    pub fn strip_checksums(header: &mut Header) {
        header.remove(keywords::CHECKSUM);
        header.remove(keywords::DATASUM);
    }

    /// Turn an IMAGE extension header into a primary header
    ///
    /// `XTENSION` becomes `SIMPLE = T` and `PCOUNT`/`GCOUNT` are dropped.
    /// EXTNAME and EXTVER stay. Primary headers pass through unchanged.
    pub fn into_primary(mut header: Header) -> Header {
        if first_keyword(&header) == Some(keywords::XTENSION) {
            header.replace_at(0, Card::logical(keywords::SIMPLE, true, Some("conforms to FITS standard")));
            header.remove(keywords::PCOUNT);
            header.remove(keywords::GCOUNT);
            debug!("Converted extension header to primary form");
        }
        header
    }

    /// Turn a primary header into an IMAGE extension header
    ///
    /// `SIMPLE` becomes `XTENSION = 'IMAGE   '`, `EXTEND` is dropped and
    /// `PCOUNT = 0`, `GCOUNT = 1` follow the last NAXISn. Extension headers
    /// pass through unchanged.
    pub fn into_extension(mut header: Header) -> Header {
        if first_keyword(&header) != Some(keywords::SIMPLE) {
            return header;
        }

        header.replace_at(0, Card::string(keywords::XTENSION, xtension::IMAGE, Some("image extension")));
        header.remove(keywords::EXTEND);
        header.remove(keywords::PCOUNT);
        header.remove(keywords::GCOUNT);

        let after_axes = header
            .cards()
            .iter()
            .rposition(|c| c.keyword() == keywords::NAXIS || NAXIS_N.is_match(c.keyword()))
            .map_or(header.len(), |i| i + 1);
        header.insert(after_axes, Card::integer(keywords::PCOUNT, 0, Some("number of parameters")));
        header.insert(after_axes + 1, Card::integer(keywords::GCOUNT, 1, Some("number of groups")));
        debug!("Converted primary header to IMAGE extension form");
        header
    }

    /// Data-less primary header that fronts a multi-unit output
    ///
    /// Derived from the source primary so its metadata carries over, with
    /// `NAXIS = 0`, `EXTEND = T` and every array-specific keyword removed.
    pub fn empty_primary(source_primary: &Header) -> Header {
        let mut header = source_primary.clone();

        header.remove_where(|kw| NAXIS_N.is_match(kw));
        for keyword in PRIMARY_DATA_KEYWORDS {
            header.remove(keyword);
        }

        let naxis_at = header.position(keywords::NAXIS).unwrap_or(header.len().min(2));
        header.set(Card::integer(keywords::NAXIS, 0, Some("no data in primary HDU")), naxis_at);
        let naxis_at = header.position(keywords::NAXIS).unwrap_or(naxis_at);
        header.set(Card::logical(keywords::EXTEND, true, Some("extensions follow")), naxis_at + 1);

        header
    }
}

fn first_keyword(header: &Header) -> Option<&str> {
    header.cards().first().map(Card::keyword)
}

/// Replace an integer keyword in place, keeping its comment
fn set_integer(header: &mut Header, keyword: &str, value: i64) {
    let comment = header.get(keyword).and_then(Card::comment).map(str::to_string);
    let fallback = header.len();
    header.set(Card::integer(keyword, value, comment.as_deref()), fallback);
}

/// Scale applied to pixel spacing along an axis: stride times direction
fn scale_factor(range: &ResolvedRange) -> f64 {
    let sign = if range.is_descending() { -1.0 } else { 1.0 };
    range.step as f64 * sign
}

/// Whether the output grid of an axis equals the source grid
fn is_identity(range: &ResolvedRange) -> bool {
    range.start == 0 && range.step == 1 && !range.is_descending()
}

/// Reference pixel in the cutout's 1-based grid
fn shifted_crpix(crpix: f64, range: &ResolvedRange) -> f64 {
    let start = range.start as f64;
    let step = range.step as f64;
    if range.is_descending() {
        (start + 1.0 - crpix) / step + 1.0
    } else {
        (crpix - start - 1.0) / step + 1.0
    }
}

fn axis_range<'r>(region: &'r Region, axis: &str) -> Option<&'r ResolvedRange> {
    let axis: usize = axis.parse().ok()?;
    region.ranges.get(axis.checked_sub(1)?).filter(|r| !is_identity(r))
}

/// Shift `CRPIXja`, scale `CDELTja` and column `j` of `CDi_ja`
///
/// Headers that describe a flipped or strided axis only through `CTYPEj`
/// or `CRPIXj`, without any scale keyword, get an explicit `CDELTj`.
fn adjust_wcs(header: &mut Header, region: &Region) {
    let mut updates = Vec::new();
    let mut has_cd_matrix = false;

    for (pos, card) in header.cards().iter().enumerate() {
        let keyword = card.keyword();
        if let Some(caps) = CRPIX_KEY.captures(keyword) {
            if let (Some(range), Some(value)) = (axis_range(region, &caps[1]), card.as_float()) {
                updates.push((pos, Card::float(keyword, shifted_crpix(value, range), card.comment())));
            }
        } else if let Some(caps) = CDELT_KEY.captures(keyword) {
            if let (Some(range), Some(value)) = (axis_range(region, &caps[1]), card.as_float()) {
                updates.push((pos, Card::float(keyword, value * scale_factor(range), card.comment())));
            }
        } else if let Some(caps) = CD_KEY.captures(keyword) {
            has_cd_matrix |= caps[3].is_empty();
            if let (Some(range), Some(value)) = (axis_range(region, &caps[2]), card.as_float()) {
                updates.push((pos, Card::float(keyword, value * scale_factor(range), card.comment())));
            }
        }
    }

    for (pos, card) in updates {
        debug!("WCS: {}", card);
        header.replace_at(pos, card);
    }

    if has_cd_matrix {
        return;
    }
    for (i, range) in region.ranges.iter().enumerate() {
        let factor = scale_factor(range);
        if factor == 1.0 {
            continue;
        }
        let axis = i + 1;
        let cdelt = format!("{}{}", keywords::CDELT, axis);
        if header.get(&cdelt).is_some() {
            continue;
        }
        let anchor = [format!("{}{}", keywords::CRPIX, axis), format!("{}{}", keywords::CTYPE, axis)]
            .iter()
            .filter_map(|kw| header.position(kw))
            .max();
        if let Some(at) = anchor {
            debug!("WCS: inserting {} = {}", cdelt, factor);
            header.insert(at + 1, Card::float(&cdelt, factor, Some("pixel scale of cutout")));
        }
    }
}
