//! Tests for the cutout engine

use crate::extractor::NDimensionalSlicer;
use crate::fits::card::Card;
use crate::fits::enumerator::{HduCursor, HduIndex};
use crate::fits::errors::{CutoutResult, ErrorKind};
use crate::fits::hdu::{Hdu, HduKind};
use crate::fits::tests::test_utils::{decode_i16, i16_ramp, FitsBuilder};
use crate::io::{MemorySource, SeekableStream};
use crate::slice::SliceSpec;

/// Primary without data, SCI and ERR 10x5 ramps (value = x + 10y), a table
fn sample() -> Vec<u8> {
    let wcs = vec![
        Card::string("CTYPE1", "RA---TAN", None),
        Card::float("CRPIX1", 5.0, None),
        Card::float("CDELT1", 1.0, None),
    ];
    FitsBuilder::new()
        .empty_primary()
        .image(Some("SCI"), Some(1), 16, &[10, 5], wcs, &i16_ramp(50))
        .image(Some("ERR"), None, 16, &[10, 5], vec![], &i16_ramp(50))
        .bintable("EVENTS", 12, 4)
        .build()
}

/// Primary holding a 4x3x2 cube (value = x + 4y + 12z)
fn cube() -> Vec<u8> {
    FitsBuilder::new()
        .primary(16, &[4, 3, 2], vec![], &i16_ramp(24))
        .image(Some("SCI"), None, 16, &[10, 5], vec![], &i16_ramp(50))
        .build()
}

fn cut(file: Vec<u8>, spec: &str) -> CutoutResult<Vec<u8>> {
    let mut slicer = NDimensionalSlicer::new(MemorySource::new(file));
    let mut out = Vec::new();
    slicer.slice(&SliceSpec::parse(spec)?, &mut out)?;
    Ok(out)
}

fn units(bytes: Vec<u8>) -> Vec<(Hdu, Vec<u8>)> {
    let mut stream = SeekableStream::new(MemorySource::new(bytes));
    let mut index = HduIndex::new();
    let hdus: Vec<Hdu> = HduCursor::new(&mut index, &mut stream).collect::<Result<_, _>>().unwrap();
    hdus.into_iter()
        .map(|hdu| {
            let data = stream.read_exact_at(hdu.data_offset(), hdu.data_len as usize).unwrap();
            (hdu, data)
        })
        .collect()
}

fn pixels(file: Vec<u8>, spec: &str) -> (Vec<u64>, Vec<i16>) {
    let out = units(cut(file, spec).unwrap());
    assert_eq!(out.len(), 1, "single image cutout is written as the primary");
    let (hdu, data) = &out[0];
    (hdu.axes.clone(), decode_i16(data))
}

#[test]
fn test_full_range_is_faithful_copy() {
    for spec in ["[SCI]", "[SCI][*,*]", "[1][0:9,0:4]"] {
        let out = units(cut(sample(), spec).unwrap());
        assert_eq!(out.len(), 1);
        let (hdu, data) = &out[0];
        assert_eq!(hdu.kind, HduKind::Primary, "spec {}", spec);
        assert_eq!(hdu.axes, vec![10, 5]);
        assert_eq!(hdu.extname.as_deref(), Some("SCI"));
        assert_eq!(data, &i16_ramp(50), "spec {}", spec);
        assert_eq!(hdu.header.get_float("CRPIX1"), Some(5.0));
        assert!(hdu.header.get("PCOUNT").is_none());
    }
}

#[test]
fn test_window() {
    let (axes, values) = pixels(sample(), "[SCI][2:4,1:2]");
    assert_eq!(axes, vec![3, 2]);
    assert_eq!(values, vec![12, 13, 14, 22, 23, 24]);
}

#[test]
fn test_flip_and_stride() {
    let (axes, values) = pixels(sample(), "[SCI][-*,0]");
    assert_eq!(axes, vec![10, 1]);
    assert_eq!(values, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);

    let (axes, values) = pixels(sample(), "[SCI][0:9:3,0:4:2]");
    assert_eq!(axes, vec![4, 3]);
    assert_eq!(values, vec![0, 3, 6, 9, 20, 23, 26, 29, 40, 43, 46, 49]);

    let (_, values) = pixels(sample(), "[SCI][8:2:3,4]");
    assert_eq!(values, vec![48, 45, 42]);

    let (_, values) = pixels(sample(), "[SCI][*,-*:2]");
    let expected: Vec<i16> = [4, 2, 0].iter().flat_map(|y| (0..10).map(move |x| x + 10 * y)).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_cube_cutout() {
    let (axes, values) = pixels(cube(), "[0][1:2,*,1:0]");
    assert_eq!(axes, vec![2, 3, 2]);
    let mut expected = Vec::new();
    for z in [1i16, 0] {
        for y in 0..3i16 {
            for x in [1i16, 2] {
                expected.push(x + 4 * y + 12 * z);
            }
        }
    }
    assert_eq!(values, expected);

    // missing trailing axes are taken whole
    let (axes, values) = pixels(cube(), "[1:1]");
    assert_eq!(axes, vec![1, 3, 2]);
    assert_eq!(values, vec![1, 5, 9, 13, 17, 21]);
}

#[test]
fn test_wcs_follows_cutout() {
    let out = units(cut(sample(), "[SCI][2:4,*]").unwrap());
    let header = &out[0].0.header;
    assert_eq!(header.get_float("CRPIX1"), Some(3.0));
    assert_eq!(header.get_float("CDELT1"), Some(1.0));

    let out = units(cut(sample(), "[SCI][-*,*]").unwrap());
    let header = &out[0].0.header;
    assert_eq!(header.get_float("CRPIX1"), Some(6.0));
    assert_eq!(header.get_float("CDELT1"), Some(-1.0));
}

#[test]
fn test_multiple_selectors_keep_order() {
    let bytes = sample();
    let mut slicer = NDimensionalSlicer::new(MemorySource::new(bytes));
    let mut out = Vec::new();
    let mut seen = Vec::new();
    let summary = slicer
        .slice_with_progress(&SliceSpec::parse("[SCI][0:1,0][ERR][SCI][0:1,0]").unwrap(), &mut out, |unit| {
            seen.push(unit.hdu_index)
        })
        .unwrap();

    assert_eq!(seen, vec![1, 2, 1]);
    assert_eq!(summary.units.len(), 3);
    assert_eq!(summary.output_units, 4);
    assert_eq!(summary.bytes_written, out.len() as u64);
    assert_eq!(out.len() % 2880, 0);
    assert!(summary.units[1].verbatim);

    let written = units(out);
    let names: Vec<Option<&str>> = written.iter().map(|(h, _)| h.extname.as_deref()).collect();
    assert_eq!(names, vec![None, Some("SCI"), Some("ERR"), Some("SCI")]);

    let (primary, data) = &written[0];
    assert_eq!(primary.kind, HduKind::Primary);
    assert!(primary.axes.is_empty());
    assert!(data.is_empty());
    assert_eq!(primary.header.get_logical("EXTEND"), Some(true));

    assert_eq!(written[1].0.kind, HduKind::Image);
    assert_eq!(decode_i16(&written[1].1), vec![0, 1]);
    assert_eq!(written[2].1, i16_ramp(50));
    assert_eq!(written[3].1, written[1].1);
}

#[test]
fn test_primary_cutout_becomes_extension() {
    let written = units(cut(cube(), "[0][0:1,0,0][SCI][0:0]").unwrap());
    assert_eq!(written.len(), 3);

    let (ext, data) = &written[1];
    assert_eq!(ext.kind, HduKind::Image);
    assert_eq!(ext.header.get_integer("PCOUNT"), Some(0));
    assert_eq!(ext.header.get_integer("GCOUNT"), Some(1));
    assert!(ext.header.get("EXTEND").is_none());
    assert_eq!(ext.axes, vec![2, 1, 1]);
    assert_eq!(decode_i16(data), vec![0, 1]);

    assert_eq!(decode_i16(&written[2].1), vec![0, 10, 20, 30, 40]);
    assert!(written[0].0.axes.is_empty());
}

#[test]
fn test_table_copied_as_extension() {
    let written = units(cut(sample(), "[EVENTS]").unwrap());
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].0.kind, HduKind::Primary);
    assert_eq!(written[1].0.kind, HduKind::BinTable);
    assert_eq!(written[1].1.len(), 48);
    assert_eq!(written[1].0.header.get_integer("TFIELDS"), Some(1));
}

#[test]
fn test_errors_write_nothing() {
    let cases = [
        ("[SCI][ERR][doesnotexist]", ErrorKind::NotFound),
        ("[9]", ErrorKind::NotFound),
        ("[SCI][0:10]", ErrorKind::Range),
        ("[SCI][*,*,*]", ErrorKind::Range),
        ("[ERR][SCI][0:3,5]", ErrorKind::Range),
        ("[EVENTS][0:1]", ErrorKind::Range),
        ("[0][0:1]", ErrorKind::Range),
    ];
    for (spec, kind) in cases {
        let mut slicer = NDimensionalSlicer::new(MemorySource::new(sample()));
        let mut out = Vec::new();
        let err = slicer.slice(&SliceSpec::parse(spec).unwrap(), &mut out).unwrap_err();
        assert_eq!(err.kind(), kind, "spec {}", spec);
        assert!(out.is_empty(), "spec {} wrote {} bytes", spec, out.len());
    }
}

#[test]
fn test_buffer_size_does_not_change_output() {
    let spec = SliceSpec::parse("[SCI][*,1:3][ERR][EVENTS]").unwrap();
    let mut expected = Vec::new();
    NDimensionalSlicer::new(MemorySource::new(sample())).slice(&spec, &mut expected).unwrap();

    let mut small = Vec::new();
    NDimensionalSlicer::new(MemorySource::new(sample()))
        .with_buffer_size(7)
        .slice(&spec, &mut small)
        .unwrap();
    assert_eq!(small, expected);
}

#[test]
fn test_locate_by_name_and_version() {
    let mut slicer = NDimensionalSlicer::new(MemorySource::new(sample()));
    let spec = SliceSpec::parse("[sci,1]").unwrap();
    let plans = slicer.plan(&spec).unwrap();
    assert_eq!(plans[0].hdu.index, 1);

    // missing EXTVER counts as 1
    let plans = slicer.plan(&SliceSpec::parse("[ERR,1]").unwrap()).unwrap();
    assert_eq!(plans[0].hdu.index, 2);
    assert_eq!(slicer.plan(&SliceSpec::parse("[ERR,2]").unwrap()).unwrap_err().kind(), ErrorKind::NotFound);
}
