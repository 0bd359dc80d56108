use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::CutoutConfig;
use crate::extractor::{CutoutSummary, NDimensionalSlicer, UnitSummary};
use crate::fits::errors::CutoutResult;
use crate::fits::hdu::Hdu;
use crate::io::{open_source, RandomAccessSource};
use crate::slice::SliceSpec;

/// Main interface to the fitslice library
pub struct FitsCutout {
    config: CutoutConfig,
}

impl Default for FitsCutout {
    fn default() -> Self {
        FitsCutout::new(CutoutConfig::default())
    }
}

impl FitsCutout {
    /// Create a new instance with the given settings
    pub fn new(config: CutoutConfig) -> Self {
        FitsCutout { config }
    }

    pub fn config(&self) -> &CutoutConfig {
        &self.config
    }

    /// Open a path or `http(s)` URL with the configured transport settings
    pub fn open_source(&self, location: &str) -> CutoutResult<Box<dyn RandomAccessSource>> {
        open_source(location, &self.config.http)
    }

    /// Cut `spec` out of `source` and write the result to `out`
    ///
    /// The source is closed before returning, whether or not the cutout
    /// succeeded.
    pub fn slice<S, W>(&self, source: S, spec: &str, out: &mut W) -> CutoutResult<CutoutSummary>
    where
        S: RandomAccessSource,
        W: Write + ?Sized,
    {
        self.slice_with_progress(source, spec, out, |_| {})
    }

    /// Like [`slice`](Self::slice), calling `on_unit` after each cutout
    pub fn slice_with_progress<S, W, F>(&self, source: S, spec: &str, out: &mut W, on_unit: F) -> CutoutResult<CutoutSummary>
    where
        S: RandomAccessSource,
        W: Write + ?Sized,
        F: FnMut(&UnitSummary),
    {
        with_slicer(source, |slicer| {
            let spec = SliceSpec::parse(spec)?;
            slicer.slice_with_progress(&spec, out, on_unit)
        })
    }

    /// Cut `spec` out of `input` (path or URL) into the file `output`
    ///
    /// Output goes to `<output>.part` first and is renamed into place only
    /// on success; a failed run leaves no output file behind.
    pub fn cutout_to_file<P: AsRef<Path>>(&self, input: &str, spec: &str, output: P) -> CutoutResult<CutoutSummary> {
        self.cutout_to_file_with_progress(input, spec, output, |_| {})
    }

    /// Like [`cutout_to_file`](Self::cutout_to_file), calling `on_unit`
    /// after each cutout
    pub fn cutout_to_file_with_progress<P, F>(&self, input: &str, spec: &str, output: P, on_unit: F) -> CutoutResult<CutoutSummary>
    where
        P: AsRef<Path>,
        F: FnMut(&UnitSummary),
    {
        let output = output.as_ref();
        let parsed = SliceSpec::parse(spec)?;
        let source = self.open_source(input)?;

        let partial = partial_path(output);
        debug!("Writing cutout to {}", partial.display());
        let file = File::create(&partial)?;
        let mut writer = BufWriter::new(file);

        let result = with_slicer(source, |slicer| slicer.slice_with_progress(&parsed, &mut writer, on_unit));
        drop(writer);

        match result {
            Ok(summary) => {
                fs::rename(&partial, output)?;
                info!("Cutout {} of {} written to {}", parsed, input, output.display());
                Ok(summary)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!("Could not remove partial output {}: {}", partial.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Every HDU in `input`
    pub fn list_hdus(&self, input: &str) -> CutoutResult<Vec<Hdu>> {
        let source = self.open_source(input)?;
        with_slicer(source, |slicer| slicer.hdus())
    }

    /// Analyze a FITS file and return a report on its structure
    pub fn analyze(&self, input: &str) -> CutoutResult<String> {
        let hdus = self.list_hdus(input)?;

        let mut result = String::from("FITS Analysis Results:\n");
        result.push_str(&format!("  Source: {}\n", input));
        result.push_str(&format!("  Number of HDUs: {}\n", hdus.len()));

        for hdu in &hdus {
            result.push_str(&format!("\nHDU #{} ({})\n", hdu.index, hdu.kind.name()));
            if let Some(name) = &hdu.extname {
                result.push_str(&format!("  EXTNAME: {} (EXTVER {})\n", name, hdu.extver));
            }
            result.push_str(&format!("  BITPIX: {}\n", hdu.bitpix));
            if hdu.axes.is_empty() {
                result.push_str("  Axes: none\n");
            } else {
                let dims: Vec<String> = hdu.axes.iter().map(|a| a.to_string()).collect();
                result.push_str(&format!("  Axes: {}\n", dims.join(" x ")));
            }
            result.push_str(&format!("  Header: offset {}, {} bytes, {} cards\n", hdu.header_offset, hdu.header_len, hdu.header.len()));
            result.push_str(&format!("  Data: offset {}, {} bytes\n", hdu.data_offset(), hdu.data_len));
        }

        Ok(result)
    }
}

/// Cut `spec` out of `source` into `out` with default settings
pub fn slice<S, W>(source: S, spec: &str, out: &mut W) -> CutoutResult<CutoutSummary>
where
    S: RandomAccessSource,
    W: Write + ?Sized,
{
    FitsCutout::default().slice(source, spec, out)
}

/// Run `op` on a slicer over `source`, closing the source afterwards
fn with_slicer<S, T, F>(source: S, op: F) -> CutoutResult<T>
where
    S: RandomAccessSource,
    F: FnOnce(&mut NDimensionalSlicer<S>) -> CutoutResult<T>,
{
    let mut slicer = NDimensionalSlicer::new(source);
    let result = op(&mut slicer);
    let closed = slicer.close();
    let value = result?;
    closed?;
    Ok(value)
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
