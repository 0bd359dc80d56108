//! N-dimensional cutout engine
//!
//! [`NDimensionalSlicer`] owns one source for the duration of an operation.
//! A run has two phases: every selector is located and its ranges resolved
//! ([`NDimensionalSlicer::plan`]), and only then is output written. Errors
//! in the slice specification or against the source's geometry therefore
//! never leave partial output behind.

use log::{debug, info};
use std::io::Write;

use crate::fits::enumerator::{HduCursor, HduIndex};
use crate::fits::errors::{CutoutError, CutoutResult};
use crate::fits::hdu::Hdu;
use crate::fits::header::Header;
use crate::fits::writer::FitsWriter;
use crate::io::{RandomAccessSource, SeekableStream};
use crate::slice::{ExtensionId, ExtensionSelector, SliceSpec};

use super::header_builder::HeaderBuilder;
use super::read_plan::{ReadPlan, Run};
use super::region::Region;

/// Default size of the copy buffer for contiguous reads
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 20;

/// Everything needed to write one output unit, computed before writing
#[derive(Debug, Clone)]
pub struct UnitPlan {
    /// Selector this unit answers
    pub selector: ExtensionSelector,
    /// Source unit
    pub hdu: Hdu,
    /// Pixel box, or `None` for a verbatim copy
    pub region: Option<Region>,
    /// Output header before primary/extension conversion
    pub header: Header,
    /// Output data size, unpadded
    pub data_len: u64,
}

impl UnitPlan {
    pub fn is_verbatim(&self) -> bool {
        self.region.is_none()
    }

    /// Axis lengths of the output unit
    pub fn output_axes(&self) -> Vec<u64> {
        match &self.region {
            Some(region) => region.output_axes(),
            None => self.hdu.axes.clone(),
        }
    }
}

/// Outcome of one written unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    /// Normalized selector text
    pub selector: String,
    /// Index of the source unit
    pub hdu_index: usize,
    /// Output axis lengths
    pub axes: Vec<u64>,
    /// Data bytes written, unpadded
    pub data_len: u64,
    /// Whether the unit was copied as it is
    pub verbatim: bool,
}

/// Outcome of a cutout run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CutoutSummary {
    /// One entry per selector, in specification order
    pub units: Vec<UnitSummary>,
    /// Number of units in the output, including a synthesized primary
    pub output_units: usize,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Cutout engine over one random-access source
pub struct NDimensionalSlicer<S: RandomAccessSource> {
    stream: SeekableStream<S>,
    index: HduIndex,
    buffer_size: usize,
}

impl<S: RandomAccessSource> NDimensionalSlicer<S> {
    pub fn new(source: S) -> Self {
        NDimensionalSlicer {
            stream: SeekableStream::new(source),
            index: HduIndex::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Use a different copy buffer size (at least one byte)
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Location of the source
    pub fn description(&self) -> &str {
        self.stream.description()
    }

    /// Scan the whole source and return every unit
    pub fn hdus(&mut self) -> CutoutResult<Vec<Hdu>> {
        HduCursor::new(&mut self.index, &mut self.stream).collect()
    }

    /// Find the first unit matching `id`
    pub fn locate(&mut self, id: &ExtensionId) -> CutoutResult<Hdu> {
        let description = self.stream.description().to_string();
        let mut cursor = HduCursor::new(&mut self.index, &mut self.stream);

        while cursor.has_next()? {
            let hdu = cursor.next_hdu()?;
            if id.matches(&hdu) {
                debug!("Selector [{}] resolved to {}", id, hdu);
                return Ok(hdu);
            }
        }
        Err(CutoutError::NotFound(format!("extension [{}] not found in {}", id, description)))
    }

    /// Locate and validate every selector without writing anything
    pub fn plan(&mut self, spec: &SliceSpec) -> CutoutResult<Vec<UnitPlan>> {
        if spec.is_empty() {
            return Err(CutoutError::grammar("", "specification selects no extensions"));
        }
        spec.iter().map(|selector| self.plan_unit(selector)).collect()
    }

    fn plan_unit(&mut self, selector: &ExtensionSelector) -> CutoutResult<UnitPlan> {
        let hdu = self.locate(&selector.extension)?;

        if selector.ranges.is_empty() {
            return Ok(UnitPlan {
                selector: selector.clone(),
                header: HeaderBuilder::verbatim(&hdu.header),
                data_len: hdu.data_len,
                region: None,
                hdu,
            });
        }

        let first = &selector.ranges[0];
        if !hdu.kind.is_image() {
            return Err(CutoutError::range(
                0,
                first.lower,
                first.upper,
                0,
                format!("{} is a {} extension, only images can be cut", selector, hdu.kind.name()),
            ));
        }
        if hdu.axes.is_empty() {
            return Err(CutoutError::range(
                0,
                first.lower,
                first.upper,
                0,
                format!("{} has no data array (NAXIS = 0)", selector),
            ));
        }

        let region = Region::resolve(&selector.ranges, &hdu.axes)?;
        let data_len = region.pixel_count() * hdu.element_size();
        let header = HeaderBuilder::cutout(&hdu.header, &region);
        debug!("Planned {}: axes {:?} -> {:?}, {} bytes", selector, hdu.axes, region.output_axes(), data_len);

        Ok(UnitPlan {
            selector: selector.clone(),
            hdu,
            region: Some(region),
            header,
            data_len,
        })
    }

    /// Write the cutouts named by `spec` to `out` as one FITS stream
    pub fn slice<W: Write + ?Sized>(&mut self, spec: &SliceSpec, out: &mut W) -> CutoutResult<CutoutSummary> {
        self.slice_with_progress(spec, out, |_| {})
    }

    /// Like [`slice`](Self::slice), calling `on_unit` after each cutout
    pub fn slice_with_progress<W, F>(&mut self, spec: &SliceSpec, out: &mut W, mut on_unit: F) -> CutoutResult<CutoutSummary>
    where
        W: Write + ?Sized,
        F: FnMut(&UnitSummary),
    {
        let plans = self.plan(spec)?;

        // A single image cutout becomes the primary; anything else sits
        // behind a data-less primary
        let single_primary = plans.len() == 1 && plans[0].hdu.kind.is_image();
        let empty_primary = if single_primary {
            None
        } else {
            let primary = self.locate(&ExtensionId::Index(0))?;
            Some(HeaderBuilder::empty_primary(&primary.header))
        };

        info!("Writing {} cutout(s) from {}", plans.len(), self.stream.description());

        let mut writer = FitsWriter::new(out);
        if let Some(header) = &empty_primary {
            writer.begin_unit(header, 0)?;
            writer.finish_unit()?;
        }

        let mut units = Vec::with_capacity(plans.len());
        for plan in plans {
            let header = if single_primary {
                HeaderBuilder::into_primary(plan.header.clone())
            } else {
                HeaderBuilder::into_extension(plan.header.clone())
            };

            writer.begin_unit(&header, plan.data_len)?;
            self.write_unit(&plan, &mut writer)?;
            writer.finish_unit()?;

            let summary = UnitSummary {
                selector: plan.selector.to_string(),
                hdu_index: plan.hdu.index,
                axes: plan.output_axes(),
                data_len: plan.data_len,
                verbatim: plan.is_verbatim(),
            };
            on_unit(&summary);
            units.push(summary);
        }
        writer.flush()?;

        let summary = CutoutSummary {
            units,
            output_units: writer.units_written(),
            bytes_written: writer.bytes_written(),
        };
        info!("Wrote {} unit(s), {} bytes", summary.output_units, summary.bytes_written);
        Ok(summary)
    }

    fn write_unit<W: Write + ?Sized>(&mut self, plan: &UnitPlan, writer: &mut FitsWriter<'_, W>) -> CutoutResult<()> {
        let region = match &plan.region {
            Some(region) => region,
            None => return self.copy_span(plan.hdu.data_offset(), plan.hdu.data_len, writer),
        };

        let read_plan = ReadPlan::new(region, &plan.hdu.axes, plan.hdu.element_size(), plan.hdu.data_offset());
        debug!("{}: {} read(s) for {} bytes", plan.selector, read_plan.run_count(), read_plan.output_len());

        let element_size = plan.hdu.element_size() as usize;
        let mut span = Vec::new();
        let mut gathered = Vec::new();

        read_plan.for_each_run(|run| match run {
            Run::Span { offset, len } => self.copy_span(offset, len, writer),
            Run::Gather { offset, len, picks } => {
                span.resize(len as usize, 0);
                self.stream.seek_to(offset)?;
                self.stream.read_fully(&mut span)?;

                gathered.clear();
                for &pick in picks {
                    let at = pick as usize;
                    gathered.extend_from_slice(&span[at..at + element_size]);
                }
                writer.write_data(&gathered)
            }
        })
    }

    /// Copy `len` bytes at `offset` in buffer-sized chunks
    fn copy_span<W: Write + ?Sized>(&mut self, offset: u64, len: u64, writer: &mut FitsWriter<'_, W>) -> CutoutResult<()> {
        if len == 0 {
            return Ok(());
        }
        self.stream.seek_to(offset)?;

        let mut buffer = vec![0u8; len.min(self.buffer_size as u64) as usize];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(buffer.len() as u64) as usize;
            self.stream.read_fully(&mut buffer[..n])?;
            writer.write_data(&buffer[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Release the source
    pub fn close(&mut self) -> CutoutResult<()> {
        self.stream.close()
    }
}
