//! Cutout command
//!
//! Runs a slice specification against an input file or URL and writes the
//! resulting FITS file.

use clap::ArgMatches;
use log::info;

use crate::api::FitsCutout;
use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::fits::errors::CutoutResult;
use crate::slice::SliceSpec;
use crate::utils::ProgressTracker;

/// Command for writing a cutout file
pub struct CutoutCommand<'a> {
    /// Path or URL of the input file
    input_file: String,
    /// Path of the FITS file to write
    output_file: String,
    /// Parsed specification
    spec: SliceSpec,
    api: &'a FitsCutout,
}

impl<'a> CutoutCommand<'a> {
    /// Create a new cutout command
    ///
    /// The specification is parsed here so grammar errors surface before
    /// the input is opened.
    pub fn new(args: &ArgMatches, api: &'a FitsCutout) -> CutoutResult<Self> {
        let input_file = required_arg(args, "input")?;
        let output_file = required_arg(args, "output")?;
        let spec = SliceSpec::parse(&required_arg(args, "cutout")?)?;

        info!("Input file: {}", input_file);
        info!("Output file: {}", output_file);

        Ok(CutoutCommand {
            input_file,
            output_file,
            spec,
            api,
        })
    }
}

impl<'a> Command for CutoutCommand<'a> {
    fn execute(&self) -> CutoutResult<()> {
        info!("Cutting {} from {}", self.spec, self.input_file);

        let tracker = if self.api.config().progress {
            ProgressTracker::new(self.spec.len() as u64, "writing")
        } else {
            ProgressTracker::hidden()
        };

        let summary = self.api.cutout_to_file_with_progress(
            &self.input_file,
            &self.spec.to_string(),
            &self.output_file,
            |unit| {
                tracker.set_message(&unit.selector);
                tracker.increment(1);
            },
        )?;
        tracker.finish();

        for unit in &summary.units {
            let dims: Vec<String> = unit.axes.iter().map(|a| a.to_string()).collect();
            info!(
                "  {} from HDU #{}: {} ({} bytes{})",
                unit.selector,
                unit.hdu_index,
                if dims.is_empty() { "no data".to_string() } else { dims.join(" x ") },
                unit.data_len,
                if unit.verbatim { ", copied" } else { "" }
            );
        }
        println!(
            "Wrote {} HDU(s), {} bytes to {}",
            summary.output_units, summary.bytes_written, self.output_file
        );
        Ok(())
    }
}
