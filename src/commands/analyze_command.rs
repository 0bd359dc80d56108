//! FITS structure analysis command
//!
//! This module implements the command for listing the HDUs of a FITS
//! file, local or remote.

use clap::ArgMatches;
use log::{debug, info};

use crate::api::FitsCutout;
use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::fits::errors::CutoutResult;
use crate::fits::hdu::Hdu;

/// Command for analyzing FITS file structure
pub struct AnalyzeCommand<'a> {
    /// Path or URL of the input file
    input_file: String,
    /// Whether to print every header card
    verbose: bool,
    api: &'a FitsCutout,
}

impl<'a> AnalyzeCommand<'a> {
    /// Create a new analyze command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `api` - Library facade
    pub fn new(args: &ArgMatches, api: &'a FitsCutout) -> CutoutResult<Self> {
        let input_file = required_arg(args, "input")?;
        let verbose = args.get_flag("verbose");

        Ok(AnalyzeCommand {
            input_file,
            verbose,
            api,
        })
    }

    /// Display every card of an HDU header
    fn display_header(&self, hdu: &Hdu) {
        println!("\nHeader of HDU #{}:", hdu.index);
        for card in hdu.header.cards() {
            println!("  {}", card);
        }
    }
}

impl<'a> Command for AnalyzeCommand<'a> {
    fn execute(&self) -> CutoutResult<()> {
        info!("Analyzing file: {}", self.input_file);

        print!("{}", self.api.analyze(&self.input_file)?);

        if self.verbose {
            debug!("Verbose mode enabled, listing header cards");
            for hdu in self.api.list_hdus(&self.input_file)? {
                self.display_header(&hdu);
            }
        }

        Ok(())
    }
}
