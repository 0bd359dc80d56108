//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod cutout_command;
pub mod validate_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use cutout_command::CutoutCommand;
pub use validate_command::ValidateCommand;

use clap::ArgMatches;
use std::io;

use crate::api::FitsCutout;
use crate::fits::errors::{CutoutError, CutoutResult};

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the command-line arguments and creates
/// the appropriate command instance for execution.
pub struct FitsliceCommandFactory;

impl FitsliceCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        FitsliceCommandFactory
    }
}

impl Default for FitsliceCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for FitsliceCommandFactory {
    fn create_command(&self, args: &ArgMatches, api: &'a FitsCutout) -> CutoutResult<Box<dyn Command + 'a>> {
        if args.contains_id("validate") {
            Ok(Box::new(ValidateCommand::new(args)?))
        } else if args.contains_id("cutout") {
            Ok(Box::new(CutoutCommand::new(args, api)?))
        } else {
            // Default to analyze command
            Ok(Box::new(AnalyzeCommand::new(args, api)?))
        }
    }
}

/// String argument that must be present
pub(crate) fn required_arg(args: &ArgMatches, name: &str) -> CutoutResult<String> {
    args.get_one::<String>(name).cloned().ok_or_else(|| {
        CutoutError::Io(io::Error::new(io::ErrorKind::InvalidInput, format!("missing argument <{}>", name)))
    })
}
