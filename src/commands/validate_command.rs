//! Specification check command

use clap::ArgMatches;

use crate::commands::command_traits::Command;
use crate::commands::required_arg;
use crate::fits::errors::CutoutResult;
use crate::slice::SliceSpec;

/// Parses a specification and prints its normalized form
pub struct ValidateCommand {
    spec: SliceSpec,
}

impl ValidateCommand {
    pub fn new(args: &ArgMatches) -> CutoutResult<Self> {
        let spec = SliceSpec::parse(&required_arg(args, "validate")?)?;
        Ok(ValidateCommand { spec })
    }

    /// One line per selector
    pub fn describe(&self) -> Vec<String> {
        self.spec
            .iter()
            .map(|selector| {
                if selector.ranges.is_empty() {
                    format!("[{}] whole unit", selector.extension)
                } else {
                    let axes: Vec<String> = selector
                        .ranges
                        .iter()
                        .enumerate()
                        .map(|(i, r)| format!("NAXIS{}={}", i + 1, r))
                        .collect();
                    format!("[{}] {}", selector.extension, axes.join(" "))
                }
            })
            .collect()
    }
}

impl Command for ValidateCommand {
    fn execute(&self) -> CutoutResult<()> {
        println!("{}", self.spec);
        for line in self.describe() {
            println!("  {}", line);
        }
        Ok(())
    }
}
