//! Logger utility for application-wide logging
//!
//! This module provides a custom logger implementation that works alongside
//! the standard log crate, but adds file output capabilities. When no log
//! file is configured the binary falls back to `env_logger`.

use std::fs::OpenOptions;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Log, Record, Metadata, LevelFilter};

/// File plus console logger
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Highest level written
    level: LevelFilter,
}

impl Logger {
    /// Creates a new logger appending to `log_file`
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    /// * `level` - Maximum level to record
    pub fn new(log_file: &str, level: LevelFilter) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level,
        })
    }

    /// Logs a message to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                writeln!(file, "{}", message)?;
                file.flush()?;
            }
        }
        Ok(())
    }

    /// Static method to initialize the global logger
    pub fn init_global_logger(log_file: &str, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }
}

/// Install the file logger when a log file is given, `env_logger` otherwise
///
/// `RUST_LOG` still refines the `env_logger` filter.
pub fn init_logging(log_file: Option<&str>, level: LevelFilter) -> io::Result<()> {
    match log_file {
        Some(path) => Logger::init_global_logger(path, level),
        None => {
            let _ = env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .format_timestamp(None)
                .try_init();
            Ok(())
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            // Console copy goes to stderr so stdout stays usable for reports
            eprintln!("{}", message);
        }
    }

    fn flush(&self) {
        // Already flushing in the log method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_file_logger_respects_level() {
        let path = std::env::temp_dir().join(format!("fitslice-logger-{}.log", std::process::id()));
        let path_str = path.to_str().unwrap();
        let _ = std::fs::remove_file(&path);

        let logger = Logger::new(path_str, LevelFilter::Info).unwrap();
        assert!(logger.enabled(&Metadata::builder().level(Level::Warn).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));

        logger.write_line("[INFO] cutout written").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[INFO] cutout written\n");
        let _ = std::fs::remove_file(&path);
    }
}
