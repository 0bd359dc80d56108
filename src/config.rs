//! Runtime configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Unknown keys are ignored.
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! user_agent = "fitslice/0.1"
//!
//! [logging]
//! level = "info"
//! file = "fitslice.log"
//!
//! [output]
//! progress = true
//! ```

use log::{debug, LevelFilter};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::fits::errors::{CutoutError, CutoutResult};
use crate::io::HttpOptions;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "fitslice.toml";

/// Settings for one run
#[derive(Debug, Clone)]
pub struct CutoutConfig {
    /// Transport settings for `http(s)` sources
    pub http: HttpOptions,
    /// Maximum log level
    pub log_level: LevelFilter,
    /// Log file; console-only logging when `None`
    pub log_file: Option<String>,
    /// Show a progress bar while writing cutouts
    pub progress: bool,
}

impl Default for CutoutConfig {
    fn default() -> Self {
        CutoutConfig {
            http: HttpOptions::default(),
            log_level: LevelFilter::Info,
            log_file: None,
            progress: true,
        }
    }
}

impl CutoutConfig {
    /// Parse configuration from TOML text
    pub fn from_str(content: &str) -> CutoutResult<Self> {
        let toml_value: toml::Value = content
            .parse()
            .map_err(|e| CutoutError::Format(format!("invalid configuration: {}", e)))?;

        let mut config = CutoutConfig::default();

        if let Some(http) = toml_value.get("http") {
            if let Some(secs) = http.get("timeout_secs").and_then(|v| v.as_integer()) {
                config.http.timeout = if secs > 0 { Some(Duration::from_secs(secs as u64)) } else { None };
            }
            if let Some(agent) = http.get("user_agent").and_then(|v| v.as_str()) {
                config.http.user_agent = agent.to_string();
            }
        }

        if let Some(logging) = toml_value.get("logging") {
            if let Some(level) = logging.get("level").and_then(|v| v.as_str()) {
                config.log_level = parse_level(level)?;
            }
            if let Some(file) = logging.get("file").and_then(|v| v.as_str()) {
                config.log_file = Some(file.to_string());
            }
        }

        if let Some(progress) = toml_value
            .get("output")
            .and_then(|o| o.get("progress"))
            .and_then(|v| v.as_bool())
        {
            config.progress = progress;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CutoutResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        debug!("Loaded configuration from {}", path.as_ref().display());
        Self::from_str(&contents)
    }

    /// Load `path` if given, else `fitslice.toml` if it exists, else defaults
    pub fn load(path: Option<&str>) -> CutoutResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// Parse a level name such as `debug` or `warn`
pub fn parse_level(level: &str) -> CutoutResult<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| CutoutError::Format(format!("unknown log level '{}'", level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::errors::ErrorKind;

    #[test]
    fn test_full_file() {
        let config = CutoutConfig::from_str(
            r#"
            [http]
            timeout_secs = 5
            user_agent = "survey-bot/2"

            [logging]
            level = "debug"
            file = "cutouts.log"

            [output]
            progress = false
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.http.user_agent, "survey-bot/2");
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file.as_deref(), Some("cutouts.log"));
        assert!(!config.progress);
    }

    #[test]
    fn test_defaults_and_unknown_keys() {
        let config = CutoutConfig::from_str("[extra]\nanything = 1\n").unwrap();
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.progress);
        assert!(config.log_file.is_none());
        assert_eq!(config.http.timeout, HttpOptions::default().timeout);

        let config = CutoutConfig::from_str("[http]\ntimeout_secs = 0\n").unwrap();
        assert!(config.http.timeout.is_none());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(CutoutConfig::from_str("[http").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(CutoutConfig::from_str("[logging]\nlevel = \"loud\"").unwrap_err().kind(), ErrorKind::Format);
    }
}
