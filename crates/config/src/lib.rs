//! Folio configuration
//!
//! Settings live in one TOML file with an `[app]` and a `[playback]` table.
//! Missing keys take their defaults, out-of-range values are rejected, and
//! `FOLIO_*` environment variables can override single fields.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_config::Config;
//!
//! let config = Config::default_path()
//!     .map(|path| Config::load_or_default(&path))
//!     .unwrap_or_default()
//!     .with_process_env();
//!
//! println!("Seek back: {} ms", config.playback.seek_back_increment_ms);
//! ```

mod error;
mod source;
mod validation;

pub mod app_config;
pub mod env;
mod playback_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use validation::{ConfigSection, Issues};

pub use app_config::{AppConfig, LogLevel};
pub use playback_config::PlaybackConfig;

use serde::{Deserialize, Serialize};

/// Format version written to new files
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub app: AppConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Checks every section, returning all problems at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut issues = Vec::new();
        for result in [self.app.validate(), self.playback.validate()] {
            if let Err(mut found) = result {
                issues.append(&mut found);
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}
