//! Reading and writing the TOML file

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use directories::ProjectDirs;
use std::io::ErrorKind;
use std::fs;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "config.toml";

impl Config {
    /// Per-user location, e.g. `~/.config/folio/config.toml` on Linux
    ///
    /// `None` when the platform has no home directory to anchor it.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "folio").map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Parses and validates in-memory TOML. Omitted keys keep their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Self::parse(text, "<string>")
    }

    /// Loads the file at `path`, treating a missing file as all defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, &path.display().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Like [`Config::load`] but never fails; problems are logged
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring config file: {}", e);
            Self::default()
        })
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the config to `path`, creating parent directories
    ///
    /// Invalid values are refused so the file always loads back.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate().map_err(ConfigError::Invalid)?;
        let text = self.to_toml_string()?;

        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)?;

        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    fn parse(text: &str, origin: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "{} declares config version {}, this build reads {}",
                origin,
                config.version,
                CONFIG_VERSION
            );
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}
