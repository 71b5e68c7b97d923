//! `FOLIO_*` environment overrides

use crate::Config;
use std::str::FromStr;

pub const SEEK_BACK_INCREMENT_MS: &str = "FOLIO_PLAYBACK_SEEK_BACK_INCREMENT_MS";
pub const SEEK_FORWARD_INCREMENT_MS: &str = "FOLIO_PLAYBACK_SEEK_FORWARD_INCREMENT_MS";
pub const REWIND_ON_RESUME_SECS: &str = "FOLIO_PLAYBACK_REWIND_ON_RESUME_SECS";
pub const POSITION_REFRESH_MS: &str = "FOLIO_PLAYBACK_POSITION_REFRESH_MS";
pub const LOG_LEVEL: &str = "FOLIO_APP_LOG_LEVEL";

impl Config {
    /// Overrides fields from variables returned by `lookup`
    ///
    /// Unparseable values are skipped with a warning. The result is not
    /// validated; call [`Config::validate`] afterwards.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let playback = &mut self.playback;
        override_with(&lookup, SEEK_BACK_INCREMENT_MS, &mut playback.seek_back_increment_ms);
        override_with(&lookup, SEEK_FORWARD_INCREMENT_MS, &mut playback.seek_forward_increment_ms);
        override_with(&lookup, REWIND_ON_RESUME_SECS, &mut playback.rewind_on_resume_secs);
        override_with(&lookup, POSITION_REFRESH_MS, &mut playback.position_refresh_ms);
        override_with(&lookup, LOG_LEVEL, &mut self.app.log_level);
    }

    /// [`Config::apply_env_overrides`] against the process environment
    pub fn with_process_env(mut self) -> Self {
        self.apply_env_overrides(|name| std::env::var(name).ok());
        self
    }
}

fn override_with<T, F>(lookup: &F, name: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => {
            log::debug!("{} overrides config", name);
            *slot = value;
        }
        Err(e) => log::warn!("Ignoring {}={:?}: {}", name, raw, e),
    }
}
