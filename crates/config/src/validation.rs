//! Per-section value checks

use crate::error::ValidationError;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// A `[section]` of the config file that knows its own legal values
pub trait ConfigSection {
    /// Table name in the TOML file, used as the field prefix in reports
    const NAME: &'static str;

    /// Pushes one entry per rejected field
    fn check(&self, issues: &mut Issues);

    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut issues = Issues::new(Self::NAME);
        self.check(&mut issues);
        issues.finish()
    }
}

/// Collector handed to [`ConfigSection::check`]
#[derive(Debug)]
pub struct Issues {
    section: &'static str,
    found: Vec<ValidationError>,
}

impl Issues {
    pub fn new(section: &'static str) -> Self {
        Self {
            section,
            found: Vec::new(),
        }
    }

    pub fn reject(&mut self, field: &str, problem: impl Into<String>) {
        self.found
            .push(ValidationError::new(format!("{}.{}", self.section, field), problem));
    }

    pub fn within<T>(&mut self, field: &str, value: T, allowed: RangeInclusive<T>)
    where
        T: PartialOrd + Display,
    {
        if !allowed.contains(&value) {
            let problem = format!("got {}, allowed {}..={}", value, allowed.start(), allowed.end());
            self.reject(field, problem);
        }
    }

    pub fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.found.is_empty() {
            Ok(())
        } else {
            Err(self.found)
        }
    }
}
