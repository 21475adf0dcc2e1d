//! Splitting of compound attribute values.
//!
//! Archival transcriptions often pack several attributes into one value, as
//! in `"coopman en schipper"`. An [`Atomizer`] cuts such a value on a list of
//! literal separators, leaving alone the configured exceptions (names and
//! fixed phrases that merely contain a separator) and dropping fragments that
//! are known noise.
//!
//! Stored field values are trimmed and lower-cased, so exceptions and discard
//! words are folded the same way and separators match regardless of case.
//!
//! All separators are escaped and joined into a single alternation, so at any
//! position the separator listed first wins. With `[" of ", " o"]` the value
//! `"a of b"` yields `["a", "b"]`; with the order reversed it yields
//! `["a", "f b"]`.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::error::{ProsoponError, Result};
use crate::link::normalize;
use crate::settings::AtomizerSettings;
use crate::OtherHasher;

#[derive(Debug, Clone)]
pub struct Atomizer {
    separators: Vec<String>,
    exceptions: HashSet<String, OtherHasher>,
    discard: HashSet<String, OtherHasher>,
    pattern: Option<Regex>,
}

impl Atomizer {
    pub fn new<S, E, D>(separators: S, exceptions: E, discard: D) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let separators: Vec<String> = separators.into_iter().map(Into::into).collect();
        if separators.iter().any(String::is_empty) {
            return Err(ProsoponError::Configuration(
                "separators must not contain the empty string".to_string(),
            ));
        }
        let pattern = if separators.is_empty() {
            None
        } else {
            let alternation: Vec<String> = separators.iter().map(|s| regex::escape(s)).collect();
            Some(RegexBuilder::new(&alternation.join("|")).case_insensitive(true).build()?)
        };
        Ok(Self {
            separators,
            exceptions: exceptions.into_iter().map(|e| normalize(&Into::<String>::into(e))).collect(),
            discard: discard.into_iter().map(|d| normalize(&Into::<String>::into(d))).collect(),
            pattern,
        })
    }
    pub fn from_settings(settings: &AtomizerSettings) -> Result<Self> {
        Self::new(
            settings.separators.iter().cloned(),
            settings.exceptions.iter().cloned(),
            settings.discard.iter().cloned(),
        )
    }
    pub fn separators(&self) -> &[String] {
        &self.separators
    }
    pub fn is_exception(&self, value: &str) -> bool {
        self.exceptions.contains(&normalize(value))
    }
    /// Cuts `value` into its trimmed, non-empty fragments. A result with
    /// fewer than two elements means the value is already atomic.
    pub fn split(&self, value: &str) -> Vec<String> {
        if self.is_exception(value) {
            return vec![value.to_string()];
        }
        let fragments: Box<dyn Iterator<Item = &str> + '_> = match &self.pattern {
            Some(pattern) => Box::new(pattern.split(value)),
            None => Box::new(std::iter::once(value)),
        };
        fragments
            .map(str::trim)
            .filter(|f| !f.is_empty() && !self.discard.contains(&normalize(f)))
            .map(str::to_string)
            .collect()
    }
}

/// One-off split without keeping an [`Atomizer`] around.
pub fn split(value: &str, separators: &[&str], exceptions: &[&str], discard: &[&str]) -> Result<Vec<String>> {
    let atomizer = Atomizer::new(
        separators.iter().copied(),
        exceptions.iter().copied(),
        discard.iter().copied(),
    )?;
    Ok(atomizer.split(value))
}
