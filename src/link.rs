//! Resolution of free-text values to canonical identifiers.
//!
//! A [`Vocabulary`] maps normalized labels (trimmed and lower-cased) to
//! identifiers and lists labels that should not be processed at all. A
//! [`Linker`] applies it to single values and decides, according to its
//! [`LinkMode`], what happens to values the vocabulary does not know. Misses
//! never fail a pass; they are handed to an [`UnresolvedSink`] for manual
//! curation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::ops;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::construct::ObservationKind;
use crate::datatype::UNKNOWN;
use crate::settings::LinkerSettings;
use crate::OtherHasher;

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

// ------------- Vocabulary -------------
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    mapping: HashMap<String, String, OtherHasher>,
    do_not_process: HashSet<String, OtherHasher>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, label: &str, id: &str) {
        self.mapping.insert(normalize(label), id.trim().to_string());
    }
    pub fn exclude(&mut self, label: &str) {
        self.do_not_process.insert(normalize(label));
    }
    pub fn with_excluded<I>(mut self, labels: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for label in labels {
            self.exclude(label.as_ref());
        }
        self
    }
    pub fn lookup(&self, value: &str) -> Option<&str> {
        self.mapping.get(&normalize(value)).map(String::as_str)
    }
    pub fn is_excluded(&self, value: &str) -> bool {
        self.do_not_process.contains(&normalize(value))
    }
    pub fn len(&self) -> usize {
        self.mapping.len()
    }
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut vocabulary = Vocabulary::new();
        for (label, id) in iter {
            vocabulary.insert(label.as_ref(), id.as_ref());
        }
        vocabulary
    }
}

// ------------- LinkMode -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Misses keep their text and are logged.
    #[default]
    Provisional,
    /// Misses become the unknown sentinel and are logged.
    Final,
}
impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkMode::Provisional => write!(f, "provisional"),
            LinkMode::Final => write!(f, "final"),
        }
    }
}

// ------------- Link -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    Canonical(String),
    /// Provisional miss, the value stays as it is.
    Unresolved(String),
    /// Final miss, the value is replaced by the unknown sentinel.
    Unknown(String),
    /// The value is on the do-not-process list and its observation is dropped.
    Excluded,
    /// Blank or already unknown, nothing to resolve.
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkSummary {
    pub linked: usize,
    pub unresolved: usize,
    pub unknown: usize,
    pub excluded: usize,
    pub absent: usize,
}
impl LinkSummary {
    pub fn total(&self) -> usize {
        self.linked + self.unresolved + self.unknown + self.excluded + self.absent
    }
}
impl ops::AddAssign for LinkSummary {
    fn add_assign(&mut self, other: LinkSummary) {
        self.linked += other.linked;
        self.unresolved += other.unresolved;
        self.unknown += other.unknown;
        self.excluded += other.excluded;
        self.absent += other.absent;
    }
}

// ------------- Linker -------------
#[derive(Debug, Clone)]
pub struct Linker {
    vocabulary: Vocabulary,
    mode: LinkMode,
    namespace: String,
}

impl Linker {
    pub fn new(vocabulary: Vocabulary, mode: LinkMode, namespace: &str) -> Self {
        Self {
            vocabulary,
            mode,
            namespace: normalize(namespace),
        }
    }
    pub fn from_settings(vocabulary: Vocabulary, settings: &LinkerSettings) -> Self {
        Self::new(vocabulary, settings.mode, &settings.namespace)
    }
    pub fn mode(&self) -> LinkMode {
        self.mode
    }
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
    pub fn is_canonical(&self, value: &str) -> bool {
        !self.namespace.is_empty() && normalize(value).starts_with(&self.namespace)
    }
    pub fn link(&self, value: &str) -> Link {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == UNKNOWN {
            return Link::Absent;
        }
        if self.vocabulary.is_excluded(trimmed) {
            return Link::Excluded;
        }
        // already linked, in either mode, so that a second pass changes nothing
        if self.is_canonical(trimmed) {
            return Link::Canonical(trimmed.to_string());
        }
        match self.vocabulary.lookup(trimmed) {
            Some(id) => Link::Canonical(id.to_string()),
            None => match self.mode {
                LinkMode::Provisional => Link::Unresolved(trimmed.to_string()),
                LinkMode::Final => Link::Unknown(trimmed.to_string()),
            },
        }
    }
}

// ------------- Unresolved terms -------------
pub trait UnresolvedSink {
    fn record(&mut self, value: &str);
}

/// A value the vocabulary could not resolve. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    pub kind: ObservationKind,
    pub field: String,
    pub value: String,
    pub mode: LinkMode,
}
impl UnresolvedLink {
    pub fn new(kind: ObservationKind, field: &str, value: &str, mode: LinkMode) -> Self {
        Self {
            kind,
            field: field.to_string(),
            value: value.to_string(),
            mode,
        }
    }
    pub fn report(&self, sink: &mut dyn UnresolvedSink) {
        warn!(mode = %self.mode, kind = %self.kind, field = %self.field, "unresolved term `{}`", self.value);
        sink.record(&self.value);
    }
}
impl fmt::Display for UnresolvedLink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}: `{}` ({} mode)", self.kind, self.field, self.value, self.mode)
    }
}

/// Append-only, deduplicated collector of unresolved terms in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct UnresolvedTerms {
    terms: Vec<String>,
    seen: HashSet<String, OtherHasher>,
}

impl UnresolvedTerms {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(&normalize(value))
    }
    pub fn len(&self) -> usize {
        self.terms.len()
    }
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
    /// Takes over the terms of a collector filled elsewhere, such as by a
    /// worker of a parallel pass.
    pub fn absorb(&mut self, other: UnresolvedTerms) {
        for term in other.terms {
            self.record(&term);
        }
    }
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for term in &self.terms {
            writeln!(writer, "{}", term)?;
        }
        writer.flush()
    }
}
impl UnresolvedSink for UnresolvedTerms {
    fn record(&mut self, value: &str) {
        if self.seen.insert(normalize(value)) {
            self.terms.push(value.trim().to_string());
        }
    }
}
