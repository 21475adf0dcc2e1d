//! Prosopon – normalization and linkage of historical person records.
//!
//! Person records transcribed from archival sources carry their attributes
//! as *observations*: who was called what, held which function, was related
//! to whom, and according to which source and when. Prosopon cleans those
//! observations up before they are exported:
//! * Partial dates (`yyyy`, `yyyy-mm`, `yyyy-mm-dd`, or `-1` when unknown) are
//!   validated and expanded into the closed range of days they may denote.
//! * Compound values such as `"coopman en schipper"` are split into one
//!   observation per atomic value.
//! * Free-text values are resolved to canonical identifiers through a
//!   vocabulary, with misses collected for manual curation.
//! * Records with the same URI are merged into one.
//!
//! ## Modules
//! * [`datatype`] – Partial dates, their validation and expansion.
//! * [`construct`] – [`construct::Observation`] and [`construct::Person`], the
//!   immutable building blocks of a record.
//! * [`atomize`] – The [`atomize::Atomizer`] splitting compound values.
//! * [`link`] – The [`link::Linker`] and its [`link::Vocabulary`].
//! * [`registry`] – The [`registry::PersonRegistry`] holding all records and
//!   applying whole passes over them.
//! * [`settings`] – Layered configuration through the `config` crate.
//! * [`logging`] – Installation of a `tracing` subscriber.
//!
//! ## Quick Start
//! ```
//! use prosopon::atomize::Atomizer;
//! use prosopon::construct::{Detail, Observation, ObservationKind, Person, Provenance};
//! use prosopon::registry::PersonRegistry;
//! use prosopon::settings::Settings;
//!
//! let settings = Settings::default();
//! let atomizer = Atomizer::from_settings(&settings.atomizer).unwrap();
//!
//! let mut person = Person::new("person/42").unwrap();
//! person.push(
//!     Observation::new(
//!         Provenance::new("VOC 1234", "obs-1").dated("2024-01-15", "1700", "1702-03"),
//!         Detail::Activity {
//!             function: "coopman en schipper".into(),
//!             function_type: String::new(),
//!             employer: "voc".into(),
//!             location: String::new(),
//!         },
//!     )
//!     .unwrap(),
//! );
//!
//! let mut registry: PersonRegistry = vec![person].into_iter().collect();
//! registry.apply_atomization(ObservationKind::Activity, "function", &atomizer).unwrap();
//! assert_eq!(registry.persons()[0].observations(ObservationKind::Activity).len(), 2);
//! ```

use seahash::SeaHasher;
use std::hash::BuildHasherDefault;

pub mod atomize;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod link;
pub mod logging;
pub mod registry;
pub mod settings;

// Faster hasher for the vocabulary, deduplication and registry maps.
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub use error::{ProsoponError, Result};
