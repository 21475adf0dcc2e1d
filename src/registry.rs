use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// our own stuff that we need
use crate::atomize::Atomizer;
use crate::construct::{Detail, Observation, ObservationKind, Person, Provenance};
use crate::error::{ProsoponError, Result};
use crate::link::{LinkSummary, Linker, UnresolvedSink};
use crate::OtherHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AtomizationSummary {
    pub persons: usize,
    /// Observations replaced by their fragments.
    pub split: usize,
    /// Observations created from those fragments.
    pub created: usize,
}

/// The other end of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    /// A person who already has an identity of their own.
    Known { uri: String },
    /// A person only mentioned by name; an identity is derived from the
    /// subject's URI and the name gets recorded as an appellation.
    Unobserved { appellation: String },
}

// ------------- PersonRegistry -------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRegistry {
    persons: Vec<Person>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add(&mut self, person: Person) {
        self.persons.push(person);
    }
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }
    pub fn into_persons(self) -> Vec<Person> {
        self.persons
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Person> {
        self.persons.iter()
    }
    pub fn len(&self) -> usize {
        self.persons.len()
    }
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
    /// The first record held under `uri`.
    pub fn get(&self, uri: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.uri() == uri)
    }
    fn get_mut(&mut self, uri: &str) -> Option<&mut Person> {
        self.persons.iter_mut().find(|p| p.uri() == uri)
    }
    /// Folds every record into the first record with the same URI. The
    /// output is ordered by first appearance of each URI.
    pub fn merge_on_uri(&self) -> Vec<Person> {
        let mut position: HashMap<&str, usize, OtherHasher> = HashMap::default();
        let mut merged: Vec<Person> = Vec::new();
        for person in &self.persons {
            match position.get(person.uri()) {
                Some(&i) => merged[i] = merged[i].merge_with(person),
                None => {
                    position.insert(person.uri(), merged.len());
                    merged.push(person.clone());
                }
            }
        }
        merged
    }
    /// Replaces the held records with their consolidation and returns how
    /// many records were absorbed into another.
    pub fn consolidate(&mut self) -> usize {
        let before = self.persons.len();
        self.persons = self.merge_on_uri();
        let absorbed = before - self.persons.len();
        info!(persons = self.persons.len(), absorbed, "consolidated registry on uri");
        absorbed
    }
    pub fn apply_atomization(
        &mut self,
        kind: ObservationKind,
        field: &str,
        atomizer: &Atomizer,
    ) -> Result<AtomizationSummary> {
        kind.check_field(field)?;
        let mut summary = AtomizationSummary::default();
        for person in self.persons.iter_mut() {
            let before = person.observations(kind).len();
            let split = person.atomize_field(kind, field, atomizer)?;
            if split > 0 {
                summary.persons += 1;
                summary.split += split;
                summary.created += person.observations(kind).len() + split - before;
            }
        }
        info!(
            persons = summary.persons,
            split = summary.split,
            created = summary.created,
            "atomized {}.{}",
            kind,
            field
        );
        Ok(summary)
    }
    pub fn apply_linking(
        &mut self,
        linker: &Linker,
        kind: ObservationKind,
        field: &str,
        sink: &mut dyn UnresolvedSink,
    ) -> Result<LinkSummary> {
        kind.check_field(field)?;
        let mut summary = LinkSummary::default();
        for person in self.persons.iter_mut() {
            summary += person.link_field(kind, field, linker, sink)?;
        }
        info!(
            mode = %linker.mode(),
            linked = summary.linked,
            unresolved = summary.unresolved,
            unknown = summary.unknown,
            excluded = summary.excluded,
            "linked {}.{}",
            kind,
            field
        );
        Ok(summary)
    }
    /// Records a relationship on `subject_uri` and registers the target with
    /// the inverse relationship. Returns the URI of the target. Call
    /// [`PersonRegistry::consolidate`] afterwards to fold the target into an
    /// existing record with the same URI.
    pub fn add_relationship(
        &mut self,
        subject_uri: &str,
        target: RelationTarget,
        relation: &str,
        inverse_relation: &str,
        provenance: Provenance,
    ) -> Result<String> {
        if self.get(subject_uri).is_none() {
            return Err(ProsoponError::invalid(
                &provenance.observation_id,
                "subject",
                format!("refers to `{}`, which is not in the registry", subject_uri),
            ));
        }
        let (target_uri, appellation) = match target {
            RelationTarget::Known { uri } => (uri.trim().to_string(), None),
            RelationTarget::Unobserved { appellation } => {
                (synthesize_uri(subject_uri, &appellation), Some(appellation))
            }
        };
        let forward = Observation::new(
            provenance.clone(),
            Detail::Relationship {
                relation: relation.to_string(),
                other_person: target_uri.clone(),
            },
        )?;
        let inverse = Observation::new(
            provenance.clone(),
            Detail::Relationship {
                relation: inverse_relation.to_string(),
                other_person: subject_uri.to_string(),
            },
        )?;
        let mut other = Person::new(&target_uri)?;
        if let Some(name) = appellation {
            other.push(Observation::new(
                provenance,
                Detail::Appellation {
                    appellation: name,
                    appellation_type: "appellation".to_string(),
                },
            )?);
        }
        other.push(inverse);
        if let Some(subject) = self.get_mut(subject_uri) {
            subject.push(forward);
        }
        debug!("{} {} {}", subject_uri, relation, target_uri);
        self.persons.push(other);
        Ok(target_uri)
    }
}

impl FromIterator<Person> for PersonRegistry {
    fn from_iter<T: IntoIterator<Item = Person>>(iter: T) -> Self {
        Self {
            persons: iter.into_iter().collect(),
        }
    }
}
impl IntoIterator for PersonRegistry {
    type Item = Person;
    type IntoIter = std::vec::IntoIter<Person>;
    fn into_iter(self) -> Self::IntoIter {
        self.persons.into_iter()
    }
}

fn synthesize_uri(subject_uri: &str, appellation: &str) -> String {
    let slug: Vec<String> = appellation
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect();
    format!("{}/rela/{}", subject_uri.trim_end_matches('/'), slug.join("-"))
}
