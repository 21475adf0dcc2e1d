use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

// our own stuff that we need
use crate::atomize::Atomizer;
use crate::datatype::{Time, UNKNOWN};
use crate::error::{ProsoponError, Result};
use crate::link::{Link, LinkSummary, Linker, UnresolvedLink, UnresolvedSink};
use crate::OtherHasher;

// ------------- ObservationKind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Appellation,
    Activity,
    Identity,
    Status,
    LocationRelation,
    Relationship,
    Event,
    ExternalReference,
}

impl ObservationKind {
    pub const ALL: [ObservationKind; 8] = [
        ObservationKind::Appellation,
        ObservationKind::Activity,
        ObservationKind::Identity,
        ObservationKind::Status,
        ObservationKind::LocationRelation,
        ObservationKind::Relationship,
        ObservationKind::Event,
        ObservationKind::ExternalReference,
    ];
    pub fn name(&self) -> &'static str {
        match self {
            ObservationKind::Appellation => "appellation",
            ObservationKind::Activity => "activity",
            ObservationKind::Identity => "identity",
            ObservationKind::Status => "status",
            ObservationKind::LocationRelation => "location_relation",
            ObservationKind::Relationship => "relationship",
            ObservationKind::Event => "event",
            ObservationKind::ExternalReference => "external_reference",
        }
    }
    /// Names of the kind-specific fields, primary field first.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            ObservationKind::Appellation => &["appellation", "appellation_type"],
            ObservationKind::Activity => &["function", "function_type", "employer", "location"],
            ObservationKind::Identity => &["identifier", "identity_type", "location"],
            ObservationKind::Status => &["status", "status_type", "location"],
            ObservationKind::LocationRelation => &["location_relation", "location"],
            ObservationKind::Relationship => &["relation", "other_person"],
            ObservationKind::Event => &["event", "event_type", "location"],
            ObservationKind::ExternalReference => &["reference", "reference_type"],
        }
    }
    /// Fields that must carry a value for an observation to mean anything.
    fn required(&self) -> &'static [&'static str] {
        match self {
            ObservationKind::Relationship => &["relation", "other_person"],
            _ => &self.fields()[..1],
        }
    }
    pub fn check_field(&self, field: &str) -> Result<()> {
        if self.fields().contains(&field) {
            Ok(())
        } else {
            Err(ProsoponError::Configuration(format!(
                "`{}` has no field `{}` (expected one of {})",
                self.name(),
                field,
                self.fields().join(", ")
            )))
        }
    }
}
impl FromStr for ObservationKind {
    type Err = ProsoponError;
    fn from_str(s: &str) -> Result<Self> {
        ObservationKind::ALL
            .iter()
            .find(|kind| kind.name() == s.trim())
            .copied()
            .ok_or_else(|| ProsoponError::Configuration(format!("unknown observation kind `{}`", s)))
    }
}
impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Identifiers are only trimmed, everything else is folded for matching.
fn is_verbatim(field: &str) -> bool {
    matches!(field, "other_person" | "reference")
}

// ------------- Detail -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    Appellation {
        appellation: String,
        #[serde(default)]
        appellation_type: String,
    },
    Activity {
        function: String,
        #[serde(default)]
        function_type: String,
        #[serde(default)]
        employer: String,
        #[serde(default)]
        location: String,
    },
    Identity {
        identifier: String,
        #[serde(default)]
        identity_type: String,
        #[serde(default)]
        location: String,
    },
    Status {
        status: String,
        #[serde(default)]
        status_type: String,
        #[serde(default)]
        location: String,
    },
    LocationRelation {
        location_relation: String,
        #[serde(default)]
        location: String,
    },
    Relationship {
        relation: String,
        other_person: String,
    },
    Event {
        event: String,
        #[serde(default)]
        event_type: String,
        #[serde(default)]
        location: String,
    },
    ExternalReference {
        reference: String,
        #[serde(default)]
        reference_type: String,
    },
}

impl Detail {
    pub fn kind(&self) -> ObservationKind {
        match self {
            Detail::Appellation { .. } => ObservationKind::Appellation,
            Detail::Activity { .. } => ObservationKind::Activity,
            Detail::Identity { .. } => ObservationKind::Identity,
            Detail::Status { .. } => ObservationKind::Status,
            Detail::LocationRelation { .. } => ObservationKind::LocationRelation,
            Detail::Relationship { .. } => ObservationKind::Relationship,
            Detail::Event { .. } => ObservationKind::Event,
            Detail::ExternalReference { .. } => ObservationKind::ExternalReference,
        }
    }
    /// Field name and value pairs in the order given by `ObservationKind::fields`.
    pub fn slots(&self) -> Vec<(&'static str, &str)> {
        let kind = self.kind();
        let values: Vec<&String> = match self {
            Detail::Appellation { appellation, appellation_type } => vec![appellation, appellation_type],
            Detail::Activity { function, function_type, employer, location } => {
                vec![function, function_type, employer, location]
            }
            Detail::Identity { identifier, identity_type, location } => vec![identifier, identity_type, location],
            Detail::Status { status, status_type, location } => vec![status, status_type, location],
            Detail::LocationRelation { location_relation, location } => vec![location_relation, location],
            Detail::Relationship { relation, other_person } => vec![relation, other_person],
            Detail::Event { event, event_type, location } => vec![event, event_type, location],
            Detail::ExternalReference { reference, reference_type } => vec![reference, reference_type],
        };
        kind.fields().iter().copied().zip(values.into_iter().map(String::as_str)).collect()
    }
    fn slots_mut(&mut self) -> Vec<(&'static str, &mut String)> {
        let kind = self.kind();
        let values: Vec<&mut String> = match self {
            Detail::Appellation { appellation, appellation_type } => vec![appellation, appellation_type],
            Detail::Activity { function, function_type, employer, location } => {
                vec![function, function_type, employer, location]
            }
            Detail::Identity { identifier, identity_type, location } => vec![identifier, identity_type, location],
            Detail::Status { status, status_type, location } => vec![status, status_type, location],
            Detail::LocationRelation { location_relation, location } => vec![location_relation, location],
            Detail::Relationship { relation, other_person } => vec![relation, other_person],
            Detail::Event { event, event_type, location } => vec![event, event_type, location],
            Detail::ExternalReference { reference, reference_type } => vec![reference, reference_type],
        };
        kind.fields().iter().copied().zip(values).collect()
    }
    pub fn field(&self, name: &str) -> Result<&str> {
        self.kind().check_field(name)?;
        Ok(self
            .slots()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
            .unwrap_or_default())
    }
    pub fn with_field(&self, name: &str, value: &str) -> Result<Detail> {
        self.kind().check_field(name)?;
        let mut detail = self.clone();
        for (field, slot) in detail.slots_mut() {
            if field == name {
                *slot = value.to_string();
            }
        }
        Ok(detail)
    }
    fn normalized(mut self) -> Detail {
        for (field, slot) in self.slots_mut() {
            let trimmed = slot.trim();
            *slot = if is_verbatim(field) {
                trimmed.to_string()
            } else {
                trimmed.to_lowercase()
            };
        }
        self
    }
}

// ------------- Provenance -------------
// The raw shared fields of an observation, exactly as an upstream annotation
// process hands them over. Nothing here is validated until it becomes part
// of an Observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub annotation_date: String,
    pub start_date: String,
    pub end_date: String,
    pub source: String,
    pub location_in_source: String,
    pub observation_id: String,
    pub original_label: String,
}

impl Provenance {
    pub fn new(source: &str, observation_id: &str) -> Self {
        Self {
            annotation_date: UNKNOWN.to_string(),
            start_date: UNKNOWN.to_string(),
            end_date: UNKNOWN.to_string(),
            source: source.to_string(),
            location_in_source: String::new(),
            observation_id: observation_id.to_string(),
            original_label: String::new(),
        }
    }
    pub fn dated(mut self, annotation_date: &str, start_date: &str, end_date: &str) -> Self {
        self.annotation_date = annotation_date.to_string();
        self.start_date = start_date.to_string();
        self.end_date = end_date.to_string();
        self
    }
    pub fn located(mut self, location_in_source: &str) -> Self {
        self.location_in_source = location_in_source.to_string();
        self
    }
    pub fn labelled(mut self, original_label: &str) -> Self {
        self.original_label = original_label.to_string();
        self
    }
}

// ------------- Observation -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "ObservationRecord", try_from = "ObservationRecord")]
pub struct Observation {
    annotation_date: Time,
    start_date: Time,
    end_date: Time,
    source: String,
    location_in_source: String,
    observation_id: String,
    original_label: String,
    detail: Detail,
}

fn parse_date(observation_id: &str, field: &str, raw: &str) -> Result<Time> {
    Time::parse(raw).map_err(|e| ProsoponError::invalid(observation_id, field, e.to_string()))
}

impl Observation {
    pub fn new(provenance: Provenance, detail: Detail) -> Result<Observation> {
        let id = provenance.observation_id.as_str();
        let annotation_date = parse_date(id, "annotation_date", &provenance.annotation_date)?;
        let start_date = parse_date(id, "start_date", &provenance.start_date)?;
        let end_date = parse_date(id, "end_date", &provenance.end_date)?;
        let detail = detail.normalized();
        for field in detail.kind().required() {
            if detail.field(field)?.is_empty() {
                return Err(ProsoponError::invalid(id, field, "must not be blank"));
            }
        }
        Ok(Observation {
            annotation_date,
            start_date,
            end_date,
            source: provenance.source,
            location_in_source: provenance.location_in_source,
            observation_id: provenance.observation_id,
            original_label: provenance.original_label,
            detail,
        })
    }
    // It's intentional to only expose getters, since atomization and
    // linking must produce new observations rather than alter shared ones.
    pub fn kind(&self) -> ObservationKind {
        self.detail.kind()
    }
    pub fn detail(&self) -> &Detail {
        &self.detail
    }
    pub fn annotation_date(&self) -> &Time {
        &self.annotation_date
    }
    pub fn start_date(&self) -> &Time {
        &self.start_date
    }
    pub fn end_date(&self) -> &Time {
        &self.end_date
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn location_in_source(&self) -> &str {
        &self.location_in_source
    }
    pub fn observation_id(&self) -> &str {
        &self.observation_id
    }
    pub fn original_label(&self) -> &str {
        &self.original_label
    }
    pub fn field(&self, name: &str) -> Result<&str> {
        self.detail.field(name)
    }
    /// A copy of this observation with exactly one kind-specific field replaced.
    pub fn with_field(&self, name: &str, value: &str) -> Result<Observation> {
        Ok(Observation {
            detail: self.detail.with_field(name, value)?,
            ..self.clone()
        })
    }
    pub fn provenance(&self) -> Provenance {
        Provenance {
            annotation_date: self.annotation_date.raw().to_string(),
            start_date: self.start_date.raw().to_string(),
            end_date: self.end_date.raw().to_string(),
            source: self.source.clone(),
            location_in_source: self.location_in_source.clone(),
            observation_id: self.observation_id.clone(),
            original_label: self.original_label.clone(),
        }
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "unknown" } else { value }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let when = format!("from {} to {}", self.start_date, self.end_date);
        match &self.detail {
            Detail::Appellation { appellation, appellation_type } => write!(
                f,
                "recorded as `{}` ({})",
                appellation,
                or_unknown(appellation_type)
            )?,
            Detail::Activity { function, function_type, employer, location } => write!(
                f,
                "active as {} ({}) for {} in {} {}",
                function,
                or_unknown(function_type),
                or_unknown(employer),
                or_unknown(location),
                when
            )?,
            Detail::Identity { identifier, identity_type, location } => write!(
                f,
                "identified as {} ({}) in {} {}",
                identifier,
                or_unknown(identity_type),
                or_unknown(location),
                when
            )?,
            Detail::Status { status, status_type, location } => write!(
                f,
                "held the status {} ({}) in {} {}",
                status,
                or_unknown(status_type),
                or_unknown(location),
                when
            )?,
            Detail::LocationRelation { location_relation, location } => write!(
                f,
                "related as {} to {} {}",
                location_relation,
                or_unknown(location),
                when
            )?,
            Detail::Relationship { relation, other_person } => {
                write!(f, "had the relationship {} to {} {}", relation, other_person, when)?
            }
            Detail::Event { event, event_type, location } => write!(
                f,
                "took part in {} ({}) in {} {}",
                event,
                or_unknown(event_type),
                or_unknown(location),
                when
            )?,
            Detail::ExternalReference { reference, reference_type } => {
                write!(f, "is referenced as {} in {}", reference, or_unknown(reference_type))?
            }
        }
        write!(f, ", according to {} (annotated {})", self.source, self.annotation_date)
    }
}

// The flat shape handed to exporters, carrying the expanded date ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObservationRecord {
    observation_id: String,
    annotation_date: String,
    #[serde(default, skip_deserializing)]
    annotation_date_min: Option<String>,
    #[serde(default, skip_deserializing)]
    annotation_date_max: Option<String>,
    start_date: String,
    #[serde(default, skip_deserializing)]
    start_date_min: Option<String>,
    #[serde(default, skip_deserializing)]
    start_date_max: Option<String>,
    end_date: String,
    #[serde(default, skip_deserializing)]
    end_date_min: Option<String>,
    #[serde(default, skip_deserializing)]
    end_date_max: Option<String>,
    source: String,
    #[serde(default)]
    location_in_source: String,
    #[serde(default)]
    original_label: String,
    #[serde(flatten)]
    detail: Detail,
}

fn day(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

impl From<Observation> for ObservationRecord {
    fn from(o: Observation) -> Self {
        ObservationRecord {
            annotation_date_min: day(o.annotation_date.min()),
            annotation_date_max: day(o.annotation_date.max()),
            start_date_min: day(o.start_date.min()),
            start_date_max: day(o.start_date.max()),
            end_date_min: day(o.end_date.min()),
            end_date_max: day(o.end_date.max()),
            annotation_date: o.annotation_date.into(),
            start_date: o.start_date.into(),
            end_date: o.end_date.into(),
            observation_id: o.observation_id,
            source: o.source,
            location_in_source: o.location_in_source,
            original_label: o.original_label,
            detail: o.detail,
        }
    }
}
impl TryFrom<ObservationRecord> for Observation {
    type Error = ProsoponError;
    fn try_from(r: ObservationRecord) -> Result<Observation> {
        let provenance = Provenance {
            annotation_date: r.annotation_date,
            start_date: r.start_date,
            end_date: r.end_date,
            source: r.source,
            location_in_source: r.location_in_source,
            observation_id: r.observation_id,
            original_label: r.original_label,
        };
        Observation::new(provenance, r.detail)
    }
}

// ------------- Person -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PersonRecord", try_from = "PersonRecord")]
pub struct Person {
    uri: String,
    comment: Option<String>,
    date_of_birth: Time,
    date_of_death: Time,
    observations: BTreeMap<ObservationKind, Vec<Observation>>,
}

// Incoming records go through the same checks as `Person::new` and
// `Person::add_observation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersonRecord {
    uri: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    date_of_birth: Time,
    #[serde(default)]
    date_of_death: Time,
    #[serde(default)]
    observations: BTreeMap<ObservationKind, Vec<Observation>>,
}

impl From<Person> for PersonRecord {
    fn from(p: Person) -> Self {
        PersonRecord {
            uri: p.uri,
            comment: p.comment,
            date_of_birth: p.date_of_birth,
            date_of_death: p.date_of_death,
            observations: p.observations,
        }
    }
}
impl TryFrom<PersonRecord> for Person {
    type Error = ProsoponError;
    fn try_from(r: PersonRecord) -> Result<Person> {
        let mut person = Person::new(&r.uri)?;
        person.comment = r.comment;
        person.date_of_birth = r.date_of_birth;
        person.date_of_death = r.date_of_death;
        for (kind, observations) in r.observations {
            for observation in observations {
                person.add_observation(kind, observation)?;
            }
        }
        Ok(person)
    }
}

impl Person {
    pub fn new(uri: &str) -> Result<Person> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ProsoponError::invalid("person", "uri", "must not be blank"));
        }
        Ok(Person {
            uri: uri.to_string(),
            comment: None,
            date_of_birth: Time::unknown(),
            date_of_death: Time::unknown(),
            observations: BTreeMap::new(),
        })
    }
    pub fn with_life_dates(uri: &str, date_of_birth: &str, date_of_death: &str) -> Result<Person> {
        let mut person = Person::new(uri)?;
        person.date_of_birth = parse_date(&person.uri, "date_of_birth", date_of_birth)?;
        person.date_of_death = parse_date(&person.uri, "date_of_death", date_of_death)?;
        Ok(person)
    }
    pub fn with_comment(mut self, comment: &str) -> Person {
        self.comment = Some(comment.to_string());
        self
    }
    pub fn uri(&self) -> &str {
        &self.uri
    }
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
    pub fn date_of_birth(&self) -> &Time {
        &self.date_of_birth
    }
    pub fn date_of_death(&self) -> &Time {
        &self.date_of_death
    }
    pub fn observations(&self, kind: ObservationKind) -> &[Observation] {
        self.observations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Every held observation, grouped by kind in `ObservationKind::ALL` order.
    pub fn all_observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.values().flatten()
    }
    pub fn len(&self) -> usize {
        self.observations.values().map(Vec::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn add_observation(&mut self, kind: ObservationKind, observation: Observation) -> Result<()> {
        if observation.kind() != kind {
            return Err(ProsoponError::invalid(
                observation.observation_id(),
                "kind",
                format!("is `{}` but was added as `{}`", observation.kind(), kind),
            ));
        }
        self.observations.entry(kind).or_default().push(observation);
        Ok(())
    }
    pub fn push(&mut self, observation: Observation) {
        self.observations.entry(observation.kind()).or_default().push(observation);
    }
    fn replace(&mut self, kind: ObservationKind, collection: Vec<Observation>) {
        if collection.is_empty() {
            self.observations.remove(&kind);
        } else {
            self.observations.insert(kind, collection);
        }
    }
    /// Splits the given field of every observation of one kind, returning how
    /// many observations were replaced by their fragments.
    pub fn atomize_field(&mut self, kind: ObservationKind, field: &str, atomizer: &Atomizer) -> Result<usize> {
        kind.check_field(field)?;
        let mut split = 0;
        let mut collection = Vec::new();
        for observation in self.observations(kind) {
            let fragments = atomizer.split(observation.field(field)?);
            if fragments.len() < 2 {
                collection.push(observation.clone());
                continue;
            }
            debug!(
                "{} {}.{} split into {} fragments",
                observation.observation_id(),
                kind,
                field,
                fragments.len()
            );
            for fragment in &fragments {
                collection.push(observation.with_field(field, fragment)?);
            }
            split += 1;
        }
        self.replace(kind, collection);
        Ok(split)
    }
    pub fn link_field(
        &mut self,
        kind: ObservationKind,
        field: &str,
        linker: &Linker,
        sink: &mut dyn UnresolvedSink,
    ) -> Result<LinkSummary> {
        kind.check_field(field)?;
        let mut summary = LinkSummary::default();
        let mut collection = Vec::new();
        for observation in self.observations(kind) {
            let value = observation.field(field)?;
            match linker.link(value) {
                Link::Canonical(id) => {
                    summary.linked += 1;
                    debug!("{} {}.{} linked to {}", observation.observation_id(), kind, field, id);
                    collection.push(observation.with_field(field, &id)?);
                }
                Link::Unresolved(term) => {
                    summary.unresolved += 1;
                    UnresolvedLink::new(kind, field, &term, linker.mode()).report(sink);
                    collection.push(observation.clone());
                }
                Link::Unknown(term) => {
                    summary.unknown += 1;
                    UnresolvedLink::new(kind, field, &term, linker.mode()).report(sink);
                    collection.push(observation.with_field(field, UNKNOWN)?);
                }
                Link::Excluded => {
                    summary.excluded += 1;
                    debug!("{} dropped, `{}` is not to be processed", observation.observation_id(), value);
                }
                Link::Absent => {
                    summary.absent += 1;
                    collection.push(observation.clone());
                }
            }
        }
        self.replace(kind, collection);
        Ok(summary)
    }
    /// Field-wise union of both records; exact duplicates collapse to the
    /// first occurrence. Life dates are taken from `self`.
    pub fn merge_with(&self, other: &Person) -> Person {
        let mut observations = BTreeMap::new();
        for kind in ObservationKind::ALL {
            let mut seen: HashSet<&Observation, OtherHasher> = HashSet::default();
            let merged: Vec<Observation> = self
                .observations(kind)
                .iter()
                .chain(other.observations(kind))
                .filter(|o| seen.insert(*o))
                .cloned()
                .collect();
            if !merged.is_empty() {
                observations.insert(kind, merged);
            }
        }
        Person {
            uri: self.uri.clone(),
            comment: self.comment.clone().or_else(|| other.comment.clone()),
            date_of_birth: self.date_of_birth.clone(),
            date_of_death: self.date_of_death.clone(),
            observations,
        }
    }
}
impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}
