use prosopon::atomize::{self, Atomizer};
use prosopon::construct::{Detail, Observation, ObservationKind, Person, Provenance};
use prosopon::registry::PersonRegistry;
use prosopon::settings::AtomizerSettings;
use prosopon::ProsoponError;

fn setup() -> Atomizer {
    let mut settings = AtomizerSettings::default();
    settings.exceptions = vec!["Jan en Piet".to_string(), "heer ende meester".to_string()];
    Atomizer::from_settings(&settings).expect("valid separators")
}

fn activity(id: &str, function: &str) -> Observation {
    Observation::new(
        Provenance::new("VOC 1234", id).dated("2024-01-15", "1700", "1702-03"),
        Detail::Activity {
            function: function.to_string(),
            function_type: "occupation".to_string(),
            employer: "voc".to_string(),
            location: "batavia".to_string(),
        },
    )
    .unwrap()
}

#[test]
fn compound_values_are_split() {
    let atomizer = setup();
    assert_eq!(atomizer.split("coopman en schipper"), vec!["coopman", "schipper"]);
    assert_eq!(atomizer.split("coopman ende schipper"), vec!["coopman", "schipper"]);
    assert_eq!(atomizer.split("soldaat; matroos & bosschieter"), vec!["soldaat", "matroos", "bosschieter"]);
    assert_eq!(atomizer.split("  coopman  "), vec!["coopman"]);
    assert!(atomizer.split("   ").is_empty());
}

#[test]
fn exceptions_are_never_split() {
    let atomizer = setup();
    assert_eq!(atomizer.split("Jan en Piet"), vec!["Jan en Piet"]);
    assert_eq!(atomizer.split(" heer ende meester "), vec![" heer ende meester "]);
    // exceptions are matched on the folded form, like stored field values
    assert_eq!(atomizer.split("jan en piet"), vec!["jan en piet"]);
    assert_eq!(atomizer.split("JAN EN PIET"), vec!["JAN EN PIET"]);
    assert_eq!(atomizer.split("jan en piet en klaas"), vec!["jan", "piet", "klaas"]);
}

#[test]
fn separators_and_noise_ignore_case() {
    let split = atomize::split("Coopman EN Schipper", &[" en "], &[], &[]).unwrap();
    assert_eq!(split, vec!["Coopman", "Schipper"]);
    let split = atomize::split("coopman,En,schipper", &[","], &[], &["en"]).unwrap();
    assert_eq!(split, vec!["coopman", "schipper"]);
    let split = atomize::split("coopman,en,schipper", &[","], &[], &[" EN "]).unwrap();
    assert_eq!(split, vec!["coopman", "schipper"]);
}

#[test]
fn configured_exceptions_survive_a_person_pass() {
    let atomizer = setup();
    let mut person = Person::new("person/42").unwrap();
    person.push(
        Observation::new(
            Provenance::new("DTB Amsterdam", "obs-1"),
            Detail::Appellation {
                appellation: "Jan en Piet".to_string(),
                appellation_type: "firm name".to_string(),
            },
        )
        .unwrap(),
    );
    person.push(activity("obs-2", "Heer ende Meester"));
    person.push(activity("obs-3", "coopman en schipper"));

    let split = person
        .atomize_field(ObservationKind::Appellation, "appellation", &atomizer)
        .unwrap();
    assert_eq!(split, 0);
    let names = person.observations(ObservationKind::Appellation);
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].field("appellation").unwrap(), "jan en piet");

    let split = person.atomize_field(ObservationKind::Activity, "function", &atomizer).unwrap();
    assert_eq!(split, 1);
    let functions: Vec<&str> = person
        .observations(ObservationKind::Activity)
        .iter()
        .map(|o| o.field("function").unwrap())
        .collect();
    assert_eq!(functions, vec!["heer ende meester", "coopman", "schipper"]);
}

#[test]
fn configured_exceptions_survive_a_registry_pass() {
    let atomizer = setup();
    let mut person = Person::new("person/42").unwrap();
    person.push(activity("obs-1", "HEER ENDE MEESTER"));
    let mut registry: PersonRegistry = vec![person].into_iter().collect();
    let summary = registry
        .apply_atomization(ObservationKind::Activity, "function", &atomizer)
        .unwrap();
    assert_eq!(summary.split, 0);
    assert_eq!(registry.persons()[0].observations(ObservationKind::Activity).len(), 1);
}

#[test]
fn overlapping_separators_do_not_double_count() {
    let atomizer = setup();
    // ", " is listed before "," and consumes the space with the comma
    assert_eq!(atomizer.split("a, b,c"), vec!["a", "b", "c"]);
    assert_eq!(atomizer.split("a,,b"), vec!["a", "b"]);
}

#[test]
fn earlier_separators_take_precedence() {
    let split = atomize::split("a of b", &[" of ", " o"], &[], &[]).unwrap();
    assert_eq!(split, vec!["a", "b"]);
    let split = atomize::split("a of b", &[" o", " of "], &[], &[]).unwrap();
    assert_eq!(split, vec!["a", "f b"]);
}

#[test]
fn separators_are_literal() {
    let split = atomize::split("a.b|c", &[".", "|"], &[], &[]).unwrap();
    assert_eq!(split, vec!["a", "b", "c"]);
    assert_eq!(atomize::split("abc", &["."], &[], &[]).unwrap(), vec!["abc"]);
    assert!(matches!(
        Atomizer::new(vec![",", ""], Vec::<String>::new(), Vec::<String>::new()),
        Err(ProsoponError::Configuration(_))
    ));
}

#[test]
fn noise_fragments_are_discarded() {
    let split = atomize::split("coopman,en,schipper", &[","], &[], &["en"]).unwrap();
    assert_eq!(split, vec!["coopman", "schipper"]);
    // nothing to cut on at all
    let split = atomize::split("coopman", &[], &[], &[]).unwrap();
    assert_eq!(split, vec!["coopman"]);
}

#[test]
fn atomic_fragments_stay_atomic() {
    let atomizer = setup();
    for value in ["coopman en schipper", "a, b,c", "soldaat; matroos & bosschieter"] {
        for fragment in atomizer.split(value) {
            assert_eq!(atomizer.split(&fragment), vec![fragment.clone()]);
        }
    }
}

#[test]
fn person_fields_are_replaced_by_their_fragments() {
    let atomizer = setup();
    let mut person = Person::new("person/42").unwrap();
    person.push(activity("obs-1", "coopman en schipper"));
    person.push(activity("obs-2", "boekhouder"));

    let split = person.atomize_field(ObservationKind::Activity, "function", &atomizer).unwrap();
    assert_eq!(split, 1);
    let activities = person.observations(ObservationKind::Activity);
    let functions: Vec<&str> = activities.iter().map(|o| o.field("function").unwrap()).collect();
    assert_eq!(functions, vec!["coopman", "schipper", "boekhouder"]);
    // fragments are exact copies apart from the split field
    assert_eq!(activities[0].provenance(), activities[1].provenance());
    assert_eq!(activities[0].field("location").unwrap(), "batavia");
    assert_eq!(activities[1].start_date().raw(), "1700");

    // a second pass changes nothing
    let before = person.clone();
    assert_eq!(person.atomize_field(ObservationKind::Activity, "function", &atomizer).unwrap(), 0);
    assert_eq!(person, before);
}

#[test]
fn unknown_fields_are_a_configuration_error() {
    let atomizer = setup();
    let mut person = Person::new("person/42").unwrap();
    person.push(activity("obs-1", "coopman en schipper"));
    let err = person
        .atomize_field(ObservationKind::Activity, "appellation", &atomizer)
        .unwrap_err();
    assert!(matches!(err, ProsoponError::Configuration(_)));
    assert_eq!(person.observations(ObservationKind::Activity).len(), 1);
}
