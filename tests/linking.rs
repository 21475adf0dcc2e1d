use prosopon::construct::{Detail, Observation, ObservationKind, Person, Provenance};
use prosopon::datatype::UNKNOWN;
use prosopon::link::{Link, LinkMode, Linker, UnresolvedSink, UnresolvedTerms, Vocabulary};
use prosopon::ProsoponError;

const NS: &str = "https://data.globalise.huygens.knaw.nl/";
const COOPMAN: &str = "https://data.globalise.huygens.knaw.nl/function/coopman";
const SCHIPPER: &str = "https://data.globalise.huygens.knaw.nl/function/schipper";

fn vocabulary() -> Vocabulary {
    vec![(" Coopman", COOPMAN), ("schipper ", SCHIPPER)]
        .into_iter()
        .collect::<Vocabulary>()
        .with_excluded(["onbekende functie"])
}

fn activity(id: &str, function: &str) -> Observation {
    Observation::new(
        Provenance::new("VOC 1234", id),
        Detail::Activity {
            function: function.to_string(),
            function_type: String::new(),
            employer: "-1".to_string(),
            location: String::new(),
        },
    )
    .unwrap()
}

fn setup() -> Person {
    let mut person = Person::new("person/42").unwrap();
    for (id, function) in [
        ("obs-1", "coopman"),
        ("obs-2", "Schipper"),
        ("obs-3", "soldaat"),
        ("obs-4", "onbekende functie"),
        ("obs-5", "-1"),
        ("obs-6", "bottelier"),
        ("obs-7", "soldaat"),
    ] {
        person.push(activity(id, function));
    }
    person
}

fn functions(person: &Person) -> Vec<String> {
    person
        .observations(ObservationKind::Activity)
        .iter()
        .map(|o| o.field("function").unwrap().to_string())
        .collect()
}

#[test]
fn lookup_is_on_the_normalized_form() {
    let vocabulary = vocabulary();
    assert_eq!(vocabulary.len(), 2);
    assert_eq!(vocabulary.lookup("COOPMAN "), Some(COOPMAN));
    assert_eq!(vocabulary.lookup("schipper"), Some(SCHIPPER));
    assert_eq!(vocabulary.lookup("soldaat"), None);
    assert!(vocabulary.is_excluded(" Onbekende Functie"));
}

#[test]
fn single_values() {
    let provisional = Linker::new(vocabulary(), LinkMode::Provisional, NS);
    let last = Linker::new(vocabulary(), LinkMode::Final, NS);
    for linker in [&provisional, &last] {
        assert_eq!(linker.link(" Coopman "), Link::Canonical(COOPMAN.to_string()));
        assert_eq!(linker.link("onbekende functie"), Link::Excluded);
        assert_eq!(linker.link(""), Link::Absent);
        assert_eq!(linker.link("-1"), Link::Absent);
        // already linked values are accepted as they are in both modes
        assert_eq!(linker.link(COOPMAN), Link::Canonical(COOPMAN.to_string()));
        assert_eq!(
            linker.link("https://data.globalise.huygens.knaw.nl/function/unmapped"),
            Link::Canonical("https://data.globalise.huygens.knaw.nl/function/unmapped".to_string())
        );
    }
    assert_eq!(provisional.link(" soldaat"), Link::Unresolved("soldaat".to_string()));
    assert_eq!(last.link(" soldaat"), Link::Unknown("soldaat".to_string()));
}

#[test]
fn provisional_misses_keep_their_text() {
    let linker = Linker::new(vocabulary(), LinkMode::Provisional, NS);
    let mut person = setup();
    let mut log = UnresolvedTerms::new();
    let summary = person
        .link_field(ObservationKind::Activity, "function", &linker, &mut log)
        .unwrap();
    assert_eq!(
        functions(&person),
        vec![COOPMAN, SCHIPPER, "soldaat", "-1", "bottelier", "soldaat"]
    );
    assert_eq!(log.terms(), &["soldaat".to_string(), "bottelier".to_string()]);
    assert_eq!(summary.linked, 2);
    assert_eq!(summary.unresolved, 3);
    assert_eq!(summary.excluded, 1);
    assert_eq!(summary.absent, 1);
    assert_eq!(summary.total(), 7);
}

#[test]
fn final_misses_become_unknown() {
    let linker = Linker::new(vocabulary(), LinkMode::Final, NS);
    let mut person = setup();
    let mut log = UnresolvedTerms::new();
    let summary = person
        .link_field(ObservationKind::Activity, "function", &linker, &mut log)
        .unwrap();
    assert_eq!(functions(&person), vec![COOPMAN, SCHIPPER, UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN]);
    assert_eq!(log.len(), 2);
    assert!(log.contains("Soldaat"));
    assert!(log.contains("bottelier"));
    assert_eq!(summary.unknown, 3);
    assert_eq!(summary.absent, 1);
}

#[test]
fn every_value_is_accounted_for() {
    for mode in [LinkMode::Provisional, LinkMode::Final] {
        let linker = Linker::new(vocabulary(), mode, NS);
        let mut person = setup();
        let originals: Vec<Observation> = person.observations(ObservationKind::Activity).to_vec();
        let mut log = UnresolvedTerms::new();
        person
            .link_field(ObservationKind::Activity, "function", &linker, &mut log)
            .unwrap();
        let linked = person.observations(ObservationKind::Activity);
        let remaining: Vec<&Observation> = originals
            .iter()
            .filter(|o| !linker.vocabulary().is_excluded(o.field("function").unwrap()))
            .collect();
        assert_eq!(linked.len(), remaining.len());
        for (before, after) in remaining.iter().zip(linked) {
            let raw = before.field("function").unwrap();
            let now = after.field("function").unwrap();
            assert!(
                linker.is_canonical(now)
                    || (now == UNKNOWN && (raw == UNKNOWN || log.contains(raw)))
                    || log.contains(now),
                "`{}` became `{}` without a trace",
                raw,
                now
            );
        }
    }
}

#[test]
fn relinking_is_a_no_op() {
    let linker = Linker::new(vocabulary(), LinkMode::Final, NS);
    let mut person = setup();
    let mut log = UnresolvedTerms::new();
    person
        .link_field(ObservationKind::Activity, "function", &linker, &mut log)
        .unwrap();
    let once = person.clone();
    let mut again = UnresolvedTerms::new();
    person
        .link_field(ObservationKind::Activity, "function", &linker, &mut again)
        .unwrap();
    assert_eq!(person, once);
    assert!(again.is_empty());
}

#[test]
fn unknown_fields_are_a_configuration_error() {
    let linker = Linker::new(vocabulary(), LinkMode::Provisional, NS);
    let mut person = setup();
    let mut log = UnresolvedTerms::new();
    let err = person
        .link_field(ObservationKind::Activity, "status", &linker, &mut log)
        .unwrap_err();
    assert!(matches!(err, ProsoponError::Configuration(_)));
}

#[test]
fn unresolved_terms_are_deduplicated_in_first_seen_order() {
    let mut log = UnresolvedTerms::new();
    log.record("Schipper");
    log.record(" schipper ");
    log.record("bottelier");
    let mut worker = UnresolvedTerms::new();
    worker.record("BOTTELIER");
    worker.record("kok");
    log.absorb(worker);
    assert_eq!(log.terms(), &["Schipper".to_string(), "bottelier".to_string(), "kok".to_string()]);

    let mut out = Vec::new();
    log.write_to(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Schipper\nbottelier\nkok\n");
}

#[test]
fn custom_sinks() {
    struct Count(usize);
    impl UnresolvedSink for Count {
        fn record(&mut self, _value: &str) {
            self.0 += 1;
        }
    }
    let linker = Linker::new(vocabulary(), LinkMode::Provisional, NS);
    let mut person = setup();
    let mut count = Count(0);
    person
        .link_field(ObservationKind::Activity, "function", &linker, &mut count)
        .unwrap();
    // the sink sees every miss, deduplication is up to the sink
    assert_eq!(count.0, 3);
}

#[test]
fn namespaces_match_regardless_of_case() {
    let linker = Linker::new(Vocabulary::new(), LinkMode::Final, " HTTPS://Data.Globalise.huygens.knaw.nl/ ");
    assert_eq!(linker.namespace(), NS);
    assert!(linker.is_canonical(COOPMAN));
    assert_eq!(linker.link(COOPMAN), Link::Canonical(COOPMAN.to_string()));

    // stored values are folded, so a capitalized namespace still short-circuits
    let mut person = Person::new("person/42").unwrap();
    person.push(activity("obs-1", "https://data.globalise.huygens.knaw.nl/Function/Coopman"));
    let mut log = UnresolvedTerms::new();
    let summary = person
        .link_field(ObservationKind::Activity, "function", &linker, &mut log)
        .unwrap();
    assert_eq!(summary.linked, 1);
    assert!(log.is_empty());
    assert_eq!(functions(&person), vec!["https://data.globalise.huygens.knaw.nl/function/coopman"]);
}
