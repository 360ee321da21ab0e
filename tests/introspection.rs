mod common;

use std::ops::RangeInclusive;

use chrono::{DateTime, TimeZone, Utc};
use common::{Person, people};
use fabrica_rql::introspect::{CriteriaObject, Inspector, introspect, introspect_for};
use fabrica_rql::{RqlError, build_filter, parse_criteria, serialize};

#[derive(Default)]
struct PersonCriteria {
    name: String,
    name_in: Vec<String>,
    age_range: Option<RangeInclusive<i32>>,
    score: Option<f64>,
    active: Option<bool>,
    city: Option<String>,
    joined: Option<DateTime<Utc>>,
}

impl CriteriaObject for PersonCriteria {
    fn inspect(i: &mut Inspector<'_, Self>) {
        i.property("name", |c| c.name.clone())
            .property("name_in", |c| c.name_in.clone())
            .property("age_range", |c| c.age_range.clone())
            .property("score", |c| c.score)
            .property("active", |c| c.active)
            .property("address.city", |c| c.city.clone())
            .property("joined", |c| c.joined);
    }
}

#[derive(Default)]
struct Misnamed {
    age: i32,
}

impl CriteriaObject for Misnamed {
    fn inspect(i: &mut Inspector<'_, Self>) {
        i.property("not a field", |c| c.age).property("agE", |c| c.age);
    }
}

struct Unknown;

impl CriteriaObject for Unknown {
    fn inspect(i: &mut Inspector<'_, Self>) {
        i.property("shoe_size", |_| 44);
    }
}

fn matching(tree: &fabrica_rql::CriteriaTree) -> Vec<String> {
    let filter = build_filter::<Person>(tree).expect("filter builds");
    people()
        .into_iter()
        .filter(|p| filter.matches(p))
        .map(|p| p.name)
        .collect()
}

#[test]
fn unset_properties_are_skipped() {
    assert!(introspect(&PersonCriteria::default()).is_empty());
}

#[test]
fn equals_parsing_the_same_text() {
    let criteria = PersonCriteria {
        name: "bob".into(),
        ..Default::default()
    };
    let tree = introspect(&criteria);
    assert_eq!(tree, parse_criteria("name=eq=bob").expect("parses"));
    assert_eq!(matching(&tree), vec!["bob"]);
}

#[test]
fn string_values_match_like_bare_text() {
    let criteria = PersonCriteria {
        name: "007".into(),
        ..Default::default()
    };
    let introspected = build_filter::<Person>(&introspect(&criteria)).expect("filter builds");
    let parsed = build_filter::<Person>(&parse_criteria("name=eq=007").expect("parses"))
        .expect("filter builds");
    for p in [common::person("007", 40), common::person("7", 40)] {
        assert_eq!(introspected.matches(&p), parsed.matches(&p), "{}", p.name);
    }
    assert_eq!(introspected.expression(), parsed.expression());
}

#[test]
fn lists_and_ranges() {
    let criteria = PersonCriteria {
        name_in: vec!["bob".into(), "carol".into()],
        age_range: Some(20..=30),
        ..Default::default()
    };
    let tree = introspect(&criteria);
    assert_eq!(
        tree,
        parse_criteria("name=in=bob,carol;age=bt=20,30").expect("parses")
    );
    assert_eq!(matching(&tree), vec!["bob"]);
}

#[test]
fn values_take_their_parsed_form() {
    let criteria = PersonCriteria {
        score: Some(1.5),
        active: Some(false),
        city: Some("Paris".into()),
        joined: Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).single().expect("timestamp")),
        ..Default::default()
    };
    let tree = introspect(&criteria);
    assert_eq!(
        tree,
        parse_criteria("score=eq=1.5;active=eq=false;address.city=eq=Paris;joined=eq=2024-01-05T10:30:00Z")
            .expect("parses")
    );
}

#[test]
fn explicit_values_in_options_are_kept() {
    // Some(false) is a deliberate filter, unlike a plain false
    let criteria = PersonCriteria {
        active: Some(false),
        ..Default::default()
    };
    assert_eq!(serialize(&introspect(&criteria)), "active=eq=false");
    assert!(matching(&introspect(&criteria)).is_empty());
}

#[test]
fn round_trips_through_text() {
    let criteria = PersonCriteria {
        name: "bob; \"the builder\"".into(),
        name_in: vec!["42".into(), "true".into(), String::new()],
        age_range: Some(30..=10),
        ..Default::default()
    };
    let tree = introspect(&criteria);
    let text = serialize(&tree);
    assert_eq!(parse_criteria(&text).expect("serialized form parses"), tree);
}

#[test]
fn invalid_names_are_skipped() {
    let tree = introspect(&Misnamed { age: 3 });
    assert_eq!(tree.criteria().len(), 1);
    assert_eq!(tree.criteria()[0].target(), "age");
}

#[test]
fn checked_against_the_target_type() {
    let criteria = PersonCriteria {
        city: Some("Paris".into()),
        ..Default::default()
    };
    introspect_for::<Person, _>(&criteria).expect("all paths exist");
    assert_eq!(
        introspect_for::<Person, _>(&Unknown).unwrap_err(),
        RqlError::UnknownProperty {
            path: "shoe_size".into()
        }
    );
}
