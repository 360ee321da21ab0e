#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fabrica_rql::descriptor::{Descriptor, Entity};
use fabrica_rql::{CriteriaTree, Filter, build_filter, parse_criteria};

pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

pub struct Person {
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
    pub score: f64,
    pub balance: BigDecimal,
    pub active: bool,
    pub born: NaiveDate,
    pub joined: DateTime<Utc>,
    pub address: Option<Address>,
    pub manager: Option<Box<Person>>,
}

impl Entity for Address {
    fn describe(d: &mut Descriptor<Self>) {
        d.field("city", |a: &Address| a.city.clone())
            .field("zip", |a: &Address| a.zip.clone());
    }
}

impl Entity for Person {
    fn describe(d: &mut Descriptor<Self>) {
        d.field("name", |p: &Person| p.name.clone())
            .field("age", |p: &Person| p.age)
            .field("email", |p: &Person| p.email.clone())
            .field("score", |p: &Person| p.score)
            .field("balance", |p: &Person| p.balance.clone())
            .field("active", |p: &Person| p.active)
            .field("born", |p: &Person| p.born)
            .field("joined", |p: &Person| p.joined)
            .reference("address", |p: &Person| p.address.as_ref())
            .reference("manager", |p: &Person| p.manager.as_deref());
    }
}

pub fn person(name: &str, age: i32) -> Person {
    Person {
        name: name.to_owned(),
        age,
        email: None,
        score: 0.0,
        balance: BigDecimal::from(0),
        active: true,
        born: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"),
        joined: Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        address: None,
        manager: None,
    }
}

impl Person {
    pub fn living_in(mut self, city: &str) -> Self {
        self.address = Some(Address {
            city: city.to_owned(),
            zip: None,
        });
        self
    }
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_owned());
        self
    }
    pub fn managed_by(mut self, manager: Person) -> Self {
        self.manager = Some(Box::new(manager));
        self
    }
}

pub fn people() -> Vec<Person> {
    vec![
        person("bob", 25).living_in("Paris").with_email("bob@example.com"),
        person("alice", 30).living_in("Berlin"),
        person("carol", 19),
        person("dave", 42).living_in("paris").managed_by(person("alice", 30)),
        person("bobby", 10),
    ]
}

pub fn filter(rql: &str) -> Filter<Person> {
    let tree: CriteriaTree = parse_criteria(rql).expect("query parses");
    build_filter::<Person>(&tree).expect("filter builds")
}

/// Names of the people in `people()` that `rql` selects.
pub fn names(rql: &str) -> Vec<String> {
    let filter = filter(rql);
    people()
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| p.name.clone())
        .collect()
}
