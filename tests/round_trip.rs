use fabrica_rql::{CriteriaTree, Predicate, Target, Value, parse_criteria, serialize};
use fabrica_rql::operator::Operator;
use fabrica_rql::predicate::{Page, SortKey};

fn canonical(rql: &str) -> String {
    serialize(&parse_criteria(rql).expect("parses"))
}

#[test]
fn parse_of_serialize_is_identity() {
    for rql in [
        "",
        "name=eq=bob;age=ge=21",
        "address.city=in=Paris,\"New York\",'Zürich'",
        "email=null=;email=notnull=",
        "age=bt=30,10",
        "score=gt=-1.25;balance=le=100.0;active=ne=false",
        "born=lt=2000-01-01;joined=ge=2024-01-05T10:30:00.250+01:00",
        "name=like=b*b&name=out=\"a,b\",\"c;d\",\"(e)\"",
        "name=eq=\"\";name=eq=\"true\";name=eq=\"12\";name=eq='2024-01-01'",
        "name=eq=\"back\\\\slash\";name=eq=\"say \\\"hi\\\"\"",
        "select(name,address.city);sort(-age,name);limit(10,5)",
        "limit(3);name=eq=x",
        "name=eq=007;name=eq=TRUE;name=in=+5,1e3,1.50",
        "joined=ge=2024-01-05T10:30:00+02:00",
    ] {
        let tree = parse_criteria(rql).expect("parses");
        let text = serialize(&tree);
        assert_eq!(parse_criteria(&text).expect("serialized form parses"), tree, "{rql} -> {text}");
    }
}

#[test]
fn canonical_forms() {
    assert_eq!(canonical(" Name =EQ= bob & AGE=ge=21 "), "name=eq=bob;age=ge=21");
    assert_eq!(canonical("name=eq='bob'"), "name=eq=bob");
    assert_eq!(canonical("name=eq=\"a;b\""), "name=eq=\"a;b\"");
    assert_eq!(canonical("name=eq=\"true\""), "name=eq=\"true\"");
    assert_eq!(canonical("name=eq=\"it's\""), "name=eq=\"it's\"");
    assert_eq!(canonical("name=eq='say \"hi\"'"), "name=eq=\"say \\\"hi\\\"\"");
    assert_eq!(canonical("price=eq=10.0;price=eq=3.14"), "price=eq=10.0;price=eq=3.14");
    assert_eq!(
        canonical("joined=ge=2024-01-05T08:30:00.000Z"),
        "joined=ge=2024-01-05T08:30:00.000Z"
    );
    assert_eq!(canonical("born=eq=2024-01-05"), "born=eq=2024-01-05");
    assert_eq!(canonical("status=in=a , b,c"), "status=in=a,b,c");
}

#[test]
fn directives_come_first_and_last() {
    assert_eq!(
        canonical("limit(5);sort(name);age=gt=1;select(name)"),
        "select(name);age=gt=1;sort(+name);limit(5)"
    );
    assert_eq!(canonical("limit(5,0)"), "limit(5)");
    assert_eq!(canonical("limit(5,2)"), "limit(5,2)");
}

#[test]
fn built_trees_serialize() {
    let tree = CriteriaTree::new()
        .with_predicate(
            Predicate::new(
                Target::parse("Address.City").expect("valid path"),
                Operator::Like,
                vec![Value::from("par*")],
            )
            .expect("valid predicate"),
        )
        .with_predicate(
            Predicate::new(Target::parse("age").expect("valid path"), Operator::IsNull, vec![])
                .expect("valid predicate"),
        )
        .with_sort(vec![SortKey::descending(Target::parse("age").expect("valid path"))])
        .with_page(Some(Page { limit: 1, offset: 0 }));
    assert_eq!(tree.to_string(), "address.city=like=par*;age=null=;sort(-age);limit(1)");
    assert_eq!(tree.criteria()[0].to_string(), "address.city=like=par*");
    assert_eq!(parse_criteria(&tree.to_string()).expect("parses"), tree);
}

#[test]
fn invalid_predicates_cannot_be_built() {
    let target = Target::parse("age").expect("valid path");
    assert!(Predicate::new(target.clone(), Operator::Between, vec![Value::from(1i64)]).is_err());
    assert!(Predicate::new(target.clone(), Operator::In, vec![]).is_err());
    assert!(Predicate::new(target, Operator::IsNotNull, vec![Value::from(true)]).is_err());
    assert!(Target::parse("address..city").is_err());
    assert!(Target::parse("na-me").is_err());
}

#[test]
fn bare_text_is_written_back_as_read() {
    assert_eq!(canonical("name=eq=007"), "name=eq=007");
    assert_eq!(canonical("name=eq=TRUE;name=eq=+5;name=eq=1e3"), "name=eq=TRUE;name=eq=+5;name=eq=1e3");
    assert_eq!(
        canonical("joined=ge=2024-01-05T10:30:00+02:00"),
        "joined=ge=2024-01-05T10:30:00+02:00"
    );

    let tree = parse_criteria("name=eq=007").expect("parses");
    let predicate = &tree.criteria()[0];
    assert_eq!(predicate.value(), Some(&Value::Integer(7)));
    assert_eq!(predicate.bare_text(0), Some("007"));
    assert_eq!(parse_criteria("name=eq=7").expect("parses").criteria()[0].bare_text(0), None);
    assert_ne!(parse_criteria("name=eq=7").expect("parses"), tree);

    // values built in code render canonically
    let joined = Value::infer("2024-01-05T10:30:00+02:00");
    let built = Predicate::new(Target::parse("joined").expect("valid path"), Operator::GreaterThanOrEqual, vec![joined])
        .expect("valid predicate");
    assert_eq!(built.to_string(), "joined=ge=2024-01-05T08:30:00Z");
}

#[test]
fn field_names_are_ascii() {
    let err = parse_criteria("İd=eq=1").unwrap_err();
    assert!(err.to_string().contains("Invalid character"), "{err}");
    assert!(parse_criteria("Größe=eq=1").is_err());

    for rql in ["ID=eq=1", "Address.CITY=eq=x", "snake_case_2=eq=1"] {
        let tree = parse_criteria(rql).expect("parses");
        let text = serialize(&tree);
        assert_eq!(parse_criteria(&text).expect("serialized form parses"), tree, "{rql} -> {text}");
    }
    assert_eq!(canonical("ID=eq=1"), "id=eq=1");
}

#[test]
fn every_operator_has_a_mnemonic() {
    for op in Operator::ALL {
        assert_eq!(Operator::from_mnemonic(op.mnemonic()), Some(op), "{op:?}");
        assert_eq!(Operator::from_mnemonic(&op.mnemonic().to_uppercase()), Some(op), "{op:?}");
        assert_eq!(op.to_string(), format!("={}=", op.mnemonic()));
    }
    let mut mnemonics: Vec<&str> = Operator::ALL.iter().map(|op| op.mnemonic()).collect();
    mnemonics.sort_unstable();
    mnemonics.dedup();
    assert_eq!(mnemonics.len(), Operator::ALL.len());
}
