use std::fs;
use std::path::PathBuf;

use fabrica_rql::filter::FilterBuilder;
use fabrica_rql::parser::Parser;
use fabrica_rql::{RqlError, RqlSettings};

// one file per test, tests run in parallel
fn settings_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fabrica_rql_{}_{name}.toml", std::process::id()));
    fs::write(&path, contents).expect("temp file written");
    path
}

#[test]
fn defaults() {
    let settings = RqlSettings::default();
    assert_eq!(settings.max_clauses, 64);
    assert_eq!(settings.max_values, 256);
    assert_eq!(settings.max_length, 4096);
    assert_eq!(settings.wildcard(), Some('*'));
    assert_eq!(settings.default_limit, None);
}

#[test]
fn missing_file_gives_defaults() {
    let settings = RqlSettings::load_from("/nonexistent/fabrica/rql").expect("settings load");
    assert_eq!(settings.max_values, RqlSettings::default().max_values);
}

#[test]
fn loaded_from_file() {
    let path = settings_file(
        "loaded",
        "max_clauses = 2\nlike_wildcard = \"%\"\ndefault_limit = 25\n",
    );
    let settings = RqlSettings::load_from(path.to_str().expect("utf-8 path")).expect("settings load");
    fs::remove_file(&path).ok();
    assert_eq!(settings.max_clauses, 2);
    assert_eq!(settings.wildcard(), Some('%'));
    assert_eq!(settings.default_limit, Some(25));
    // untouched keys keep their defaults
    assert_eq!(settings.max_values, 256);

    let err = Parser::new(&settings).parse("a=eq=1;b=eq=2;c=eq=3").unwrap_err();
    assert!(matches!(err, RqlError::Parse { .. }));
    assert!(FilterBuilder::from_settings(&settings).wildcard().is_some());
}

#[test]
fn invalid_file_is_a_config_error() {
    let path = settings_file("invalid", "max_clauses = \"lots\"\n");
    let err = RqlSettings::load_from(path.to_str().expect("utf-8 path")).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(err, RqlError::Config(_)), "{err:?}");
    assert!(!err.is_client_error());
    assert_eq!(err.status_code(), 500);
}
