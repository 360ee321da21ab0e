//! Rendering of criteria trees back into canonical RQL text.
//!
//! The output is what the parser reads back into an equal tree: operators go
//! through the shared mnemonic table and literals are written so that
//! inference recovers their type.

use std::fmt;

use crate::datatype::Value;
use crate::predicate::{CriteriaTree, Direction, Predicate};

// characters that end or split a bare word, plus the escape character
const RESERVED: [char; 10] = [';', '&', ',', '(', ')', '=', '"', '\'', '\\', ' '];

/// Renders a tree as `select(...)`, then the predicates, then `sort(...)`
/// and `limit(...)`, joined by `;`.
pub fn serialize(tree: &CriteriaTree) -> String {
    let mut clauses = Vec::new();
    if tree.has_projection() {
        let fields: Vec<&str> = tree.projection().iter().map(|t| t.as_str()).collect();
        clauses.push(format!("select({})", fields.join(",")));
    }
    clauses.extend(tree.criteria().iter().map(predicate));
    if tree.has_sort() {
        let keys: Vec<String> = tree
            .sort()
            .iter()
            .map(|key| match key.direction {
                Direction::Ascending => format!("+{}", key.target),
                Direction::Descending => format!("-{}", key.target),
            })
            .collect();
        clauses.push(format!("sort({})", keys.join(",")));
    }
    if let Some(page) = tree.page() {
        if page.offset == 0 {
            clauses.push(format!("limit({})", page.limit));
        } else {
            clauses.push(format!("limit({},{})", page.limit, page.offset));
        }
    }
    clauses.join(";")
}

fn predicate(predicate: &Predicate) -> String {
    // bare text is written back as it was read
    let values: Vec<String> = predicate
        .values()
        .iter()
        .enumerate()
        .map(|(index, value)| {
            predicate.bare_text(index).map_or_else(|| literal(value), str::to_owned)
        })
        .collect();
    format!("{}{}{}", predicate.target(), predicate.operator(), values.join(","))
}

/// A value as it must be written for the tokenizer to read it back.
pub fn literal(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quotes(s) => {
            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
        }
        _ => value.to_literal(),
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c))
        || Value::infer(s) != Value::String(s.to_owned())
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", predicate(self))
    }
}

impl fmt::Display for CriteriaTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", serialize(self))
    }
}
