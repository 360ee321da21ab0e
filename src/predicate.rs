// used to print out readable forms of the model
use std::fmt;

use crate::datatype::{DataType, Value};
use crate::error::{Result, RqlError};
use crate::operator::Operator;

// ------------- Target -------------

/// A normalized (lower-case) dotted property path, e.g. `address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    path: String,
}

impl Target {
    /// Validates and normalizes a dotted path. Every segment must be a
    /// non-empty run of ASCII alphanumerics and underscores.
    pub fn parse(path: &str) -> Result<Target> {
        let path = path.trim();
        if path.is_empty() {
            return Err(RqlError::parse("Empty field name"));
        }
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(RqlError::parse(format!("Empty segment in field name '{path}'")));
            }
            if let Some(c) = segment.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
                return Err(RqlError::parse(format!(
                    "Invalid character '{c}' in field name '{path}'"
                )));
            }
        }
        Ok(Target {
            path: path.to_ascii_lowercase(),
        })
    }
    pub fn as_str(&self) -> &str {
        &self.path
    }
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
    pub fn is_nested(&self) -> bool {
        self.path.contains('.')
    }
}

impl PartialEq<str> for Target {
    fn eq(&self, other: &str) -> bool {
        self.path.eq_ignore_ascii_case(other)
    }
}
impl PartialEq<&str> for Target {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

// ------------- Predicate -------------

/// A single comparison: `target operator values`.
///
/// It's intentional to keep the fields private and only expose them using
/// getters, so that the arity invariant established by [`Predicate::new`]
/// holds for the whole life of the predicate.
///
/// Bare literals keep their text next to the inferred value whenever that
/// text differs from the canonical form (`007`, `TRUE`, `1e3`), so that a
/// string property sees exactly what the caller wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    operator: Operator,
    target: Target,
    data_type: Option<DataType>,
    values: Vec<Value>,
    bare: Vec<Option<String>>,
}

impl Predicate {
    pub fn new(target: Target, operator: Operator, values: Vec<Value>) -> Result<Predicate> {
        let literals = values.into_iter().map(|value| (value, None)).collect();
        Predicate::from_literals(target, operator, literals)
    }

    /// Values paired with the bare text they were read from, if any.
    pub(crate) fn from_literals(
        target: Target,
        operator: Operator,
        literals: Vec<(Value, Option<String>)>,
    ) -> Result<Predicate> {
        let (values, bare): (Vec<Value>, Vec<Option<String>>) = literals
            .into_iter()
            .map(|(value, text)| {
                let text = text.filter(|text| *text != value.to_literal());
                (value, text)
            })
            .unzip();
        let arity = operator.arity();
        if !arity.accepts(values.len()) {
            return Err(RqlError::parse(format!(
                "Operator '{}' on '{}' expects {}, found {}",
                operator,
                target,
                arity.describe(),
                values.len()
            )));
        }
        Ok(Predicate {
            operator,
            data_type: values.first().map(Value::data_type),
            target,
            values,
            bare,
        })
    }
    pub fn operator(&self) -> Operator {
        self.operator
    }
    pub fn target(&self) -> &Target {
        &self.target
    }
    /// Type of the (first) literal, `None` for operators without values.
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }
    /// The bare text of the value at `index` when it is not the canonical
    /// rendering of the inferred value.
    pub fn bare_text(&self, index: usize) -> Option<&str> {
        self.bare.get(index).and_then(Option::as_deref)
    }
}

// ------------- Sorting and paging -------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub target: Target,
    pub direction: Direction,
}

impl SortKey {
    pub fn ascending(target: Target) -> Self {
        Self { target, direction: Direction::Ascending }
    }
    pub fn descending(target: Target) -> Self {
        Self { target, direction: Direction::Descending }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

// ------------- Criteria Tree -------------

/// The parsed form of one RQL string. Predicates are conjunctive and kept in
/// the order they were encountered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriteriaTree {
    projection: Vec<Target>,
    criteria: Vec<Predicate>,
    sort: Vec<SortKey>,
    page: Option<Page>,
}

impl CriteriaTree {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.criteria.push(predicate);
        self
    }
    pub fn with_projection(mut self, projection: Vec<Target>) -> Self {
        self.projection = projection;
        self
    }
    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }
    pub fn with_page(mut self, page: Option<Page>) -> Self {
        self.page = page;
        self
    }
    pub fn projection(&self) -> &[Target] {
        &self.projection
    }
    pub fn criteria(&self) -> &[Predicate] {
        &self.criteria
    }
    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }
    pub fn page(&self) -> Option<Page> {
        self.page
    }
    pub fn has_projection(&self) -> bool {
        !self.projection.is_empty()
    }
    pub fn has_criteria(&self) -> bool {
        !self.criteria.is_empty()
    }
    pub fn has_sort(&self) -> bool {
        !self.sort.is_empty()
    }
    pub fn is_empty(&self) -> bool {
        !self.has_projection() && !self.has_criteria() && !self.has_sort() && self.page.is_none()
    }
}
