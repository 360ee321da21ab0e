//! Translation of a [`CriteriaTree`] into an executable filter.
//!
//! Every predicate is resolved against the target type's descriptor, its
//! literals are coerced into the property type and the comparison is compiled
//! into a closure. The closures are combined with AND in criteria order. The
//! same resolved information is kept as an [`Expression`] so that a query
//! provider can translate the filter into its own form.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace, warn};

use crate::datatype::{DataType, Value};
use crate::descriptor::{Entity, ResolvedPath, TypeDescriptor};
use crate::error::{Result, RqlError};
use crate::operator::{Arity, Operator};
use crate::predicate::{CriteriaTree, Predicate};
use crate::settings::RqlSettings;

type Test = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

// ------------- Expression -------------

/// A comparison with its path resolved and its values coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: String,
    /// Property type, `None` when the path ends at a navigation.
    pub data_type: Option<DataType>,
    pub nullable: bool,
    pub operator: Operator,
    pub values: Vec<Value>,
}

/// Provider-neutral form of a built filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Matches everything.
    True,
    Compare(Comparison),
    And(Vec<Expression>),
}

impl Expression {
    fn and(self, other: Expression) -> Expression {
        match (self, other) {
            (Expression::True, e) | (e, Expression::True) => e,
            (Expression::And(mut left), Expression::And(right)) => {
                left.extend(right);
                Expression::And(left)
            }
            (Expression::And(mut left), e) => {
                left.push(e);
                Expression::And(left)
            }
            (e, Expression::And(mut right)) => {
                right.insert(0, e);
                Expression::And(right)
            }
            (left, right) => Expression::And(vec![left, right]),
        }
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::Integer(_) | Value::Float(_) | Value::Decimal(_) | Value::Boolean(_) => {
            value.to_literal()
        }
        _ => format!("'{}'", value.to_literal().replace('\'', "''")),
    }
}

fn listed(values: &[Value]) -> String {
    values.iter().map(quoted).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let first = self.values.first().map(quoted).unwrap_or_default();
        match self.operator {
            Operator::Equal => write!(f, "{} = {}", self.path, first),
            Operator::NotEqual => write!(f, "{} <> {}", self.path, first),
            Operator::GreaterThan => write!(f, "{} > {}", self.path, first),
            Operator::GreaterThanOrEqual => write!(f, "{} >= {}", self.path, first),
            Operator::LessThan => write!(f, "{} < {}", self.path, first),
            Operator::LessThanOrEqual => write!(f, "{} <= {}", self.path, first),
            Operator::Like => write!(f, "{} LIKE {}", self.path, first),
            Operator::In => write!(f, "{} IN ({})", self.path, listed(&self.values)),
            Operator::Out => write!(f, "{} NOT IN ({})", self.path, listed(&self.values)),
            Operator::IsNull => write!(f, "{} IS NULL", self.path),
            Operator::IsNotNull => write!(f, "{} IS NOT NULL", self.path),
            Operator::Between => write!(
                f,
                "{} BETWEEN {} AND {}",
                self.path,
                first,
                self.values.get(1).map(quoted).unwrap_or_default()
            ),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::True => write!(f, "TRUE"),
            Expression::Compare(c) => write!(f, "{c}"),
            Expression::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                write!(f, "{}", rendered.join(" AND "))
            }
        }
    }
}

// ------------- Filter -------------

/// A boolean test over instances of `T`.
pub struct Filter<T> {
    expression: Expression,
    tests: Vec<Test>,
    _entity: PhantomData<fn(&T) -> bool>,
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            tests: self.tests.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Filter").field("expression", &self.expression).finish()
    }
}

impl<T: Entity> Filter<T> {
    /// A filter that accepts every instance.
    pub fn match_all() -> Self {
        Self {
            expression: Expression::True,
            tests: Vec::new(),
            _entity: PhantomData,
        }
    }
    pub fn matches(&self, item: &T) -> bool {
        let item: &dyn Any = item;
        self.tests.iter().all(|test| test(item))
    }
    pub fn is_match_all(&self) -> bool {
        self.tests.is_empty()
    }
    pub fn expression(&self) -> &Expression {
        &self.expression
    }
    /// Keeps the items that pass the filter.
    pub fn apply<'s, 'a, I>(&'s self, items: I) -> impl Iterator<Item = &'a T> + 's
    where
        'a: 's,
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: 's,
    {
        items.into_iter().filter(move |item| self.matches(item))
    }
    /// Both filters must accept.
    pub fn and(mut self, other: Filter<T>) -> Filter<T> {
        self.expression = self.expression.and(other.expression);
        self.tests.extend(other.tests);
        self
    }
    /// The filter as a plain predicate closure.
    pub fn as_fn(&self) -> impl Fn(&T) -> bool + '_ {
        move |item| self.matches(item)
    }
}

/// Independently parsed filters combined with OR by the caller.
pub struct FilterUnion<T> {
    filters: Vec<Filter<T>>,
}

impl<T: Entity> FilterUnion<T> {
    pub fn new(filters: Vec<Filter<T>>) -> Self {
        Self { filters }
    }
    /// True when any member accepts; an empty union accepts nothing.
    pub fn matches(&self, item: &T) -> bool {
        self.filters.iter().any(|f| f.matches(item))
    }
    pub fn filters(&self) -> &[Filter<T>] {
        &self.filters
    }
}

// ------------- Builder -------------

/// Builds a filter for `T` with default settings.
pub fn build_filter<T: Entity>(tree: &CriteriaTree) -> Result<Filter<T>> {
    FilterBuilder::default().build(tree)
}

#[derive(Debug, Clone)]
pub struct FilterBuilder {
    wildcard: Option<char>,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::from_settings(&RqlSettings::default())
    }
}

impl FilterBuilder {
    pub fn from_settings(settings: &RqlSettings) -> Self {
        Self {
            wildcard: settings.wildcard(),
        }
    }
    pub fn wildcard(&self) -> Option<char> {
        self.wildcard
    }

    pub fn build<T: Entity>(&self, tree: &CriteriaTree) -> Result<Filter<T>> {
        let descriptor = TypeDescriptor::of::<T>();
        let mut filter = Filter::<T>::match_all();
        for predicate in tree.criteria() {
            let (comparison, test) = self
                .compile(&descriptor, predicate)
                .inspect_err(|e| warn!(error = %e, type_name = descriptor.type_name(), "filter rejected"))?;
            trace!(%comparison, "compiled predicate");
            filter.expression = filter.expression.and(Expression::Compare(comparison));
            filter.tests.push(test);
        }
        debug!(
            type_name = descriptor.type_name(),
            predicates = filter.tests.len(),
            "built filter"
        );
        Ok(filter)
    }

    fn compile(&self, descriptor: &TypeDescriptor, predicate: &Predicate) -> Result<(Comparison, Test)> {
        let path = descriptor.resolve(predicate.target())?;
        let operator = predicate.operator();
        let Some(data_type) = path.data_type() else {
            if operator.arity() != Arity::Unary {
                return Err(unsupported(&path, operator, "reference"));
            }
            // null checks on a navigation itself
            let comparison = Comparison {
                path: path.path().to_owned(),
                data_type: None,
                nullable: true,
                operator,
                values: Vec::new(),
            };
            let test = null_test(path, None, operator == Operator::IsNull);
            return Ok((comparison, test));
        };
        if operator.is_ordering() && !data_type.is_ordered() {
            return Err(unsupported(&path, operator, data_type.name()));
        }
        if operator == Operator::Like && data_type != DataType::String {
            return Err(unsupported(&path, operator, data_type.name()));
        }
        let mut values = predicate
            .values()
            .iter()
            .enumerate()
            .map(|(index, value)| match predicate.bare_text(index) {
                // strings take the literal exactly as written
                Some(text) if data_type == DataType::String => Ok(Value::String(text.to_owned())),
                text => value.coerce(data_type).ok_or_else(|| RqlError::TypeCoercion {
                    field: path.path().to_owned(),
                    expected: data_type.name().to_owned(),
                    literal: text.map_or_else(|| value.to_literal(), str::to_owned),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        if operator == Operator::Between && values[0] > values[1] {
            values.swap(0, 1);
        }
        let comparison = Comparison {
            path: path.path().to_owned(),
            data_type: Some(data_type),
            nullable: path.nullable(),
            operator,
            values: values.clone(),
        };
        let test = match operator {
            Operator::IsNull | Operator::IsNotNull => {
                // non-nullable properties count their default value as null
                let default = (!path.nullable()).then(|| data_type.default_value());
                null_test(path, default, operator == Operator::IsNull)
            }
            Operator::Like => self.like_test(path, &values[0])?,
            _ => comparison_test(path, operator, values),
        };
        Ok((comparison, test))
    }

    fn like_test(&self, path: ResolvedPath, pattern: &Value) -> Result<Test> {
        let pattern = pattern.as_str().unwrap_or_default().to_owned();
        match self.wildcard.filter(|w| pattern.contains(*w)) {
            Some(wildcard) => {
                let expression = pattern
                    .split(wildcard)
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                let regex: Regex = RegexBuilder::new(&format!("^{expression}$"))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RqlError::TypeCoercion {
                        field: path.path().to_owned(),
                        expected: "like pattern".to_owned(),
                        literal: format!("{pattern} ({e})"),
                    })?;
                Ok(Arc::new(move |root: &dyn Any| {
                    path.read(root)
                        .is_some_and(|v| v.as_str().is_some_and(|s| regex.is_match(s)))
                }))
            }
            None => {
                let needle = pattern.to_lowercase();
                Ok(Arc::new(move |root: &dyn Any| {
                    path.read(root).is_some_and(|v| {
                        v.as_str().is_some_and(|s| s.to_lowercase().contains(&needle))
                    })
                }))
            }
        }
    }
}

fn unsupported(path: &ResolvedPath, operator: Operator, data_type: &str) -> RqlError {
    RqlError::UnsupportedOperator {
        field: path.path().to_owned(),
        operator: operator.to_string(),
        data_type: data_type.to_owned(),
    }
}

fn null_test(path: ResolvedPath, default: Option<Value>, is_null: bool) -> Test {
    Arc::new(move |root: &dyn Any| {
        let null = path.is_null(root)
            || default
                .as_ref()
                .is_some_and(|d| path.read(root).as_ref() == Some(d));
        null == is_null
    })
}

// null on the way (or at the property) fails every comparison
fn comparison_test(path: ResolvedPath, operator: Operator, values: Vec<Value>) -> Test {
    use std::cmp::Ordering::*;
    Arc::new(move |root: &dyn Any| {
        let Some(actual) = path.read(root) else {
            return false;
        };
        let ordering = || actual.partial_cmp(&values[0]);
        match operator {
            Operator::Equal => actual == values[0],
            Operator::NotEqual => actual != values[0],
            Operator::GreaterThan => ordering() == Some(Greater),
            Operator::GreaterThanOrEqual => matches!(ordering(), Some(Greater | Equal)),
            Operator::LessThan => ordering() == Some(Less),
            Operator::LessThanOrEqual => matches!(ordering(), Some(Less | Equal)),
            Operator::In => values.contains(&actual),
            Operator::Out => !values.contains(&actual),
            Operator::Between => {
                matches!(actual.partial_cmp(&values[0]), Some(Greater | Equal))
                    && matches!(actual.partial_cmp(&values[1]), Some(Less | Equal))
            }
            Operator::Like | Operator::IsNull | Operator::IsNotNull => false,
        }
    })
}
