//! Criteria trees built from typed criteria objects instead of text.
//!
//! A criteria object lists its properties in [`CriteriaObject::inspect`]. The
//! Rust type a getter returns decides the predicate: a plain value becomes an
//! equality, a `Vec` becomes `=in=` and a `RangeInclusive` becomes `=bt=`.
//! Unset properties (default values, `None`, empty lists) are skipped.
//!
//! ```
//! use fabrica_rql::introspect::{introspect, CriteriaObject, Inspector};
//! use fabrica_rql::serialize;
//!
//! #[derive(Default)]
//! struct PersonCriteria { name: String, age_range: Option<std::ops::RangeInclusive<i32>> }
//!
//! impl CriteriaObject for PersonCriteria {
//!     fn inspect(i: &mut Inspector<'_, Self>) {
//!         i.property("name", |c| c.name.clone())
//!             .property("age_range", |c| c.age_range.clone());
//!     }
//! }
//!
//! let criteria = PersonCriteria { name: "bob".into(), age_range: Some(18..=30) };
//! assert_eq!(serialize(&introspect(&criteria)), "name=eq=bob;age=bt=18,30");
//! ```

use std::ops::RangeInclusive;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::datatype::{FieldType, Value};
use crate::descriptor::{Entity, TypeDescriptor};
use crate::error::Result;
use crate::operator::Operator;
use crate::predicate::{CriteriaTree, Predicate, Target};

/// A typed object whose populated properties describe a filter.
pub trait CriteriaObject: Sized {
    fn inspect(inspector: &mut Inspector<'_, Self>);
}

/// A property type that can turn into a predicate.
pub trait CriteriaValue {
    /// The operator and values, or `None` when the property is unset.
    fn criterion(self) -> Option<(Operator, Vec<Value>)>;
}

fn value<V: FieldType>(v: V) -> Option<Value> {
    v.into_value().map(Value::canonical)
}

macro_rules! criteria_values {
    ($($t:ty),*) => {
        $(
            impl CriteriaValue for $t {
                fn criterion(self) -> Option<(Operator, Vec<Value>)> {
                    if self == <$t>::default() {
                        return None;
                    }
                    Some((Operator::Equal, vec![value(self)?]))
                }
            }
            impl CriteriaValue for Option<$t> {
                fn criterion(self) -> Option<(Operator, Vec<Value>)> {
                    Some((Operator::Equal, vec![value(self?)?]))
                }
            }
            impl CriteriaValue for Vec<$t> {
                fn criterion(self) -> Option<(Operator, Vec<Value>)> {
                    let values: Vec<Value> = self.into_iter().filter_map(value).collect();
                    (!values.is_empty()).then_some((Operator::In, values))
                }
            }
            impl CriteriaValue for RangeInclusive<$t> {
                fn criterion(self) -> Option<(Operator, Vec<Value>)> {
                    let (start, end) = self.into_inner();
                    Some((Operator::Between, vec![value(start)?, value(end)?]))
                }
            }
            impl CriteriaValue for Option<RangeInclusive<$t>> {
                fn criterion(self) -> Option<(Operator, Vec<Value>)> {
                    self?.criterion()
                }
            }
        )*
    };
}

criteria_values!(
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    String,
    f32,
    f64,
    bool,
    BigDecimal,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate
);

/// Collects predicates from one criteria object.
pub struct Inspector<'o, C> {
    object: &'o C,
    criteria: Vec<Predicate>,
}

// `age_range` and `status_in` filter `age` and `status`
fn field_name(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    match name.strip_suffix("_range").or_else(|| name.strip_suffix("_in")) {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => name,
    }
}

impl<'o, C: CriteriaObject> Inspector<'o, C> {
    pub fn property<V, F>(&mut self, name: &str, get: F) -> &mut Self
    where
        V: CriteriaValue,
        F: Fn(&C) -> V,
    {
        let Some((operator, values)) = get(self.object).criterion() else {
            return self;
        };
        let predicate = Target::parse(&field_name(name))
            .and_then(|target| Predicate::new(target, operator, values));
        match predicate {
            Ok(predicate) => self.criteria.push(predicate),
            Err(e) => warn!(property = name, error = %e, "skipped criteria property"),
        }
        self
    }
}

/// The criteria tree equivalent to the populated properties of `object`.
pub fn introspect<C: CriteriaObject>(object: &C) -> CriteriaTree {
    let mut inspector = Inspector {
        object,
        criteria: Vec::new(),
    };
    C::inspect(&mut inspector);
    debug!(predicates = inspector.criteria.len(), "introspected criteria");
    inspector
        .criteria
        .into_iter()
        .fold(CriteriaTree::new(), CriteriaTree::with_predicate)
}

/// Like [`introspect`], but checks every property path against `T`.
pub fn introspect_for<T: Entity, C: CriteriaObject>(object: &C) -> Result<CriteriaTree> {
    let tree = introspect(object);
    let descriptor = TypeDescriptor::of::<T>();
    for predicate in tree.criteria() {
        descriptor.resolve(predicate.target())?;
    }
    Ok(tree)
}
