//! Fabrica RQL – filtering typed collections with Resource Query Language.
//!
//! RQL is the compact, URL-friendly filter syntax used by Fabrica endpoints,
//! e.g. `?rql=name=eq=bob;age=ge=21`. A query string is a list of clauses
//! separated by `;` or `&`, all of which must hold:
//! * A predicate `field=op=value[,value...]`, where `field` is a property path
//!   (`address.city`) and `op` one of the mnemonics `eq`, `ne`, `gt`, `ge`,
//!   `lt`, `le`, `like`, `in`, `out`, `bt`, `null` and `notnull`.
//! * A directive: `select(a,b)` for projection, `sort(+a,-b)` for ordering
//!   and `limit(count[,offset])` for paging.
//!
//! Literals are quoted (`"..."` or `'...'`) or bare. Bare literals are typed by
//! inference (boolean, integer, decimal, date, date-time, otherwise string)
//! and converted to the type of the property they are compared with when the
//! filter is built.
//!
//! ## Modules
//! * [`lexer`] – The pest based tokenizer (grammar in `rql.pest`).
//! * [`parser`] – Clauses to a [`predicate::CriteriaTree`].
//! * [`predicate`], [`operator`], [`datatype`] – The predicate model.
//! * [`descriptor`] – The [`descriptor::Entity`] trait through which a type
//!   exposes its filterable properties.
//! * [`filter`] – Compiles a tree into a [`filter::Filter`] for a type.
//! * [`query`] – Applies filter, sort, paging and projection to a collection.
//! * [`introspect`] – Builds trees from typed criteria objects.
//! * [`serialize`] – Renders trees back into canonical RQL text.
//! * [`settings`] – Limits, loaded with the `config` crate.
//!
//! Only conjunction exists within one query string. Callers that need OR
//! parse several strings and combine the filters with a
//! [`filter::FilterUnion`].
//!
//! ## Quick Start
//! ```
//! use fabrica_rql::descriptor::{Descriptor, Entity};
//! use fabrica_rql::{build_filter, parse_criteria, serialize};
//!
//! struct Person { name: String, age: i32 }
//!
//! impl Entity for Person {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.field("name", |p: &Person| p.name.clone())
//!             .field("age", |p: &Person| p.age);
//!     }
//! }
//!
//! let tree = parse_criteria("name=eq=bob;age=ge=21").unwrap();
//! let filter = build_filter::<Person>(&tree).unwrap();
//! assert!(filter.matches(&Person { name: "bob".into(), age: 25 }));
//! assert!(!filter.matches(&Person { name: "bob".into(), age: 19 }));
//! assert_eq!(serialize(&tree), "name=eq=bob;age=ge=21");
//! ```

pub mod datatype;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod introspect;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod predicate;
pub mod query;
pub mod serialize;
pub mod settings;

pub use datatype::{DataType, Value};
pub use error::{Result, RqlError};
pub use filter::{Filter, FilterBuilder, FilterUnion, build_filter};
pub use introspect::{CriteriaObject, introspect};
pub use operator::Operator;
pub use parser::parse_criteria;
pub use predicate::{CriteriaTree, Predicate, Target};
pub use query::QueryPlan;
pub use serialize::serialize;
pub use settings::RqlSettings;
