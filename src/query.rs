//! A whole criteria tree applied to an in-memory collection: filter, sort,
//! page and project.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::descriptor::{Entity, ResolvedPath, TypeDescriptor};
use crate::error::{Result, RqlError};
use crate::filter::{Filter, FilterBuilder};
use crate::predicate::{CriteriaTree, Direction, Page, Target};
use crate::settings::RqlSettings;

pub struct QueryPlan<T> {
    filter: Filter<T>,
    sort: Vec<(ResolvedPath, Direction)>,
    projection: Vec<ResolvedPath>,
    page: Option<Page>,
}

impl<T> fmt::Debug for QueryPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("QueryPlan")
            .field("filter", &self.filter)
            .field(
                "sort",
                &self.sort.iter().map(|(p, d)| (p.path(), *d)).collect::<Vec<_>>(),
            )
            .field(
                "projection",
                &self.projection.iter().map(ResolvedPath::path).collect::<Vec<_>>(),
            )
            .field("page", &self.page)
            .finish()
    }
}

// sort keys and projected columns must end at a scalar field
fn scalar(descriptor: &TypeDescriptor, target: &Target, usage: &str) -> Result<ResolvedPath> {
    let path = descriptor.resolve(target)?;
    if path.data_type().is_none() {
        return Err(RqlError::UnsupportedOperator {
            field: path.path().to_owned(),
            operator: usage.to_owned(),
            data_type: "reference".to_owned(),
        });
    }
    Ok(path)
}

impl<T: Entity> QueryPlan<T> {
    pub fn build(tree: &CriteriaTree) -> Result<Self> {
        Self::build_with(tree, &RqlSettings::default())
    }

    pub fn build_with(tree: &CriteriaTree, settings: &RqlSettings) -> Result<Self> {
        let descriptor = TypeDescriptor::of::<T>();
        let filter = FilterBuilder::from_settings(settings).build::<T>(tree)?;
        let sort = tree
            .sort()
            .iter()
            .map(|key| Ok((scalar(&descriptor, &key.target, "sort")?, key.direction)))
            .collect::<Result<Vec<_>>>()?;
        let projection = if tree.has_projection() {
            tree.projection()
                .iter()
                .map(|target| scalar(&descriptor, target, "select"))
                .collect::<Result<Vec<_>>>()?
        } else {
            descriptor
                .fields()
                .map(|field| descriptor.resolve(&Target::parse(field.name())?))
                .collect::<Result<Vec<_>>>()?
        };
        let page = tree.page().or_else(|| {
            settings
                .default_limit
                .map(|limit| Page { limit, offset: 0 })
        });
        debug!(
            type_name = descriptor.type_name(),
            sort_keys = sort.len(),
            columns = projection.len(),
            ?page,
            "built query plan"
        );
        Ok(Self {
            filter,
            sort,
            projection,
            page,
        })
    }

    pub fn filter(&self) -> &Filter<T> {
        &self.filter
    }
    pub fn page(&self) -> Option<Page> {
        self.page
    }
    /// Paths of the projected columns, in output order.
    pub fn columns(&self) -> Vec<&str> {
        self.projection.iter().map(ResolvedPath::path).collect()
    }

    /// Filters, sorts and pages `items`. Sorting is stable and places
    /// null values first when ascending.
    pub fn execute<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut selected: Vec<&T> = items.iter().filter(|item| self.filter.matches(item)).collect();
        if !self.sort.is_empty() {
            selected.sort_by(|a, b| self.compare(a, b));
        }
        match self.page {
            Some(Page { limit, offset }) => selected.into_iter().skip(offset).take(limit).collect(),
            None => selected,
        }
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        for (path, direction) in &self.sort {
            let ordering = match (path.read(a), path.read(b)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// The projected columns of one item as a JSON object.
    pub fn project(&self, item: &T) -> Map<String, Json> {
        self.projection
            .iter()
            .map(|path| {
                let value = path.read(item).map(|v| v.to_json()).unwrap_or(Json::Null);
                (path.path().to_owned(), value)
            })
            .collect()
    }

    /// Executes the plan and projects every resulting item.
    pub fn rows(&self, items: &[T]) -> Vec<Map<String, Json>> {
        self.execute(items)
            .into_iter()
            .map(|item| self.project(item))
            .collect()
    }
}
