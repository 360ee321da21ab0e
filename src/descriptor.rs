//! Property descriptors: the filterable shape of a target type.
//!
//! A type opts in by implementing [`Entity`], registering its scalar fields
//! and its navigations to other entities. Descriptors are built once per type
//! and kept in a process-wide registry, so resolving a path never repeats the
//! registration work.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
// we will use a fast hashing algo for hashmaps keyed by names and type ids
use seahash::SeaHasher;
use tracing::debug;

use crate::datatype::{DataType, FieldType, Value};
use crate::error::{Result, RqlError};
use crate::predicate::Target;

pub type NameHasher = BuildHasherDefault<SeaHasher>;

type Getter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Navigator = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

fn navigator<F>(navigate: F) -> Navigator
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(navigate)
}

/// A type whose instances can be filtered.
///
/// ```
/// use fabrica_rql::descriptor::{Descriptor, Entity};
///
/// struct Address { city: String }
/// struct Person { name: String, age: u32, address: Option<Address> }
///
/// impl Entity for Address {
///     fn describe(d: &mut Descriptor<Self>) {
///         d.field("city", |a: &Address| a.city.clone());
///     }
/// }
/// impl Entity for Person {
///     fn describe(d: &mut Descriptor<Self>) {
///         d.field("name", |p: &Person| p.name.clone())
///             .field("age", |p: &Person| p.age)
///             .reference("address", |p: &Person| p.address.as_ref());
///     }
/// }
/// ```
pub trait Entity: Any + Sized {
    fn describe(descriptor: &mut Descriptor<Self>);
}

pub enum PropertyKind {
    Field {
        data_type: DataType,
        nullable: bool,
        get: Getter,
    },
    Reference {
        navigate: Navigator,
        // resolved lazily so that types may refer to themselves
        target: fn() -> Arc<TypeDescriptor>,
    },
}

pub struct Property {
    name: String,
    kind: PropertyKind,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }
    pub fn data_type(&self) -> Option<DataType> {
        match &self.kind {
            PropertyKind::Field { data_type, .. } => Some(*data_type),
            PropertyKind::Reference { .. } => None,
        }
    }
}

/// Collects the properties of `T` during [`Entity::describe`].
pub struct Descriptor<T> {
    properties: Vec<Property>,
    _entity: PhantomData<fn(&T)>,
}

impl<T: Entity> Descriptor<T> {
    fn new() -> Self {
        Self {
            properties: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Registers a scalar property. The getter's return type decides the
    /// property's data type and whether it is nullable (`Option<_>`).
    pub fn field<V, F>(&mut self, name: &str, get: F) -> &mut Self
    where
        V: FieldType,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let get: Getter = Arc::new(move |owner: &dyn Any| {
            owner.downcast_ref::<T>().and_then(|t| get(t).into_value())
        });
        self.properties.push(Property {
            name: name.to_ascii_lowercase(),
            kind: PropertyKind::Field {
                data_type: V::DATA_TYPE,
                nullable: V::NULLABLE,
                get,
            },
        });
        self
    }

    /// Registers a navigation to another entity, `None` when absent.
    pub fn reference<U, F>(&mut self, name: &str, get: F) -> &mut Self
    where
        U: Entity,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        let navigate = navigator(move |owner| {
            owner
                .downcast_ref::<T>()
                .and_then(|t| get(t))
                .map(|u| u as &dyn Any)
        });
        self.properties.push(Property {
            name: name.to_ascii_lowercase(),
            kind: PropertyKind::Reference {
                navigate,
                target: TypeDescriptor::of::<U>,
            },
        });
        self
    }
}

// ------------- Type Descriptor -------------

pub struct TypeDescriptor {
    type_name: &'static str,
    properties: HashMap<String, Property, NameHasher>,
    // registration order, used when projecting all fields
    order: Vec<String>,
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<TypeId, Arc<TypeDescriptor>, NameHasher>> =
        RwLock::new(HashMap::default());
}

impl TypeDescriptor {
    /// The descriptor of `T`, built on first use.
    pub fn of<T: Entity>() -> Arc<TypeDescriptor> {
        let key = TypeId::of::<T>();
        if let Ok(registry) = REGISTRY.read() {
            if let Some(descriptor) = registry.get(&key) {
                return Arc::clone(descriptor);
            }
        }
        // built outside the lock, describing may touch other types
        let mut collected = Descriptor::<T>::new();
        T::describe(&mut collected);
        let built = Arc::new(TypeDescriptor::from_properties(
            std::any::type_name::<T>(),
            collected.properties,
        ));
        debug!(type_name = built.type_name, properties = built.order.len(), "described type");
        match REGISTRY.write() {
            Ok(mut registry) => Arc::clone(registry.entry(key).or_insert(built)),
            // a poisoned registry only costs us the cache
            Err(_) => built,
        }
    }

    fn from_properties(type_name: &'static str, properties: Vec<Property>) -> Self {
        let order = properties.iter().map(|p| p.name.clone()).collect();
        let properties = properties.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self {
            type_name,
            properties,
            order,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(&name.to_ascii_lowercase())
    }

    /// Scalar fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &Property> {
        self.order
            .iter()
            .filter_map(|name| self.properties.get(name))
            .filter(|p| matches!(p.kind, PropertyKind::Field { .. }))
    }

    /// Resolves a dotted path into an accessor chain.
    pub fn resolve(&self, target: &Target) -> Result<ResolvedPath> {
        let unknown = || RqlError::UnknownProperty {
            path: target.to_string(),
        };
        let segments: Vec<&str> = target.segments().collect();
        let Some((last, hops)) = segments.split_last() else {
            return Err(unknown());
        };
        let mut navigators = Vec::with_capacity(hops.len());
        // keeps the descriptor of the current hop alive
        let mut current: Option<Arc<TypeDescriptor>> = None;
        for segment in hops {
            let owner = current.as_deref().unwrap_or(self);
            match owner.property(segment).map(|p| &p.kind) {
                Some(PropertyKind::Reference { navigate, target }) => {
                    navigators.push(Arc::clone(navigate));
                    let next = target();
                    current = Some(next);
                }
                _ => return Err(unknown()),
            }
        }
        let owner = current.as_deref().unwrap_or(self);
        let leaf = match owner.property(last).map(|p| &p.kind) {
            Some(PropertyKind::Field { data_type, nullable, get }) => Leaf::Field {
                data_type: *data_type,
                nullable: *nullable,
                get: Arc::clone(get),
            },
            Some(PropertyKind::Reference { navigate, .. }) => Leaf::Reference(Arc::clone(navigate)),
            None => return Err(unknown()),
        };
        Ok(ResolvedPath {
            path: target.to_string(),
            hops: navigators,
            leaf,
        })
    }
}

// ------------- Resolved Path -------------

#[derive(Clone)]
pub enum Leaf {
    Field {
        data_type: DataType,
        nullable: bool,
        get: Getter,
    },
    Reference(Navigator),
}

/// An accessor chain from a root instance to a property.
#[derive(Clone)]
pub struct ResolvedPath {
    path: String,
    hops: Vec<Navigator>,
    leaf: Leaf,
}

impl ResolvedPath {
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }
    /// Data type of the property, `None` for a navigation.
    pub fn data_type(&self) -> Option<DataType> {
        match &self.leaf {
            Leaf::Field { data_type, .. } => Some(*data_type),
            Leaf::Reference(_) => None,
        }
    }
    pub fn nullable(&self) -> bool {
        match &self.leaf {
            Leaf::Field { nullable, .. } => *nullable,
            Leaf::Reference(_) => true,
        }
    }

    // the instance owning the leaf, None when a navigation on the way is null
    fn owner<'a>(&self, root: &'a dyn Any) -> Option<&'a dyn Any> {
        let mut current = root;
        for hop in &self.hops {
            current = hop(current)?;
        }
        Some(current)
    }

    /// Reads the property value; `None` when it, or anything on the way, is null.
    pub fn read(&self, root: &dyn Any) -> Option<Value> {
        let owner = self.owner(root)?;
        match &self.leaf {
            Leaf::Field { get, .. } => get(owner),
            Leaf::Reference(_) => None,
        }
    }

    pub fn is_null(&self, root: &dyn Any) -> bool {
        match self.owner(root) {
            None => true,
            Some(owner) => match &self.leaf {
                Leaf::Field { get, .. } => get(owner).is_none(),
                Leaf::Reference(navigate) => navigate(owner).is_none(),
            },
        }
    }
}
