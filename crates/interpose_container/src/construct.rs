//! Constructor resolution.
//!
//! A type's primary constructor is described by [`Injectable`]: the tuple of
//! [`Dependencies`] it needs and how to build itself from them. The
//! [`ConstructorResolver`] produces that tuple by asking the container for
//! each dependency first and constructing it recursively when the container
//! has none.
//!
//! Recursion uses the [`Constructors`] catalog, which `#[derive(Injectable)]`
//! fills at link time. A type already being constructed on the current path
//! is rejected with [`ConstructionError::Cyclic`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use interpose_container::{
//!     Constructors, ConstructorResolver, EmptyResolver, Injectable, TypeKey,
//! };
//!
//! #[derive(Injectable)]
//! struct Clock;
//!
//! #[derive(Injectable)]
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! let constructors = Constructors::linked();
//! let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);
//!
//! // Clock is not in the container, so it is constructed recursively.
//! let arguments = resolver
//!     .resolve_arguments_of(TypeKey::of::<Scheduler>())
//!     .unwrap()
//!     .expect("Scheduler has a registered constructor");
//! assert_eq!(arguments.len(), 1);
//! assert!(arguments[0].is::<Clock>());
//! ```

use core::any::type_name;
use std::sync::Arc;

use hashbrown::HashMap;
use variadics_please::all_tuples;

use crate::container::Resolver;
use crate::error::ConstructionError;
use crate::key::{Instance, TypeKey};

// ─────────────────────────────────────────────────────────────────────────────
// Injectable & Dependency
// ─────────────────────────────────────────────────────────────────────────────

/// A type with a primary constructor the resolver can call.
///
/// Usually derived; see [`Injectable`](macro@crate::Injectable).
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The constructor's parameters, in order.
    type Dependencies: Dependencies;

    /// Builds the value from its resolved parameters.
    fn construct(dependencies: Self::Dependencies) -> Self;
}

/// A single constructor parameter.
pub trait Dependency: Sized + Send + 'static {
    /// The key this parameter is resolved under.
    fn key() -> TypeKey;

    /// Resolves the parameter from the container, or constructs it.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if neither the container nor a known
    /// constructor can supply it.
    fn resolve(resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError>;

    /// Accepts an explicitly supplied argument.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::ArgumentType`] if `instance` has the
    /// wrong type.
    fn from_instance(instance: Instance) -> Result<Self, ConstructionError>;

    /// Erases the parameter.
    fn into_instance(self) -> Instance;
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    fn key() -> TypeKey {
        TypeKey::of::<T>()
    }

    fn resolve(resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError> {
        let instance = resolution.resolve_or_construct(Self::key())?;
        Self::from_instance(instance)
    }

    fn from_instance(instance: Instance) -> Result<Self, ConstructionError> {
        instance
            .downcast::<T>()
            .ok_or(ConstructionError::ArgumentType {
                expected: type_name::<T>(),
                found: instance.key().name(),
            })
    }

    fn into_instance(self) -> Instance {
        Instance::new(self)
    }
}

/// An ordered list of constructor parameters.
///
/// Implemented for `()` and tuples of up to 12 [`Dependency`] values.
pub trait Dependencies: Sized + Send + 'static {
    /// Keys of the parameters, in order.
    fn parameters() -> Vec<TypeKey>;

    /// Resolves every parameter in order.
    ///
    /// # Errors
    ///
    /// Returns the first parameter's [`ConstructionError`].
    fn resolve(resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError>;

    /// Accepts explicitly supplied arguments for the constructor of `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::SignatureMismatch`] on a count mismatch or
    /// [`ConstructionError::ArgumentType`] on a type mismatch.
    fn from_instances(
        type_name: &'static str,
        instances: Vec<Instance>,
    ) -> Result<Self, ConstructionError>;

    /// Erases the parameters, in order.
    fn into_instances(self) -> Vec<Instance>;
}

impl Dependencies for () {
    fn parameters() -> Vec<TypeKey> {
        Vec::new()
    }

    fn resolve(_resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError> {
        Ok(())
    }

    fn from_instances(
        type_name: &'static str,
        instances: Vec<Instance>,
    ) -> Result<Self, ConstructionError> {
        if instances.is_empty() {
            Ok(())
        } else {
            Err(ConstructionError::SignatureMismatch {
                type_name,
                expected: 0,
                found: instances.len(),
            })
        }
    }

    fn into_instances(self) -> Vec<Instance> {
        Vec::new()
    }
}

// Tuple implementations for multiple parameters
macro_rules! impl_dependencies_tuple {
    ($(($param:ident, $value:ident)),*) => {
        impl<$($param: Dependency),*> Dependencies for ($($param,)*) {
            fn parameters() -> Vec<TypeKey> {
                vec![$($param::key()),*]
            }

            fn resolve(resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError> {
                Ok(($($param::resolve(resolution)?,)*))
            }

            fn from_instances(
                type_name: &'static str,
                instances: Vec<Instance>,
            ) -> Result<Self, ConstructionError> {
                let expected = Self::parameters().len();
                let found = instances.len();
                if found != expected {
                    return Err(ConstructionError::SignatureMismatch { type_name, expected, found });
                }

                let mut instances = instances.into_iter();
                $(
                    let $value = instances
                        .next()
                        .ok_or(ConstructionError::SignatureMismatch { type_name, expected, found })
                        .and_then($param::from_instance)?;
                )*
                Ok(($($value,)*))
            }

            fn into_instances(self) -> Vec<Instance> {
                let ($($value,)*) = self;
                vec![$($value.into_instance()),*]
            }
        }
    };
}

// Generate impls for tuples of size 1 to 12
all_tuples!(impl_dependencies_tuple, 1, 12, P, p);

// ─────────────────────────────────────────────────────────────────────────────
// Constructors catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased constructor for one [`Injectable`] type.
#[derive(Clone, Copy)]
pub struct ConstructorEntry {
    key: fn() -> TypeKey,
    parameters: fn() -> Vec<TypeKey>,
    construct: fn(&mut Resolution<'_>) -> Result<Instance, ConstructionError>,
    resolve_arguments: fn(&mut Resolution<'_>) -> Result<Vec<Instance>, ConstructionError>,
    construct_from: fn(Vec<Instance>) -> Result<Instance, ConstructionError>,
}

impl ConstructorEntry {
    /// Describes the constructor of `T`.
    #[must_use]
    pub const fn of<T: Injectable>() -> Self {
        Self {
            key: TypeKey::of::<T>,
            parameters: <T::Dependencies as Dependencies>::parameters,
            construct: construct_erased::<T>,
            resolve_arguments: resolve_arguments_erased::<T>,
            construct_from: construct_from_erased::<T>,
        }
    }

    /// The constructed type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// The constructor's parameter types, in order.
    #[must_use]
    pub fn parameters(&self) -> Vec<TypeKey> {
        (self.parameters)()
    }
}

fn construct_erased<T: Injectable>(
    resolution: &mut Resolution<'_>,
) -> Result<Instance, ConstructionError> {
    let dependencies = T::Dependencies::resolve(resolution)?;
    Ok(Instance::new(Arc::new(T::construct(dependencies))))
}

fn resolve_arguments_erased<T: Injectable>(
    resolution: &mut Resolution<'_>,
) -> Result<Vec<Instance>, ConstructionError> {
    T::Dependencies::resolve(resolution).map(Dependencies::into_instances)
}

fn construct_from_erased<T: Injectable>(
    arguments: Vec<Instance>,
) -> Result<Instance, ConstructionError> {
    let dependencies = T::Dependencies::from_instances(type_name::<T>(), arguments)?;
    Ok(Instance::new(Arc::new(T::construct(dependencies))))
}

/// Constructors contributed at link time by `#[derive(Injectable)]`.
#[linkme::distributed_slice]
pub static CONSTRUCTORS: [ConstructorEntry] = [..];

/// Catalog of known constructors, keyed by the constructed type.
#[derive(Clone, Default)]
pub struct Constructors {
    entries: HashMap<TypeKey, ConstructorEntry>,
}

impl Constructors {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every constructor contributed at link time.
    #[must_use]
    pub fn linked() -> Self {
        let mut constructors = Self::new();
        for entry in CONSTRUCTORS {
            constructors.insert(*entry);
        }
        tracing::debug!(count = constructors.len(), "linked constructors collected");
        constructors
    }

    /// Adds the constructor of `T`.
    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        self.insert(ConstructorEntry::of::<T>());
        self
    }

    /// Adds an erased constructor, replacing any previous one for its type.
    pub fn insert(&mut self, entry: ConstructorEntry) {
        self.entries.insert(entry.key(), entry);
    }

    /// Returns the constructor for `key`, if known.
    #[must_use]
    pub fn get(&self, key: TypeKey) -> Option<ConstructorEntry> {
        self.entries.get(&key).copied()
    }

    /// Returns `true` if a constructor for `key` is known.
    #[must_use]
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of known constructors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no constructors are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// State of one top-level resolution: the argument source, the catalog,
/// and the types currently being constructed.
pub struct Resolution<'a> {
    resolver: &'a dyn Resolver,
    constructors: &'a Constructors,
    in_progress: Vec<TypeKey>,
}

impl<'a> Resolution<'a> {
    /// Starts a resolution against `resolver`.
    #[must_use]
    pub fn new(resolver: &'a dyn Resolver, constructors: &'a Constructors) -> Self {
        Self {
            resolver,
            constructors,
            in_progress: Vec::new(),
        }
    }

    /// The container arguments are resolved from.
    #[must_use]
    pub fn resolver(&self) -> &'a dyn Resolver {
        self.resolver
    }

    /// Resolves `key` from the container, constructing it if absent.
    ///
    /// Constructed instances are not registered back into the container.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if the container fails or no
    /// constructor is known.
    pub fn resolve_or_construct(&mut self, key: TypeKey) -> Result<Instance, ConstructionError> {
        if let Some(instance) = self.resolver.resolve_instance(key)? {
            tracing::trace!(key = %key, "argument resolved from container");
            return Ok(instance);
        }
        self.construct(key)
    }

    /// Constructs `key` with its registered constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::NoConstructor`] if none is known and
    /// [`ConstructionError::Cyclic`] if `key` is already being constructed.
    pub fn construct(&mut self, key: TypeKey) -> Result<Instance, ConstructionError> {
        let entry = self.entry(key)?;
        tracing::trace!(key = %key, depth = self.in_progress.len(), "constructing");
        self.within(key, entry.construct)
    }

    /// Resolves the constructor arguments of `key`, or `None` if no
    /// constructor is known.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if an argument cannot be produced.
    pub fn resolve_arguments(
        &mut self,
        key: TypeKey,
    ) -> Result<Option<Vec<Instance>>, ConstructionError> {
        let Some(entry) = self.constructors.get(key) else {
            return Ok(None);
        };
        self.within(key, entry.resolve_arguments).map(Some)
    }

    fn entry(&self, key: TypeKey) -> Result<ConstructorEntry, ConstructionError> {
        self.constructors
            .get(key)
            .ok_or(ConstructionError::NoConstructor {
                type_name: key.name(),
            })
    }

    /// Runs `step` with `key` marked as in progress.
    fn within<R>(
        &mut self,
        key: TypeKey,
        step: impl FnOnce(&mut Self) -> Result<R, ConstructionError>,
    ) -> Result<R, ConstructionError> {
        if self.in_progress.contains(&key) {
            let mut path = self.in_progress.clone();
            path.push(key);
            return Err(ConstructionError::Cyclic { path });
        }

        self.in_progress.push(key);
        let result = step(self);
        self.in_progress.pop();
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConstructorResolver
// ─────────────────────────────────────────────────────────────────────────────

/// Produces constructor arguments and instances.
///
/// Each parameter is requested from the container first; when the container
/// has none it is constructed with the same algorithm, bottoming out at
/// parameterless types.
#[derive(Clone, Copy)]
pub struct ConstructorResolver<'a> {
    resolver: &'a dyn Resolver,
    constructors: &'a Constructors,
}

impl<'a> ConstructorResolver<'a> {
    /// Creates a resolver over a container and a constructor catalog.
    #[must_use]
    pub fn new(resolver: &'a dyn Resolver, constructors: &'a Constructors) -> Self {
        Self {
            resolver,
            constructors,
        }
    }

    /// Resolves the constructor arguments of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if any argument cannot be produced.
    pub fn resolve_arguments<T: Injectable>(&self) -> Result<T::Dependencies, ConstructionError> {
        self.resolution()
            .within(TypeKey::of::<T>(), |resolution| {
                T::Dependencies::resolve(resolution)
            })
    }

    /// Resolves the constructor arguments of the type behind `key`.
    ///
    /// Returns `Ok(None)` if no constructor is known for the type.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if any argument cannot be produced.
    pub fn resolve_arguments_of(
        &self,
        key: TypeKey,
    ) -> Result<Option<Vec<Instance>>, ConstructionError> {
        self.resolution().resolve_arguments(key)
    }

    /// Constructs `T` from resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if any argument cannot be produced.
    pub fn construct<T: Injectable>(&self) -> Result<T, ConstructionError> {
        let dependencies = self.resolve_arguments::<T>()?;
        tracing::debug!(type_name = type_name::<T>(), "constructed");
        Ok(T::construct(dependencies))
    }

    /// Constructs the type behind `key` from resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::NoConstructor`] if no constructor is
    /// known, or the first argument's error.
    pub fn construct_of(&self, key: TypeKey) -> Result<Instance, ConstructionError> {
        let instance = self.resolution().construct(key)?;
        tracing::debug!(type_name = key.name(), "constructed");
        Ok(instance)
    }

    /// Constructs the type behind `key` from explicitly supplied arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::NoConstructor`] if no constructor is
    /// known, or a signature error if the arguments do not match it.
    pub fn construct_with(
        &self,
        key: TypeKey,
        arguments: Vec<Instance>,
    ) -> Result<Instance, ConstructionError> {
        let entry = self
            .constructors
            .get(key)
            .ok_or(ConstructionError::NoConstructor {
                type_name: key.name(),
            })?;
        (entry.construct_from)(arguments)
    }

    fn resolution(&self) -> Resolution<'a> {
        Resolution::new(self.resolver, self.constructors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::EmptyResolver;

    struct Leaf;

    impl Injectable for Leaf {
        type Dependencies = ();

        fn construct((): ()) -> Self {
            Leaf
        }
    }

    struct Branch {
        leaf: Arc<Leaf>,
    }

    impl Injectable for Branch {
        type Dependencies = (Arc<Leaf>,);

        fn construct((leaf,): (Arc<Leaf>,)) -> Self {
            Self { leaf }
        }
    }

    fn catalog() -> Constructors {
        let mut constructors = Constructors::new();
        constructors.register::<Leaf>().register::<Branch>();
        constructors
    }

    #[test]
    fn parameterless_type_has_no_arguments() {
        let constructors = catalog();
        let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);
        let arguments = resolver
            .resolve_arguments_of(TypeKey::of::<Leaf>())
            .expect("resolution should succeed")
            .expect("Leaf should have a constructor");
        assert!(arguments.is_empty());
    }

    #[test]
    fn unknown_type_is_absent() {
        let constructors = Constructors::new();
        let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);
        let arguments = resolver
            .resolve_arguments_of(TypeKey::of::<Leaf>())
            .expect("resolution should succeed");
        assert!(arguments.is_none());
    }

    #[test]
    fn nested_dependency_is_constructed() {
        let constructors = catalog();
        let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);
        let branch = resolver
            .construct::<Branch>()
            .expect("construction should succeed");
        assert_eq!(Arc::strong_count(&branch.leaf), 1);
    }

    #[test]
    fn explicit_arguments_are_checked() {
        let constructors = catalog();
        let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);

        let err = resolver
            .construct_with(TypeKey::of::<Branch>(), Vec::new())
            .err()
            .expect("missing argument should fail");
        assert!(matches!(
            err,
            ConstructionError::SignatureMismatch {
                expected: 1,
                found: 0,
                ..
            }
        ));

        let wrong = Instance::new(Arc::new(Branch {
            leaf: Arc::new(Leaf),
        }));
        let err = resolver
            .construct_with(TypeKey::of::<Branch>(), vec![wrong])
            .err()
            .expect("wrong argument type should fail");
        assert!(matches!(err, ConstructionError::ArgumentType { .. }));

        let built = resolver
            .construct_with(TypeKey::of::<Branch>(), vec![Instance::new(Arc::new(Leaf))])
            .expect("matching arguments should succeed");
        assert!(built.is::<Branch>());
    }

    #[test]
    fn missing_constructor_is_reported() {
        let constructors = Constructors::new();
        let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);
        let err = resolver
            .construct::<Branch>()
            .err()
            .expect("Leaf has no constructor");
        assert!(matches!(err, ConstructionError::NoConstructor { .. }));
    }
}
