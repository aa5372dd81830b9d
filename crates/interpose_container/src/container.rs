//! The container contract and a reference container.
//!
//! Everything else in Interpose talks to a container through two traits:
//!
//! - [`Resolver`] looks up an instance by [`TypeKey`]
//! - [`FactoryRegistry`] registers a factory under a key with a [`Lifetime`]
//!
//! [`ServiceCollection`], [`Container`] and [`Scope`] implement them with
//! the usual Singleton / Scoped / Transient semantics.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use interpose_container::{Lifetime, ResolverExt, ServiceCollection};
//!
//! struct Config { retries: u32 }
//!
//! let mut services = ServiceCollection::new();
//! services.add::<Config>(Lifetime::Singleton, |_| Ok(Arc::new(Config { retries: 3 })));
//!
//! let container = services.build();
//! let config = container.resolve::<Config>().unwrap().expect("registered");
//! assert_eq!(config.retries, 3);
//! ```

use core::cell::RefCell;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{BoxError, ContainerError};
use crate::key::{Instance, TypeKey};
use crate::lifetime::Lifetime;

/// A factory producing an instance, given the resolver it is invoked from.
pub type Factory = Arc<dyn Fn(&dyn Resolver) -> Result<Instance, BoxError> + Send + Sync>;

/// Wraps a closure as a [`Factory`].
pub fn factory_fn(
    factory: impl Fn(&dyn Resolver) -> Result<Instance, BoxError> + Send + Sync + 'static,
) -> Factory {
    Arc::new(factory)
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Looks up instances by type.
pub trait Resolver: Send + Sync {
    /// Resolves the instance registered under `key`, or `None` if nothing is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if a registered factory fails.
    fn resolve_instance(&self, key: TypeKey) -> Result<Option<Instance>, ContainerError>;
}

/// Typed lookups on any [`Resolver`].
pub trait ResolverExt: Resolver {
    /// Resolves the instance registered under `T` as `Arc<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnexpectedInstance`] if the registration
    /// produced something other than an `Arc<T>`.
    fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ContainerError> {
        let key = TypeKey::of::<T>();
        match self.resolve_instance(key)? {
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .ok_or(ContainerError::UnexpectedInstance {
                    key,
                    found: instance.key(),
                }),
            None => Ok(None),
        }
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Registers factories under a key.
pub trait FactoryRegistry {
    /// Registers `factory` under `key` with the given sharing lifetime.
    fn register_factory(&mut self, key: TypeKey, lifetime: Lifetime, factory: Factory);
}

/// A resolver with no registrations.
///
/// Useful when every constructor argument is supplied explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve_instance(&self, _key: TypeKey) -> Result<Option<Instance>, ContainerError> {
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceCollection
// ─────────────────────────────────────────────────────────────────────────────

/// A registered factory with its sharing lifetime.
#[derive(Clone)]
pub struct Registration {
    key: TypeKey,
    lifetime: Lifetime,
    factory: Factory,
}

impl Registration {
    /// The key the factory is registered under.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The factory's sharing lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Invokes the factory directly, bypassing any caching.
    ///
    /// # Errors
    ///
    /// Returns the factory's error.
    pub fn invoke(&self, resolver: &dyn Resolver) -> Result<Instance, BoxError> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Registrations collected before building a [`Container`].
///
/// Registering a key twice replaces the earlier registration.
#[derive(Default, Clone, Debug)]
pub struct ServiceCollection {
    registrations: IndexMap<TypeKey, Registration>,
}

impl ServiceCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing shared value as a singleton.
    pub fn add_instance<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.register_factory(
            TypeKey::of::<T>(),
            Lifetime::Singleton,
            factory_fn(move |_| Ok(Instance::new(Arc::clone(&value)))),
        );
        self
    }

    /// Registers a typed factory under `T`.
    pub fn add<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        lifetime: Lifetime,
        factory: impl Fn(&dyn Resolver) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_factory(
            TypeKey::of::<T>(),
            lifetime,
            factory_fn(move |resolver| factory(resolver).map(Instance::new)),
        );
        self
    }

    /// Returns the registration for `key`, if any.
    #[must_use]
    pub fn get(&self, key: TypeKey) -> Option<&Registration> {
        self.registrations.get(&key)
    }

    /// Returns `true` if something is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: TypeKey) -> bool {
        self.registrations.contains_key(&key)
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Iterates registrations in first-registered order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.values()
    }

    /// Freezes the registrations into a [`Container`].
    #[must_use]
    pub fn build(self) -> Container {
        Container::new(self)
    }
}

impl FactoryRegistry for ServiceCollection {
    fn register_factory(&mut self, key: TypeKey, lifetime: Lifetime, factory: Factory) {
        let replaced = self
            .registrations
            .insert(
                key,
                Registration {
                    key,
                    lifetime,
                    factory,
                },
            )
            .is_some();
        tracing::debug!(key = %key, lifetime = %lifetime, replaced, "factory registered");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container & Scope
// ─────────────────────────────────────────────────────────────────────────────

/// State shared by a container and all of its scopes.
struct Shared {
    registrations: IndexMap<TypeKey, Registration>,
    singletons: RwLock<HashMap<TypeKey, Instance>>,
}

/// The root container built from a [`ServiceCollection`].
///
/// Resolving directly from the container uses its root scope, so Scoped
/// registrations behave like per-container singletons there.
pub struct Container {
    root: Scope,
}

impl Container {
    fn new(services: ServiceCollection) -> Self {
        let shared = Arc::new(Shared {
            registrations: services.registrations,
            singletons: RwLock::new(HashMap::new()),
        });
        Self {
            root: Scope::new(shared),
        }
    }

    /// Creates a new scope with its own Scoped cache.
    #[must_use]
    pub fn create_scope(&self) -> Scope {
        Scope::new(Arc::clone(&self.root.shared))
    }

    /// Returns the root scope.
    #[must_use]
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Returns the registration for `key`, if any.
    #[must_use]
    pub fn registration(&self, key: TypeKey) -> Option<&Registration> {
        self.root.shared.registrations.get(&key)
    }
}

impl Resolver for Container {
    fn resolve_instance(&self, key: TypeKey) -> Result<Option<Instance>, ContainerError> {
        self.root.resolve_instance(key)
    }
}

/// A resolution scope.
///
/// Scoped registrations are created once per scope. Factories invoked from a
/// scope resolve their own dependencies from that same scope.
pub struct Scope {
    id: String,
    shared: Arc<Shared>,
    scoped: RwLock<HashMap<TypeKey, Instance>>,
}

impl Scope {
    fn new(shared: Arc<Shared>) -> Self {
        let id = nanoid::nanoid!();
        tracing::trace!(scope = %id, "scope created");
        Self {
            id,
            shared,
            scoped: RwLock::new(HashMap::new()),
        }
    }

    /// Returns this scope's unique id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn cached(
        &self,
        cache: &RwLock<HashMap<TypeKey, Instance>>,
        registration: &Registration,
    ) -> Result<Instance, ContainerError> {
        if let Some(instance) = cache.read().get(&registration.key) {
            return Ok(instance.clone());
        }

        // No lock is held while the factory runs; the first stored instance wins.
        let created = self.create(registration)?;
        let mut cache = cache.write();
        Ok(cache.entry(registration.key).or_insert(created).clone())
    }

    fn create(&self, registration: &Registration) -> Result<Instance, ContainerError> {
        let _guard = ResolutionGuard::enter(registration.key)?;
        tracing::trace!(
            scope = %self.id,
            key = %registration.key,
            lifetime = %registration.lifetime,
            "invoking factory"
        );
        (registration.factory)(self).map_err(|source| ContainerError::Factory {
            key: registration.key,
            source,
        })
    }
}

impl Resolver for Scope {
    fn resolve_instance(&self, key: TypeKey) -> Result<Option<Instance>, ContainerError> {
        let Some(registration) = self.shared.registrations.get(&key) else {
            return Ok(None);
        };

        let instance = match registration.lifetime {
            Lifetime::Singleton => self.cached(&self.shared.singletons, registration)?,
            Lifetime::Scoped => self.cached(&self.scoped, registration)?,
            Lifetime::Transient => self.create(registration)?,
        };
        Ok(Some(instance))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("scoped", &self.scoped.read().len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Re-entrancy guard
// ─────────────────────────────────────────────────────────────────────────────

thread_local! {
    static RESOLVING: RefCell<Vec<TypeKey>> = const { RefCell::new(Vec::new()) };
}

/// Tracks keys whose factories are running on the current thread.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(key: TypeKey) -> Result<Self, ContainerError> {
        RESOLVING.with_borrow_mut(|stack| {
            if stack.contains(&key) {
                let mut path = stack.clone();
                path.push(key);
                return Err(ContainerError::Cyclic { path });
            }
            stack.push(key);
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}
