//! Proxy creation.
//!
//! Every entry point performs the same four steps: check the contract can be
//! synthesized, construct the interceptor, construct the target, and bind
//! both into the dispatcher owned by the new proxy.

use core::fmt;
use std::sync::Arc;

use interpose_container::{
    ConstructorResolver, Dependencies, Injectable, Instance, Resolver, TypeKey,
};

use crate::contract::{Contract, Implements};
use crate::dispatch::Dispatcher;
use crate::error::{InvalidContractError, ProxyError};
use crate::interceptor::Interceptor;
use crate::registry::{DispatchTarget, ProxyBackend, TypeRegistry};
use crate::spawn::{Spawner, TokioSpawner};

/// A by-type proxy request.
///
/// Explicit argument lists bypass constructor resolution for that part.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    contract: TypeKey,
    implementation: TypeKey,
    interceptor: TypeKey,
    target_arguments: Option<Vec<Instance>>,
    interceptor_arguments: Option<Vec<Instance>>,
}

impl ProxyRequest {
    /// Requests a proxy for `contract`, implemented by `implementation` and
    /// intercepted by `interceptor`.
    #[must_use]
    pub fn new(contract: TypeKey, implementation: TypeKey, interceptor: TypeKey) -> Self {
        Self {
            contract,
            implementation,
            interceptor,
            target_arguments: None,
            interceptor_arguments: None,
        }
    }

    /// Requests a proxy whose contract is the implementation itself.
    #[must_use]
    pub fn for_implementation(implementation: TypeKey, interceptor: TypeKey) -> Self {
        Self::new(implementation, implementation, interceptor)
    }

    /// Constructs the target from these arguments.
    #[must_use]
    pub fn with_target_arguments(mut self, arguments: Vec<Instance>) -> Self {
        self.target_arguments = Some(arguments);
        self
    }

    /// Constructs the interceptor from these arguments.
    #[must_use]
    pub fn with_interceptor_arguments(mut self, arguments: Vec<Instance>) -> Self {
        self.interceptor_arguments = Some(arguments);
        self
    }

    /// The requested contract.
    #[must_use]
    pub fn contract(&self) -> TypeKey {
        self.contract
    }

    /// The requested implementation.
    #[must_use]
    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    /// The requested interceptor.
    #[must_use]
    pub fn interceptor(&self) -> TypeKey {
        self.interceptor
    }
}

/// Creates proxies.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use interpose_container::EmptyResolver;
/// use interpose_proxy::{
///     Failure, Injectable, Interceptor, MethodDescriptor, ProxyFactory, Value, contract,
///     interceptor,
/// };
///
/// #[derive(Injectable)]
/// struct Greeter;
///
/// #[contract]
/// impl Greeter {
///     pub fn greet(&self, name: String) -> String {
///         format!("hello {name}")
///     }
/// }
///
/// #[derive(Injectable)]
/// struct Quiet;
///
/// #[interceptor]
/// impl Interceptor for Quiet {
///     fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
///         None
///     }
/// }
///
/// let factory = ProxyFactory::linked();
/// let proxy = factory.create_for::<Greeter, Quiet>(&EmptyResolver).unwrap();
/// assert!(proxy.greet("ada".to_string()).is_none());
/// ```
pub struct ProxyFactory {
    registry: Arc<TypeRegistry>,
    backend: Arc<dyn ProxyBackend>,
    spawner: Arc<dyn Spawner>,
}

impl ProxyFactory {
    /// Creates a factory over `registry`, which is also the proxy backend.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            backend: Arc::clone(&registry) as Arc<dyn ProxyBackend>,
            registry,
            spawner: Arc::new(TokioSpawner::current()),
        }
    }

    /// Creates a factory over every entry contributed at link time.
    #[must_use]
    pub fn linked() -> Self {
        Self::new(TypeRegistry::linked())
    }

    /// Replaces the backend used by [`create_by_key`](Self::create_by_key).
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn ProxyBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replaces the spawner handed to every new proxy.
    #[must_use]
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// The registry used for by-type lookups and construction.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────
    // Typed entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Creates a proxy for contract `C` around a new `T`, intercepted by a
    /// new `I`. Both are constructed from `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Construction`] if either construction fails.
    pub fn create<C, T, I>(&self, resolver: &dyn Resolver) -> Result<C::Proxy, ProxyError>
    where
        C: ?Sized + Contract,
        T: Injectable + Implements<C>,
        I: Injectable + Interceptor,
    {
        let constructor = self.constructor(resolver);
        let interceptor: Arc<dyn Interceptor> = Arc::new(constructor.construct::<I>()?);
        let target = Arc::new(constructor.construct::<T>()?);
        Ok(self.bind::<C>(
            <T as Implements<C>>::upcast(target),
            Some(interceptor),
        ))
    }

    /// Creates a proxy whose contract is `T` itself.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Construction`] if either construction fails.
    pub fn create_for<T, I>(&self, resolver: &dyn Resolver) -> Result<T::Proxy, ProxyError>
    where
        T: Contract + Injectable,
        I: Injectable + Interceptor,
    {
        self.create::<T, T, I>(resolver)
    }

    /// Creates a proxy from explicit constructor arguments.
    #[must_use]
    pub fn create_with_arguments<C, T, I>(
        &self,
        target_arguments: T::Dependencies,
        interceptor_arguments: I::Dependencies,
    ) -> C::Proxy
    where
        C: ?Sized + Contract,
        T: Injectable + Implements<C>,
        I: Injectable + Interceptor,
    {
        let interceptor: Arc<dyn Interceptor> = Arc::new(I::construct(interceptor_arguments));
        let target = Arc::new(T::construct(target_arguments));
        self.bind::<C>(<T as Implements<C>>::upcast(target), Some(interceptor))
    }

    /// Creates a proxy around a new `T` with a caller-supplied interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Construction`] if constructing `T` fails.
    pub fn create_with_interceptor<C, T>(
        &self,
        interceptor: Option<Arc<dyn Interceptor>>,
        resolver: &dyn Resolver,
    ) -> Result<C::Proxy, ProxyError>
    where
        C: ?Sized + Contract,
        T: Injectable + Implements<C>,
    {
        let target = Arc::new(self.constructor(resolver).construct::<T>()?);
        Ok(self.bind::<C>(<T as Implements<C>>::upcast(target), interceptor))
    }

    /// Wraps an existing target.
    #[must_use]
    pub fn wrap<C>(&self, target: Arc<C>, interceptor: Option<Arc<dyn Interceptor>>) -> C::Proxy
    where
        C: ?Sized + Contract,
    {
        self.bind::<C>(target, interceptor)
    }

    fn bind<C: ?Sized + Contract>(
        &self,
        target: Arc<C>,
        interceptor: Option<Arc<dyn Interceptor>>,
    ) -> C::Proxy {
        tracing::debug!(
            contract = C::descriptor().name(),
            intercepted = interceptor.is_some(),
            "proxy created"
        );
        C::synthesize(Dispatcher::from_parts(
            target,
            interceptor,
            Arc::clone(&self.spawner),
        ))
    }

    fn constructor<'a>(&'a self, resolver: &'a dyn Resolver) -> ConstructorResolver<'a> {
        ConstructorResolver::new(resolver, self.registry.constructors())
    }

    // ─────────────────────────────────────────────────────────────────────
    // By-type entry point
    // ─────────────────────────────────────────────────────────────────────

    /// Creates a proxy from type keys.
    ///
    /// The returned instance holds an `Arc<C::Proxy>` for the requested
    /// contract `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidContract`] if the contract has no backend,
    /// the implementation does not implement it, or the interceptor type is
    /// not an interceptor. Returns [`ProxyError::Construction`] if either
    /// construction fails.
    pub fn create_by_key(
        &self,
        request: &ProxyRequest,
        resolver: &dyn Resolver,
    ) -> Result<Instance, ProxyError> {
        let ProxyRequest {
            contract,
            implementation,
            interceptor,
            ..
        } = *request;

        if !self.backend.supports(contract) {
            return Err(InvalidContractError::NoBackend { contract }.into());
        }
        if !self.registry.implements(implementation, contract) {
            return Err(InvalidContractError::NotImplemented {
                implementation,
                contract,
            }
            .into());
        }
        if !self.registry.is_interceptor(interceptor) {
            return Err(InvalidContractError::NotAnInterceptor { interceptor }.into());
        }

        let constructor = self.constructor(resolver);
        let interceptor = match &request.interceptor_arguments {
            Some(arguments) => constructor.construct_with(interceptor, arguments.clone())?,
            None => constructor.construct_of(interceptor)?,
        };
        let interceptor = self.registry.as_interceptor(&interceptor)?;

        let target = match &request.target_arguments {
            Some(arguments) => constructor.construct_with(implementation, arguments.clone())?,
            None => constructor.construct_of(implementation)?,
        };
        let target = self.registry.upcast_instance(&target, contract)?;

        let proxy = self.backend.synthesize(
            contract,
            DispatchTarget {
                target,
                interceptor: Some(interceptor),
                spawner: Arc::clone(&self.spawner),
            },
        )?;
        tracing::debug!(
            contract = %contract,
            implementation = %implementation,
            "proxy created"
        );
        Ok(proxy)
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::linked()
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Erases explicit constructor arguments for [`ProxyRequest`].
///
/// ```
/// use std::sync::Arc;
/// use interpose_proxy::erase_arguments;
///
/// let arguments = erase_arguments((Arc::new(5_u32), Arc::new("label")));
/// assert_eq!(arguments.len(), 2);
/// assert!(arguments[0].is::<u32>());
/// ```
#[must_use]
pub fn erase_arguments<D: Dependencies>(dependencies: D) -> Vec<Instance> {
    dependencies.into_instances()
}
