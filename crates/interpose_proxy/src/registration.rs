//! Registering proxies with a container and resolving them back.
//!
//! Proxies are registered under the key of their own type, `C::Proxy`, so
//! the contract's key stays free for plain registrations of `Arc<C>`. Use
//! [`ResolveProxy::resolve_proxy`] or the [`Intercepted`] dependency to get
//! them out again.

use core::fmt;
use core::ops::Deref;
use std::sync::Arc;

use interpose_container::{
    ConstructionError, ContainerError, Dependency, FactoryRegistry, Injectable, Instance, Lifetime,
    Resolution, Resolver, ResolverExt, TypeKey, factory_fn,
};

use crate::contract::{Contract, Implements};
use crate::factory::ProxyFactory;
use crate::interceptor::Interceptor;

/// Registers factories that create intercepted proxies.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use interpose_container::{Lifetime, ServiceCollection};
/// use interpose_proxy::{
///     Failure, Injectable, InterceptedRegistry, Interceptor, MethodDescriptor, ProxyFactory,
///     ResolveProxy, Value, contract, interceptor,
/// };
///
/// #[derive(Injectable)]
/// struct Counter;
///
/// #[contract]
/// impl Counter {
///     pub fn next(&self) -> u32 {
///         1
///     }
/// }
///
/// #[derive(Injectable)]
/// struct Silent;
///
/// #[interceptor]
/// impl Interceptor for Silent {
///     fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
///         None
///     }
/// }
///
/// let factory = Arc::new(ProxyFactory::linked());
/// let mut services = ServiceCollection::new();
/// services.add_intercepted_for::<Counter, Silent>(Lifetime::Scoped, &factory);
///
/// let container = services.build();
/// let scope = container.create_scope();
/// let first = scope.resolve_proxy::<Counter>().unwrap().unwrap();
/// let second = scope.resolve_proxy::<Counter>().unwrap().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub trait InterceptedRegistry: FactoryRegistry {
    /// Registers contract `C`, implemented by `T` and intercepted by `I`.
    fn add_intercepted<C, T, I>(&mut self, lifetime: Lifetime, factory: &Arc<ProxyFactory>) -> &mut Self
    where
        C: ?Sized + Contract,
        T: Injectable + Implements<C>,
        I: Injectable + Interceptor,
    {
        let factory = Arc::clone(factory);
        self.register_factory(
            TypeKey::of::<C::Proxy>(),
            lifetime,
            factory_fn(move |resolver| {
                let proxy = factory.create::<C, T, I>(resolver)?;
                Ok(Instance::new(Arc::new(proxy)))
            }),
        );
        self
    }

    /// Registers `T` as its own contract, intercepted by `I`.
    fn add_intercepted_for<T, I>(&mut self, lifetime: Lifetime, factory: &Arc<ProxyFactory>) -> &mut Self
    where
        T: Contract + Injectable,
        I: Injectable + Interceptor,
    {
        self.add_intercepted::<T, T, I>(lifetime, factory)
    }
}

impl<R: FactoryRegistry + ?Sized> InterceptedRegistry for R {}

/// Typed lookup of registered proxies.
pub trait ResolveProxy: ResolverExt {
    /// Resolves the proxy registered for contract `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnexpectedInstance`] if the factory under
    /// `C::Proxy` produced something else.
    fn resolve_proxy<C: ?Sized + Contract>(&self) -> Result<Option<Arc<C::Proxy>>, ContainerError> {
        self.resolve::<C::Proxy>()
    }
}

impl<R: Resolver + ?Sized> ResolveProxy for R {}

/// A constructor parameter receiving the registered proxy for contract `C`.
///
/// ```ignore
/// #[derive(Injectable)]
/// struct Checkout {
///     payments: Intercepted<dyn Payments>,
/// }
/// ```
pub struct Intercepted<C: ?Sized + Contract>(Arc<C::Proxy>);

impl<C: ?Sized + Contract> Intercepted<C> {
    /// Returns the shared proxy.
    #[must_use]
    pub fn into_inner(self) -> Arc<C::Proxy> {
        self.0
    }
}

impl<C: ?Sized + Contract> Clone for Intercepted<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C: ?Sized + Contract> Deref for Intercepted<C> {
    type Target = C::Proxy;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<C: ?Sized + Contract> fmt::Debug for Intercepted<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Intercepted")
            .field(&C::descriptor().name())
            .finish()
    }
}

impl<C: ?Sized + Contract> Dependency for Intercepted<C> {
    fn key() -> TypeKey {
        TypeKey::of::<C::Proxy>()
    }

    fn resolve(resolution: &mut Resolution<'_>) -> Result<Self, ConstructionError> {
        let key = Self::key();
        // Proxies are never constructed on demand.
        let instance = resolution
            .resolver()
            .resolve_instance(key)?
            .ok_or(ConstructionError::NoConstructor {
                type_name: key.name(),
            })?;
        Self::from_instance(instance)
    }

    fn from_instance(instance: Instance) -> Result<Self, ConstructionError> {
        instance
            .downcast::<C::Proxy>()
            .map(Self)
            .ok_or(ConstructionError::ArgumentType {
                expected: core::any::type_name::<C::Proxy>(),
                found: instance.key().name(),
            })
    }

    fn into_instance(self) -> Instance {
        Instance::new(self.0)
    }
}
