//! Type-erased registry of contracts, implementations and interceptors.
//!
//! The macros contribute entries at link time; [`TypeRegistry::linked`]
//! collects them. Lookups are by [`TypeKey`], which lets discovery and
//! [`ProxyFactory::create_by_key`](crate::ProxyFactory::create_by_key) work
//! without static types.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use interpose_container::{Constructors, Injectable, Instance, TypeKey};

use crate::contract::{Contract, Implements};
use crate::dispatch::Dispatcher;
use crate::error::InvalidContractError;
use crate::interceptor::Interceptor;
use crate::spawn::Spawner;

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a proxy needs bound before its first call.
pub struct DispatchTarget {
    /// The target, already upcast to the contract.
    pub target: Instance,
    /// The interceptor, if any.
    pub interceptor: Option<Arc<dyn Interceptor>>,
    /// Where async continuations run.
    pub spawner: Arc<dyn Spawner>,
}

/// Synthesizes forwarding objects for contracts.
pub trait ProxyBackend: Send + Sync {
    /// Returns `true` if this backend can synthesize `contract`.
    fn supports(&self, contract: TypeKey) -> bool;

    /// Builds the proxy for `contract` around a bound dispatch target.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidContractError::NoBackend`] for unknown contracts and
    /// [`InvalidContractError::TargetMismatch`] if the target does not have
    /// the contract's type.
    fn synthesize(
        &self,
        contract: TypeKey,
        target: DispatchTarget,
    ) -> Result<Instance, InvalidContractError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// A contract's erased synthesis function.
#[derive(Clone, Copy)]
pub struct ContractEntry {
    key: fn() -> TypeKey,
    proxy: fn() -> TypeKey,
    synthesize: fn(DispatchTarget) -> Result<Instance, InvalidContractError>,
}

impl ContractEntry {
    /// Describes contract `C`.
    #[must_use]
    pub const fn of<C: ?Sized + Contract>() -> Self {
        Self {
            key: TypeKey::of::<C>,
            proxy: TypeKey::of::<C::Proxy>,
            synthesize: synthesize_erased::<C>,
        }
    }

    /// The contract's key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// The key of the generated proxy type, under which containers hold it.
    #[must_use]
    pub fn proxy(&self) -> TypeKey {
        (self.proxy)()
    }
}

fn synthesize_erased<C: ?Sized + Contract>(
    dispatch: DispatchTarget,
) -> Result<Instance, InvalidContractError> {
    let target = dispatch
        .target
        .downcast::<C>()
        .ok_or(InvalidContractError::TargetMismatch {
            contract: TypeKey::of::<C>(),
            found: dispatch.target.key(),
        })?;
    let dispatcher = Dispatcher::from_parts(target, dispatch.interceptor, dispatch.spawner);
    Ok(Instance::new(Arc::new(C::synthesize(dispatcher))))
}

/// An implementation-to-contract upcast.
#[derive(Clone, Copy)]
pub struct ImplementationEntry {
    implementation: fn() -> TypeKey,
    contract: fn() -> TypeKey,
    upcast: fn(&Instance) -> Option<Instance>,
}

impl ImplementationEntry {
    /// Describes `T` implementing `C`.
    #[must_use]
    pub const fn of<T: Implements<C>, C: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            implementation: TypeKey::of::<T>,
            contract: TypeKey::of::<C>,
            upcast: upcast_erased::<T, C>,
        }
    }

    /// The implementing type.
    #[must_use]
    pub fn implementation(&self) -> TypeKey {
        (self.implementation)()
    }

    /// The implemented contract.
    #[must_use]
    pub fn contract(&self) -> TypeKey {
        (self.contract)()
    }
}

fn upcast_erased<T: Implements<C>, C: ?Sized + Send + Sync + 'static>(
    instance: &Instance,
) -> Option<Instance> {
    instance
        .downcast::<T>()
        .map(|implementation| Instance::new(<T as Implements<C>>::upcast(implementation)))
}

/// An interceptor type's erased coercion.
#[derive(Clone, Copy)]
pub struct InterceptorEntry {
    key: fn() -> TypeKey,
    coerce: fn(&Instance) -> Option<Arc<dyn Interceptor>>,
}

impl InterceptorEntry {
    /// Describes interceptor `I`.
    #[must_use]
    pub const fn of<I: Interceptor>() -> Self {
        Self {
            key: TypeKey::of::<I>,
            coerce: coerce_erased::<I>,
        }
    }

    /// The interceptor's key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }
}

fn coerce_erased<I: Interceptor>(instance: &Instance) -> Option<Arc<dyn Interceptor>> {
    instance
        .downcast::<I>()
        .map(|interceptor| interceptor as Arc<dyn Interceptor>)
}

/// Contracts contributed at link time by `#[contract]`.
#[linkme::distributed_slice]
pub static CONTRACTS: [ContractEntry] = [..];

/// Implementations contributed at link time by `#[implements]` and `#[intercept]`.
#[linkme::distributed_slice]
pub static IMPLEMENTATIONS: [ImplementationEntry] = [..];

/// Interceptors contributed at link time by `#[interceptor]`.
#[linkme::distributed_slice]
pub static INTERCEPTORS: [InterceptorEntry] = [..];

// ─────────────────────────────────────────────────────────────────────────────
// TypeRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Known contracts, implementations, interceptors and constructors.
///
/// Also the default [`ProxyBackend`]: it synthesizes the forwarding types
/// generated by `#[contract]`.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    constructors: Constructors,
    contracts: HashMap<TypeKey, ContractEntry>,
    implementations: HashMap<(TypeKey, TypeKey), ImplementationEntry>,
    interceptors: HashMap<TypeKey, InterceptorEntry>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every entry contributed at link time.
    #[must_use]
    pub fn linked() -> Self {
        let mut registry = Self {
            constructors: Constructors::linked(),
            ..Self::default()
        };
        for entry in CONTRACTS {
            registry.insert_contract(*entry);
        }
        for entry in IMPLEMENTATIONS {
            registry.insert_implementation(*entry);
        }
        for entry in INTERCEPTORS {
            registry.insert_interceptor(*entry);
        }
        tracing::debug!(
            contracts = registry.contracts.len(),
            implementations = registry.implementations.len(),
            interceptors = registry.interceptors.len(),
            constructors = registry.constructors.len(),
            "type registry linked"
        );
        registry
    }

    /// Adds contract `C`.
    pub fn register_contract<C: ?Sized + Contract>(&mut self) -> &mut Self {
        self.insert_contract(ContractEntry::of::<C>());
        self
    }

    /// Records that `T` implements `C`.
    pub fn register_implementation<T, C>(&mut self) -> &mut Self
    where
        T: Implements<C>,
        C: ?Sized + Send + Sync + 'static,
    {
        self.insert_implementation(ImplementationEntry::of::<T, C>());
        self
    }

    /// Adds interceptor `I`.
    pub fn register_interceptor<I: Interceptor>(&mut self) -> &mut Self {
        self.insert_interceptor(InterceptorEntry::of::<I>());
        self
    }

    /// Adds the constructor of `T`.
    pub fn register_constructor<T: Injectable>(&mut self) -> &mut Self {
        self.constructors.register::<T>();
        self
    }

    /// Adds an erased contract entry.
    pub fn insert_contract(&mut self, entry: ContractEntry) {
        self.contracts.insert(entry.key(), entry);
    }

    /// Adds an erased implementation entry.
    pub fn insert_implementation(&mut self, entry: ImplementationEntry) {
        self.implementations
            .insert((entry.implementation(), entry.contract()), entry);
    }

    /// Adds an erased interceptor entry.
    pub fn insert_interceptor(&mut self, entry: InterceptorEntry) {
        self.interceptors.insert(entry.key(), entry);
    }

    /// The constructor catalog.
    #[must_use]
    pub fn constructors(&self) -> &Constructors {
        &self.constructors
    }

    /// Returns `true` if `contract` is a known contract.
    #[must_use]
    pub fn is_contract(&self, contract: TypeKey) -> bool {
        self.contracts.contains_key(&contract)
    }

    /// The proxy type generated for `contract`, if it is a known contract.
    #[must_use]
    pub fn proxy_of(&self, contract: TypeKey) -> Option<TypeKey> {
        self.contracts.get(&contract).map(ContractEntry::proxy)
    }

    /// Returns `true` if `implementation` can stand in for `contract`.
    ///
    /// A type always implements itself.
    #[must_use]
    pub fn implements(&self, implementation: TypeKey, contract: TypeKey) -> bool {
        implementation == contract || self.implementations.contains_key(&(implementation, contract))
    }

    /// Returns `true` if `interceptor` is a known interceptor type.
    #[must_use]
    pub fn is_interceptor(&self, interceptor: TypeKey) -> bool {
        self.interceptors.contains_key(&interceptor)
    }

    /// Contracts `implementation` is registered as implementing, ordered by
    /// type name.
    #[must_use]
    pub fn contracts_of(&self, implementation: TypeKey) -> Vec<TypeKey> {
        let mut contracts: Vec<_> = self
            .implementations
            .keys()
            .filter(|(candidate, _)| *candidate == implementation)
            .map(|(_, contract)| *contract)
            .collect();
        contracts.sort_unstable_by_key(TypeKey::name);
        contracts
    }

    /// Upcasts a constructed implementation to `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidContractError::NotImplemented`] if no upcast is
    /// registered.
    pub fn upcast_instance(
        &self,
        instance: &Instance,
        contract: TypeKey,
    ) -> Result<Instance, InvalidContractError> {
        let implementation = instance.key();
        if implementation == contract {
            return Ok(instance.clone());
        }
        self.implementations
            .get(&(implementation, contract))
            .and_then(|entry| (entry.upcast)(instance))
            .ok_or(InvalidContractError::NotImplemented {
                implementation,
                contract,
            })
    }

    /// Views a constructed instance as an interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidContractError::NotAnInterceptor`] if the instance's
    /// type is not a registered interceptor.
    pub fn as_interceptor(
        &self,
        instance: &Instance,
    ) -> Result<Arc<dyn Interceptor>, InvalidContractError> {
        let interceptor = instance.key();
        self.interceptors
            .get(&interceptor)
            .and_then(|entry| (entry.coerce)(instance))
            .ok_or(InvalidContractError::NotAnInterceptor { interceptor })
    }
}

impl ProxyBackend for TypeRegistry {
    fn supports(&self, contract: TypeKey) -> bool {
        self.is_contract(contract)
    }

    fn synthesize(
        &self,
        contract: TypeKey,
        target: DispatchTarget,
    ) -> Result<Instance, InvalidContractError> {
        let entry = self
            .contracts
            .get(&contract)
            .ok_or(InvalidContractError::NoBackend { contract })?;
        (entry.synthesize)(target)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("implementations", &self.implementations.len())
            .field("interceptors", &self.interceptors.keys().collect::<Vec<_>>())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}
