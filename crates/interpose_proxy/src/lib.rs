//! Interception proxies for Interpose.
//!
//! A proxy presents a contract's calling surface and funnels every call
//! through one [`Dispatcher`], which runs an [`Interceptor`]'s hooks around
//! the real target:
//!
//! - [`contract`] - [`Contract`] and [`Implements`]
//! - [`dispatch`] - The invocation state machine ([`Dispatcher`])
//! - [`interceptor`] - The hook contract ([`Interceptor`])
//! - [`factory`] - Proxy creation ([`ProxyFactory`])
//! - [`registry`] - By-type lookups ([`TypeRegistry`]) and proxy backends
//! - [`registration`] - Container helpers ([`InterceptedRegistry`], [`Intercepted`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use interpose_container::EmptyResolver;
//! use interpose_proxy::{
//!     Failure, Injectable, Interceptor, MethodDescriptor, ProxyFactory, Value,
//!     contract, implements, interceptor,
//! };
//!
//! #[contract]
//! pub trait Calculator: Send + Sync {
//!     fn divide(&self, a: i32, b: i32) -> i32;
//! }
//!
//! #[derive(Injectable)]
//! #[implements(dyn Calculator)]
//! struct Basic;
//!
//! impl Calculator for Basic {
//!     fn divide(&self, a: i32, b: i32) -> i32 {
//!         a / b
//!     }
//! }
//!
//! #[derive(Injectable)]
//! struct Fallback;
//!
//! #[interceptor]
//! impl Interceptor for Fallback {
//!     fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
//!         Some(Value::new(-1_i32))
//!     }
//! }
//!
//! let factory = ProxyFactory::linked();
//! let calculator = factory
//!     .create::<dyn Calculator, Basic, Fallback>(&EmptyResolver)
//!     .unwrap();
//!
//! // Successful synchronous calls return nothing; the value reaches `after_call`.
//! assert!(calculator.divide(6, 3).is_none());
//!
//! // Failures are replaced by `on_exception`'s value.
//! let recovered = calculator.divide(1, 0).unwrap();
//! assert_eq!(recovered.downcast::<i32>().ok(), Some(-1));
//! ```

// Self-reference so macro output resolves inside this crate.
extern crate self as interpose_proxy;

/// Contracts and implementations.
pub mod contract;

/// The invocation dispatcher.
pub mod dispatch;

/// Call failures and proxy creation errors.
pub mod error;

/// Proxy creation.
pub mod factory;

/// The hook contract.
pub mod interceptor;

/// Method descriptors and argument views.
pub mod method;

/// Container registration helpers.
pub mod registration;

/// Link-time registry and proxy backends.
pub mod registry;

/// Async continuation scheduling.
pub mod spawn;

/// Type-erased values.
pub mod value;

pub use contract::{Contract, Implements};
pub use dispatch::{Dispatcher, Invoked, Outcome};
pub use error::{
    ArgumentError, Failure, HookKind, InvalidContractError, PanicError, ProxyError, SpawnError,
};
pub use factory::{ProxyFactory, ProxyRequest, erase_arguments};
pub use interceptor::Interceptor;
pub use method::{Argument, ArgumentList, Arguments, ContractDescriptor, MethodDescriptor, ReturnShape};
pub use registration::{Intercepted, InterceptedRegistry, ResolveProxy};
pub use registry::{
    ContractEntry, DispatchTarget, ImplementationEntry, InterceptorEntry, ProxyBackend,
    TypeRegistry,
};
pub use spawn::{Spawner, TokioSpawner};
pub use value::Value;

pub use futures::future::BoxFuture;
pub use interpose_container::{BoxError, Injectable};
pub use interpose_proxy_macros::{contract, implements, interceptor};

#[doc(hidden)]
pub mod __private {
    pub use crate::registry::{CONTRACTS, IMPLEMENTATIONS, INTERCEPTORS};
    pub use futures::future::BoxFuture;
    pub use linkme;
}

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::dispatch::{Dispatcher, Invoked, Outcome};
    pub use crate::error::*;
    pub use crate::factory::*;
    pub use crate::interceptor::*;
    pub use crate::method::*;
    pub use crate::registration::*;
    pub use crate::spawn::*;
    pub use crate::value::*;
    pub use interpose_proxy_macros::{contract, implements, interceptor};
}
