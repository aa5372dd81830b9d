//! Type identity, sharing lifetimes and constructor resolution for Interpose.
//!
//! `interpose_container` provides the pieces every other Interpose crate
//! builds on:
//!
//! - [`key`] - [`TypeKey`] and the type-erased [`Instance`]
//! - [`lifetime`] - [`Lifetime`] sharing policies
//! - [`container`] - The container contract ([`Resolver`], [`FactoryRegistry`])
//!   and a reference implementation ([`ServiceCollection`], [`Container`], [`Scope`])
//! - [`construct`] - Constructor resolution ([`Injectable`], [`ConstructorResolver`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use interpose_container::{
//!     Constructors, ConstructorResolver, Injectable, Lifetime, ResolverExt, ServiceCollection,
//! };
//!
//! struct Clock;
//!
//! #[derive(Injectable)]
//! struct Greeter {
//!     clock: Arc<Clock>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_instance(Arc::new(Clock));
//! let container = services.build();
//!
//! let constructors = Constructors::linked();
//! let resolver = ConstructorResolver::new(&container, &constructors);
//! let greeter = resolver.construct::<Greeter>().expect("clock is registered");
//! assert!(Arc::ptr_eq(&greeter.clock, &container.resolve::<Clock>().unwrap().unwrap()));
//! ```

// Self-reference so `#[derive(Injectable)]` output resolves inside this crate.
extern crate self as interpose_container;

/// The container contract and the reference container.
pub mod container;

/// Constructor resolution.
pub mod construct;

/// Errors raised by containers and constructor resolution.
pub mod error;

/// Type identity and erased instances.
pub mod key;

/// Sharing lifetimes.
pub mod lifetime;

pub use container::{
    Container, EmptyResolver, Factory, FactoryRegistry, Registration, Resolver, ResolverExt,
    Scope, ServiceCollection, factory_fn,
};
pub use construct::{
    ConstructorEntry, ConstructorResolver, Constructors, Dependencies, Dependency, Injectable,
    Resolution,
};
pub use error::{BoxError, ConstructionError, ContainerError};
pub use key::{Instance, TypeKey};
pub use lifetime::Lifetime;

/// Derives [`Injectable`] from a struct's fields.
pub use interpose_container_macros::Injectable;

#[doc(hidden)]
pub mod __private {
    pub use crate::construct::CONSTRUCTORS;
    pub use linkme;
}

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::container::*;
    pub use crate::construct::*;
    pub use crate::error::*;
    pub use crate::key::*;
    pub use crate::lifetime::*;
}
