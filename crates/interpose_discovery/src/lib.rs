//! Declarative interception for Interpose.
//!
//! Mark a type with `#[intercept(with = Interceptor, lifetime = Scoped)]`
//! and [`DiscoveryRegistrar`] registers a proxy factory for it with any
//! container implementing [`FactoryRegistry`](interpose_container::FactoryRegistry):
//!
//! - [`marker`] - [`Marker`]
//! - [`component`] - [`ExportedType`] and [`Component`]
//! - [`config`] - [`DiscoveryConfig`]
//! - [`registrar`] - [`DiscoveryRegistrar`] and [`ContractBinding`]
//!
//! # Example
//!
//! ```
//! use interpose_container::ServiceCollection;
//! use interpose_discovery::{Component, DiscoveryRegistrar, intercept};
//! use interpose_proxy::{
//!     Failure, Injectable, Interceptor, MethodDescriptor, ResolveProxy, Value, contract,
//!     interceptor,
//! };
//!
//! #[contract]
//! pub trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! #[derive(Injectable)]
//! struct Silent;
//!
//! #[interceptor]
//! impl Interceptor for Silent {
//!     fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
//!         None
//!     }
//! }
//!
//! #[derive(Injectable)]
//! #[intercept(with = Silent, lifetime = Singleton, implements(dyn Clock))]
//! struct SystemClock;
//!
//! impl Clock for SystemClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! let component = Component::new("clocks").with::<SystemClock>();
//! DiscoveryRegistrar::linked().discover_and_register(&[component], &mut services);
//!
//! let container = services.build();
//! let clock = container.resolve_proxy::<dyn Clock>().unwrap().unwrap();
//! assert!(clock.now().is_none());
//! ```

// Self-reference so `#[intercept]` output resolves inside this crate.
extern crate self as interpose_discovery;

/// Exported types and components.
pub mod component;

/// Discovery configuration.
pub mod config;

/// Interception markers.
pub mod marker;

/// Marker scanning and registration.
pub mod registrar;

pub use component::{Component, EXPORTED_TYPES, Exported, ExportedType};
pub use config::DiscoveryConfig;
pub use marker::Marker;
pub use registrar::{ContractBinding, DiscoveryRegistrar};

pub use interpose_proxy_macros::intercept;

#[doc(hidden)]
pub mod __private {
    pub use crate::component::{EXPORTED_TYPES, Exported, ExportedType};
    pub use crate::marker::Marker;
    pub use interpose_container::{Lifetime, TypeKey};
    pub use interpose_proxy::__private::IMPLEMENTATIONS;
    pub use interpose_proxy::{ImplementationEntry, Implements};
    pub use linkme;
}

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::component::{Component, Exported, ExportedType};
    pub use crate::config::DiscoveryConfig;
    pub use crate::marker::Marker;
    pub use crate::registrar::{ContractBinding, DiscoveryRegistrar};
    pub use interpose_proxy_macros::intercept;
}
