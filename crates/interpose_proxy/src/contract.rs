//! Contracts and the implementations that satisfy them.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::method::ContractDescriptor;

/// A calling surface that can be proxied.
///
/// Implemented by `#[contract]` for `dyn Trait` (trait contracts) or for a
/// concrete type (inherent-impl contracts). The generated proxy exposes the
/// same methods, each returning `Option<Value>`.
pub trait Contract: Send + Sync + 'static {
    /// The forwarding type generated for this contract.
    type Proxy: Send + Sync + 'static;

    /// Static description of the contract's methods.
    fn descriptor() -> &'static ContractDescriptor;

    /// Wraps a bound dispatcher in the forwarding type.
    fn synthesize(dispatcher: Dispatcher<Self>) -> Self::Proxy;
}

/// Converts a shared implementation into a shared contract.
///
/// Every type implements itself. `#[implements(dyn Trait)]` and
/// `#[intercept(.., implements(dyn Trait))]` add `Implements<dyn Trait>`.
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    /// Upcasts to the contract.
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}
