//! # Interpose Internal Library
//!
//! Re-exports the core Interpose crates for convenience.

/// Type keys, lifetimes, the container contract and constructor resolution.
pub use interpose_container;

/// Proxies, interceptors and the invocation dispatcher.
pub use interpose_proxy;

/// Declarative interception markers and registration.
pub use interpose_discovery;

/// Logging setup and the logging interceptor.
#[cfg(feature = "tracing")]
pub use interpose_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use interpose_container::Injectable;
    pub use interpose_container::prelude::*;
    pub use interpose_discovery::prelude::*;
    pub use interpose_proxy::prelude::*;
    #[cfg(feature = "tracing")]
    pub use interpose_tracing::{TracingFormat, TracingInterceptor, TracingSetup};
}
