//! Interception proxies for Rust: wrap a contract's implementation so every
//! call runs through an interceptor's lifecycle hooks.

pub use interpose_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use interpose_internal::prelude::*;
}
