//! Logging for Interpose.
//!
//! - [`TracingSetup`] installs the global `tracing` subscriber
//! - [`TracingInterceptor`] logs every call made through a proxy

mod interceptor;
mod setup;

pub use interceptor::TracingInterceptor;
pub use setup::{TracingFormat, TracingSetup};
