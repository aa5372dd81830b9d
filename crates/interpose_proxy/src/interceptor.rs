//! The hook contract implemented by interceptors.

use downcast_rs::{DowncastSync, impl_downcast};
use interpose_container::BoxError;

use crate::error::{Failure, SpawnError};
use crate::method::{Arguments, MethodDescriptor};
use crate::value::Value;

/// Lifecycle hooks run around every proxied call.
///
/// One interceptor is bound to a proxy for its whole lifetime. For a call to
/// method `m`:
///
/// 1. [`before_call`](Self::before_call) runs with the call's arguments.
/// 2. The target runs.
/// 3. On success [`after_call`](Self::after_call) observes the result. For
///    async methods this happens once the returned future settles.
/// 4. On any failure [`on_exception`](Self::on_exception) runs instead, and
///    for synchronous calls its return value becomes the proxy's result.
///
/// A hook's `Err` or panic is treated like a target failure: it skips the
/// remaining steps and goes to `on_exception`.
///
/// # Example
///
/// ```
/// use interpose_proxy::{Failure, Interceptor, MethodDescriptor, Value};
///
/// struct FallbackToZero;
///
/// impl Interceptor for FallbackToZero {
///     fn on_exception(&self, _failure: Failure, _method: &MethodDescriptor) -> Option<Value> {
///         Some(Value::new(0_i32))
///     }
/// }
/// ```
pub trait Interceptor: DowncastSync {
    /// Runs before the target is invoked.
    ///
    /// # Errors
    ///
    /// An error aborts the call and is passed to `on_exception`.
    fn before_call(
        &self,
        _method: &MethodDescriptor,
        _arguments: &Arguments<'_>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after the target succeeds. `value` is `None` for methods with no
    /// output.
    ///
    /// # Errors
    ///
    /// For synchronous calls an error is passed to `on_exception`. For async
    /// calls it is logged as an unobserved failure.
    fn after_call(&self, _method: &MethodDescriptor, _value: Option<&Value>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Handles a failure of the target or a hook.
    ///
    /// The returned value is the synchronous call's result. For async calls
    /// it is discarded.
    fn on_exception(&self, failure: Failure, method: &MethodDescriptor) -> Option<Value>;

    /// Runs when the continuation of an async call could not be scheduled.
    ///
    /// The target's future is dropped without being polled.
    fn on_continuation_unscheduled(&self, method: &MethodDescriptor, error: &SpawnError) {
        tracing::warn!(method = %method, error = %error, "async continuation not scheduled");
    }
}

impl_downcast!(sync Interceptor);
