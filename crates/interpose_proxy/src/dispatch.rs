//! The invocation dispatcher.
//!
//! A [`Dispatcher`] owns one target and at most one interceptor, and runs
//! every call of a proxy through the same state machine:
//!
//! ```text
//! Idle -> BeforeHook -> TargetInvoking -> SyncSettling  -> Done
//!                                      -> AsyncPending  -> Done
//!              \               \               \
//!               +---------------+---------------+-> ExceptionHook -> Done
//! ```
//!
//! Synchronous calls always return `None` unless `on_exception` supplies a
//! value; the target's own result reaches only `after_call`. Async calls
//! return `None` immediately and settle on a spawned continuation.

use core::any::TypeId;
use core::fmt;
use core::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use interpose_container::BoxError;

use crate::error::{ArgumentError, Failure, HookKind, PanicError};
use crate::interceptor::Interceptor;
use crate::method::{ArgumentList, Arguments, MethodDescriptor};
use crate::spawn::{Spawner, TokioSpawner};
use crate::value::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// The settled result of a target method.
pub enum Outcome {
    /// The method produced a value.
    Value(Value),
    /// The method produced no output.
    Unit,
    /// The method returned an error.
    Failed(BoxError),
}

impl Outcome {
    /// Wraps a return value. `()` becomes [`Outcome::Unit`].
    #[must_use]
    pub fn from_value<T: Send + 'static>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            Self::Unit
        } else {
            Self::Value(Value::new(value))
        }
    }

    /// The unit outcome.
    #[must_use]
    pub fn unit() -> Self {
        Self::Unit
    }

    /// Wraps a fallible return value.
    #[must_use]
    pub fn from_result<T, E>(result: Result<T, E>) -> Self
    where
        T: Send + 'static,
        E: Into<BoxError>,
    {
        match result {
            Ok(value) => Self::from_value(value),
            Err(err) => Self::Failed(err.into()),
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Unit => f.write_str("Unit"),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

/// What invoking a target method produced before any awaiting.
pub enum Invoked {
    /// A synchronous method's outcome.
    Ready(Outcome),
    /// An async method's pending outcome.
    Pending(BoxFuture<'static, Outcome>),
}

impl Invoked {
    /// A synchronous outcome.
    #[must_use]
    pub fn ready(outcome: Outcome) -> Self {
        Self::Ready(outcome)
    }

    /// A pending outcome.
    #[must_use]
    pub fn pending(future: impl Future<Output = Outcome> + Send + 'static) -> Self {
        Self::Pending(Box::pin(future))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation state
// ─────────────────────────────────────────────────────────────────────────────

/// Dispatch phases, traced on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    BeforeHook,
    TargetInvoking,
    SyncSettling,
    AsyncPending,
    ExceptionHook,
    Done,
}

/// Context of one call, kept until the call settles.
struct Invocation {
    method: &'static MethodDescriptor,
    phase: Phase,
}

impl Invocation {
    fn new(method: &'static MethodDescriptor) -> Self {
        Self {
            method,
            phase: Phase::Idle,
        }
    }

    fn enter(&mut self, next: Phase) {
        tracing::trace!(
            method = %self.method,
            from = ?self.phase,
            to = ?next,
            asynchronous = self.method.is_async(),
            "invocation phase"
        );
        self.phase = next;
    }

    /// Runs the exception hook, or swallows the failure if none is bound.
    fn fail(&mut self, interceptor: Option<&dyn Interceptor>, failure: Failure) -> Option<Value> {
        let result = match interceptor {
            Some(interceptor) => {
                self.enter(Phase::ExceptionHook);
                interceptor.on_exception(failure, self.method)
            }
            None => {
                tracing::debug!(
                    method = %self.method,
                    error = %failure,
                    cause = %failure.cause(),
                    "failure swallowed, no interceptor bound"
                );
                None
            }
        };
        self.enter(Phase::Done);
        result
    }
}

/// Runs a hook, turning a panic into an error.
fn guarded(hook: impl FnOnce() -> Result<(), BoxError>) -> Result<(), BoxError> {
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(Box::new(PanicError::from_payload(payload))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Forwards calls to a target through an interceptor's hooks.
///
/// Generated proxies own one dispatcher and call [`Dispatcher::dispatch`]
/// from every method. The dispatcher is reusable across calls and holds no
/// per-call state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use interpose_proxy::{
///     Dispatcher, Failure, Interceptor, Invoked, MethodDescriptor, Outcome, ReturnShape, Value,
/// };
///
/// struct Recover;
///
/// impl Interceptor for Recover {
///     fn on_exception(&self, _failure: Failure, _method: &MethodDescriptor) -> Option<Value> {
///         Some(Value::new(-1_i32))
///     }
/// }
///
/// static DIVIDE: MethodDescriptor =
///     MethodDescriptor::new("Math", "divide", &["a", "b"], ReturnShape::Sync);
///
/// let dispatcher = Dispatcher::new(Arc::new(()), Some(Arc::new(Recover)));
/// let result = dispatcher.dispatch(&DIVIDE, (1_i32, 0_i32), |_, (a, b)| {
///     Invoked::ready(Outcome::from_value(a / b))
/// });
/// assert_eq!(result.and_then(|value| value.downcast::<i32>().ok()), Some(-1));
/// ```
pub struct Dispatcher<C: ?Sized> {
    target: Arc<C>,
    interceptor: Option<Arc<dyn Interceptor>>,
    spawner: Arc<dyn Spawner>,
}

impl<C: ?Sized + Send + Sync + 'static> Dispatcher<C> {
    /// Binds a target and an optional interceptor, spawning continuations on
    /// the caller's tokio runtime.
    #[must_use]
    pub fn new(target: Arc<C>, interceptor: Option<Arc<dyn Interceptor>>) -> Self {
        Self::from_parts(target, interceptor, Arc::new(TokioSpawner::current()))
    }

    /// Binds a target with no interceptor.
    #[must_use]
    pub fn without_interceptor(target: Arc<C>) -> Self {
        Self::new(target, None)
    }

    /// Binds a target, interceptor and spawner.
    #[must_use]
    pub fn from_parts(
        target: Arc<C>,
        interceptor: Option<Arc<dyn Interceptor>>,
        spawner: Arc<dyn Spawner>,
    ) -> Self {
        Self {
            target,
            interceptor,
            spawner,
        }
    }

    /// Replaces the spawner used for async continuations.
    #[must_use]
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// The wrapped target.
    #[must_use]
    pub fn target(&self) -> &Arc<C> {
        &self.target
    }

    /// The bound interceptor, if any.
    #[must_use]
    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }

    /// Dispatches one call.
    ///
    /// `invoke` calls the target method with the captured `arguments`.
    /// Returns `on_exception`'s value if the call failed, and `None`
    /// otherwise.
    pub fn dispatch<A, F>(
        &self,
        method: &'static MethodDescriptor,
        arguments: A,
        invoke: F,
    ) -> Option<Value>
    where
        A: ArgumentList,
        F: FnOnce(&Arc<C>, A) -> Invoked,
    {
        let mut invocation = Invocation::new(method);
        let interceptor = self.interceptor.as_deref();

        if let Some(interceptor) = interceptor {
            invocation.enter(Phase::BeforeHook);
            let view = Arguments::new(method.parameters(), arguments.values());
            if let Err(source) = guarded(|| interceptor.before_call(method, &view)) {
                return invocation.fail(
                    Some(interceptor),
                    Failure::hook(HookKind::BeforeCall, method, source),
                );
            }
        }

        invocation.enter(Phase::TargetInvoking);
        let invoked = match catch_unwind(AssertUnwindSafe(|| invoke(&self.target, arguments))) {
            Ok(invoked) => invoked,
            Err(payload) => {
                let source: BoxError = Box::new(PanicError::from_payload(payload));
                return invocation.fail(interceptor, Failure::target(method, source));
            }
        };

        match invoked {
            Invoked::Ready(outcome) => self.settle(invocation, outcome),
            Invoked::Pending(future) => self.schedule(invocation, future),
        }
    }

    /// Dispatches one call, failing fast if no method is given.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::MissingMethod`] before any hook runs if
    /// `method` is `None`.
    pub fn try_dispatch<A, F>(
        &self,
        method: Option<&'static MethodDescriptor>,
        arguments: A,
        invoke: F,
    ) -> Result<Option<Value>, ArgumentError>
    where
        A: ArgumentList,
        F: FnOnce(&Arc<C>, A) -> Invoked,
    {
        let method = method.ok_or(ArgumentError::MissingMethod)?;
        Ok(self.dispatch(method, arguments, invoke))
    }

    fn settle(&self, mut invocation: Invocation, outcome: Outcome) -> Option<Value> {
        let method = invocation.method;
        let interceptor = self.interceptor.as_deref();
        let value = match outcome {
            Outcome::Failed(source) => {
                return invocation.fail(interceptor, Failure::target(method, source));
            }
            Outcome::Value(value) => Some(value),
            Outcome::Unit => None,
        };

        invocation.enter(Phase::SyncSettling);
        if let Some(interceptor) = interceptor
            && let Err(source) = guarded(|| interceptor.after_call(method, value.as_ref()))
        {
            return invocation.fail(
                Some(interceptor),
                Failure::hook(HookKind::AfterCall, method, source),
            );
        }

        invocation.enter(Phase::Done);
        None
    }

    fn schedule(
        &self,
        mut invocation: Invocation,
        future: BoxFuture<'static, Outcome>,
    ) -> Option<Value> {
        let method = invocation.method;
        invocation.enter(Phase::AsyncPending);

        let interceptor = self.interceptor.clone();
        let continuation = async move {
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => Outcome::Failed(Box::new(PanicError::from_payload(payload))),
            };

            let settled = catch_unwind(AssertUnwindSafe(|| {
                settle_continuation(&mut invocation, interceptor.as_deref(), outcome)
            }));
            let error: BoxError = match settled {
                Ok(Ok(())) => return,
                Ok(Err(error)) => error,
                Err(payload) => Box::new(PanicError::from_payload(payload)),
            };
            tracing::warn!(
                method = %method,
                error = %error,
                "unobserved failure in async continuation"
            );
        };

        if let Err(error) = self.spawner.spawn(Box::pin(continuation)) {
            match self.interceptor.as_deref() {
                Some(interceptor) => interceptor.on_continuation_unscheduled(method, &error),
                None => tracing::warn!(
                    method = %method,
                    error = %error,
                    "async continuation not scheduled"
                ),
            }
        }
        None
    }
}

/// Reports an async call's outcome to the interceptor.
fn settle_continuation(
    invocation: &mut Invocation,
    interceptor: Option<&dyn Interceptor>,
    outcome: Outcome,
) -> Result<(), BoxError> {
    let method = invocation.method;
    match outcome {
        Outcome::Failed(source) => {
            if let Some(value) = invocation.fail(interceptor, Failure::target(method, source)) {
                tracing::trace!(method = %method, value = ?value, "exception hook result discarded");
            }
            Ok(())
        }
        Outcome::Value(value) => {
            let result = interceptor.map_or(Ok(()), |interceptor| {
                interceptor.after_call(method, Some(&value))
            });
            invocation.enter(Phase::Done);
            result
        }
        Outcome::Unit => {
            let result =
                interceptor.map_or(Ok(()), |interceptor| interceptor.after_call(method, None));
            invocation.enter(Phase::Done);
            result
        }
    }
}

impl<C: ?Sized> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &core::any::type_name::<C>())
            .field("intercepted", &self.interceptor.is_some())
            .finish_non_exhaustive()
    }
}
