//! An interceptor that logs every proxied call.

use interpose_container::BoxError;
use interpose_proxy::{
    Arguments, Failure, Injectable, Interceptor, MethodDescriptor, SpawnError, Value, interceptor,
};
use tracing::Level;

/// Emits an event at a level chosen at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    }};
}

/// Level of call events; `INFO` unless configured.
#[derive(Debug, Clone, Copy)]
struct CallLevel(Level);

impl Default for CallLevel {
    fn default() -> Self {
        Self(Level::INFO)
    }
}

/// Logs arguments, results and failures of every call.
///
/// Failures are logged at `WARN` and never recovered: `on_exception`
/// returns `None`.
///
/// # Example
///
/// ```ignore
/// #[derive(Injectable)]
/// #[intercept(with = TracingInterceptor, lifetime = Singleton, implements(dyn Billing))]
/// struct StripeBilling;
/// ```
#[derive(Debug, Default, Injectable)]
pub struct TracingInterceptor {
    #[inject(default)]
    level: CallLevel,
}

impl TracingInterceptor {
    /// Logs calls at `INFO`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs calls at `level`.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = CallLevel(level);
        self
    }

    /// The level calls are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level.0
    }
}

#[interceptor]
impl Interceptor for TracingInterceptor {
    fn before_call(
        &self,
        method: &MethodDescriptor,
        arguments: &Arguments<'_>,
    ) -> Result<(), BoxError> {
        event_at!(
            self.level.0,
            method = %method,
            arguments = %arguments,
            asynchronous = method.is_async(),
            "call started"
        );
        Ok(())
    }

    fn after_call(&self, method: &MethodDescriptor, value: Option<&Value>) -> Result<(), BoxError> {
        event_at!(
            self.level.0,
            method = %method,
            value = value.map(|value| value.type_name()),
            "call completed"
        );
        Ok(())
    }

    fn on_exception(&self, failure: Failure, method: &MethodDescriptor) -> Option<Value> {
        tracing::warn!(
            method = %method,
            hook = ?failure.hook_kind(),
            error = %failure.cause(),
            "call failed"
        );
        None
    }

    fn on_continuation_unscheduled(&self, method: &MethodDescriptor, error: &SpawnError) {
        tracing::error!(method = %method, error = %error, "async call never settled");
    }
}
