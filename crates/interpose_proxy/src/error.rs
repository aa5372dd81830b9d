//! Failures seen by hooks and errors raised while building proxies.

use core::any::Any;
use core::fmt;

use interpose_container::{BoxError, ConstructionError, TypeKey};

use crate::method::MethodDescriptor;

// ─────────────────────────────────────────────────────────────────────────────
// Call failures
// ─────────────────────────────────────────────────────────────────────────────

/// Which hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// `before_call`.
    BeforeCall,
    /// `after_call`.
    AfterCall,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeCall => f.write_str("before_call"),
            Self::AfterCall => f.write_str("after_call"),
        }
    }
}

/// A failure during one call, handed to
/// [`Interceptor::on_exception`](crate::Interceptor::on_exception).
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The target method returned an error or panicked.
    #[error("`{method}` failed")]
    Target {
        /// The called method.
        method: &'static MethodDescriptor,
        /// What the target raised.
        #[source]
        source: BoxError,
    },

    /// A hook returned an error or panicked.
    #[error("{hook} hook failed for `{method}`")]
    Hook {
        /// The failing hook.
        hook: HookKind,
        /// The called method.
        method: &'static MethodDescriptor,
        /// What the hook raised.
        #[source]
        source: BoxError,
    },
}

impl Failure {
    pub(crate) fn target(method: &'static MethodDescriptor, source: BoxError) -> Self {
        Self::Target { method, source }
    }

    pub(crate) fn hook(hook: HookKind, method: &'static MethodDescriptor, source: BoxError) -> Self {
        Self::Hook {
            hook,
            method,
            source,
        }
    }

    /// The method being called when the failure occurred.
    #[must_use]
    pub fn method(&self) -> &'static MethodDescriptor {
        match self {
            Self::Target { method, .. } | Self::Hook { method, .. } => method,
        }
    }

    /// The failing hook, or `None` if the target itself failed.
    #[must_use]
    pub fn hook_kind(&self) -> Option<HookKind> {
        match self {
            Self::Target { .. } => None,
            Self::Hook { hook, .. } => Some(*hook),
        }
    }

    /// The innermost cause, following `source()` links.
    #[must_use]
    pub fn cause(&self) -> &(dyn core::error::Error + 'static) {
        let mut cause: &(dyn core::error::Error + 'static) = match self {
            Self::Target { source, .. } | Self::Hook { source, .. } => source.as_ref(),
        };
        while let Some(next) = cause.source() {
            cause = next;
        }
        cause
    }

    /// Borrows the directly raised error as `E`.
    #[must_use]
    pub fn downcast_ref<E: core::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Target { source, .. } | Self::Hook { source, .. } => source.downcast_ref::<E>(),
        }
    }

    /// Returns the directly raised error.
    #[must_use]
    pub fn into_cause(self) -> BoxError {
        match self {
            Self::Target { source, .. } | Self::Hook { source, .. } => source,
        }
    }
}

/// A panic captured from a target or hook.
#[derive(Debug, Clone, thiserror::Error)]
#[error("panicked: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Builds the error from a panic payload.
    #[must_use]
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "non-string panic payload".to_string(),
            },
        };
        Self { message }
    }

    /// The panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised before a call is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// No method descriptor was supplied.
    #[error("no method descriptor supplied for dispatch")]
    MissingMethod,
}

/// The continuation of an asynchronous call could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    /// No executor is available on the calling thread.
    #[error("no async runtime available: {reason}")]
    NoRuntime {
        /// Why the runtime lookup failed.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Proxy creation errors
// ─────────────────────────────────────────────────────────────────────────────

/// A requested contract, implementation or interceptor does not fit together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidContractError {
    /// No synthesis backend is known for the contract.
    #[error("no proxy backend for contract `{contract}`")]
    NoBackend {
        /// The requested contract.
        contract: TypeKey,
    },

    /// The implementation is not registered as implementing the contract.
    #[error("`{implementation}` does not implement `{contract}`")]
    NotImplemented {
        /// The requested implementation.
        implementation: TypeKey,
        /// The requested contract.
        contract: TypeKey,
    },

    /// The type is not registered as an interceptor.
    #[error("`{interceptor}` is not an interceptor")]
    NotAnInterceptor {
        /// The requested interceptor type.
        interceptor: TypeKey,
    },

    /// A constructed target does not have the contract's type.
    #[error("expected a target of `{contract}`, found `{found}`")]
    TargetMismatch {
        /// The requested contract.
        contract: TypeKey,
        /// The type the target was erased from.
        found: TypeKey,
    },
}

/// Errors raised while creating a proxy.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Constructing the target or interceptor failed.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The requested types do not fit together.
    #[error(transparent)]
    InvalidContract(#[from] InvalidContractError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::ReturnShape;

    static DIVIDE: MethodDescriptor =
        MethodDescriptor::new("Calculator", "divide", &["a", "b"], ReturnShape::Sync);

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped")]
    struct Wrapped(#[source] PanicError);

    #[test]
    fn cause_unwraps_to_innermost_error() {
        let failure = Failure::target(
            &DIVIDE,
            Box::new(Wrapped(PanicError::from_payload(Box::new("attempt to divide by zero")))),
        );

        assert_eq!(failure.method().name(), "divide");
        assert!(failure.hook_kind().is_none());
        assert!(failure.downcast_ref::<Wrapped>().is_some());
        assert_eq!(
            failure.cause().to_string(),
            "panicked: attempt to divide by zero"
        );
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let owned = PanicError::from_payload(Box::new(String::from("owned")));
        assert_eq!(owned.message(), "owned");

        let opaque = PanicError::from_payload(Box::new(7_u8));
        assert_eq!(opaque.message(), "non-string panic payload");
    }

    #[test]
    fn hook_failure_names_the_hook() {
        let failure = Failure::hook(HookKind::AfterCall, &DIVIDE, "audit offline".into());
        assert_eq!(failure.hook_kind(), Some(HookKind::AfterCall));
        assert_eq!(
            failure.to_string(),
            "after_call hook failed for `Calculator::divide`"
        );
    }
}
