//! Example calculator service.
//!
//! `BasicCalculator` implements [`Calculator`] and stores every sum in a
//! [`ResultStore`]. It is marked for discovery behind [`FallbackInterceptor`],
//! which logs each call and turns failures into `-1`.

use std::sync::Arc;

use interpose_container::BoxError;
use interpose_discovery::intercept;
use interpose_proxy::{
    Arguments, BoxFuture, Failure, Injectable, Interceptor, MethodDescriptor, Value, contract,
    interceptor,
};
use parking_lot::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Contracts
// ─────────────────────────────────────────────────────────────────────────────

/// Failures raised by [`Calculator`] methods.
#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    /// The divisor was zero.
    #[error("cannot divide {0} by zero")]
    DivideByZero(i32),
}

/// Arithmetic with side effects.
#[contract]
pub trait Calculator: Send + Sync {
    /// Adds two numbers and records the sum.
    fn add(&self, a: i32, b: i32) -> i32;

    /// Divides `a` by `b`.
    fn divide(&self, a: i32, b: i32) -> Result<i32, CalculatorError>;

    /// Records a message once it has been delivered.
    fn notify(&self, message: String) -> BoxFuture<'static, ()>;
}

/// Where results end up.
pub trait ResultStore: Send + Sync {
    /// Records a line.
    fn record(&self, line: String);

    /// Everything recorded so far.
    fn lines(&self) -> Vec<String>;
}

/// A [`ResultStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: Mutex<Vec<String>>,
}

impl ResultStore for MemoryStore {
    fn record(&self, line: String) {
        self.lines.lock().push(line);
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculator backed by a [`ResultStore`].
#[derive(Injectable)]
#[intercept(with = FallbackInterceptor, lifetime = Scoped, implements(dyn Calculator))]
pub struct BasicCalculator {
    store: Arc<dyn ResultStore>,
}

impl Calculator for BasicCalculator {
    fn add(&self, a: i32, b: i32) -> i32 {
        let sum = a + b;
        self.store.record(sum.to_string());
        sum
    }

    fn divide(&self, a: i32, b: i32) -> Result<i32, CalculatorError> {
        a.checked_div(b).ok_or(CalculatorError::DivideByZero(a))
    }

    fn notify(&self, message: String) -> BoxFuture<'static, ()> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            store.record(message);
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interceptor
// ─────────────────────────────────────────────────────────────────────────────

/// Logs calls and recovers every failure with `-1`.
#[derive(Injectable)]
pub struct FallbackInterceptor {
    store: Arc<dyn ResultStore>,
}

#[interceptor]
impl Interceptor for FallbackInterceptor {
    fn before_call(
        &self,
        method: &MethodDescriptor,
        arguments: &Arguments<'_>,
    ) -> Result<(), BoxError> {
        tracing::info!(method = %method, arguments = %arguments, "calling");
        Ok(())
    }

    fn after_call(&self, method: &MethodDescriptor, value: Option<&Value>) -> Result<(), BoxError> {
        if method.is_async() {
            self.store.record(format!("{} settled", method.name()));
        }
        tracing::info!(method = %method, value = ?value, "returned");
        Ok(())
    }

    fn on_exception(&self, failure: Failure, method: &MethodDescriptor) -> Option<Value> {
        tracing::warn!(method = %method, error = %failure.cause(), "recovering with -1");
        Some(Value::new(-1_i32))
    }
}
