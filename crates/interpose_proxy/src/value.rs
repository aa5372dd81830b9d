//! Owned, type-erased values passed between proxies and hooks.

use core::any::{Any, TypeId, type_name};
use core::fmt;

/// A type-erased owned value.
///
/// Proxies return `Option<Value>` from every forwarded method, and hooks
/// receive the target's result as a `Value`. Use [`Value::downcast_ref`] or
/// [`Value::downcast`] to recover the concrete type.
///
/// # Example
///
/// ```
/// use interpose_proxy::Value;
///
/// let value = Value::new(5_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&5));
/// assert_eq!(value.downcast::<i32>().ok(), Some(5));
/// ```
pub struct Value {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Value {
    /// Erases `value`.
    #[must_use]
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the name of the erased type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the erased type is `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        (*self.inner).type_id() == TypeId::of::<T>()
    }

    /// Borrows the value as `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recovers the value as `T`, or returns it unchanged on mismatch.
    ///
    /// # Errors
    ///
    /// Returns `self` if the erased type is not `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|inner| Self { inner, type_name })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}
