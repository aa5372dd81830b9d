//! [`TypeKey`] identifies registrations and [`Instance`] carries any shared
//! service behind that identity.
//!
//! Both work with unsized contract types, so a service can be registered
//! under `dyn Calculator` and handed out as `Arc<dyn Calculator>`.

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

/// Unique identifier for a type, including `dyn Trait` contracts.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates a `TypeKey` for the given type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type-erased shared service.
///
/// Wraps an `Arc<T>` where `T` may be unsized. Cloning an `Instance` clones
/// the handle, never the service.
#[derive(Clone)]
pub struct Instance {
    key: TypeKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Erases a shared service.
    #[must_use]
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// Returns the key of the type this instance was erased from.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns `true` if this instance holds an `Arc<T>`.
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.key.type_id() == TypeId::of::<T>()
    }

    /// Recovers the shared service as `Arc<T>`.
    #[must_use]
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.key.name).finish()
    }
}
