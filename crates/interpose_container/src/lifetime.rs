//! Sharing lifetimes for registered factories.

use core::fmt;

/// Sharing policy for a registered factory.
///
/// # Identity
///
/// - **Singleton**: one instance for the container, shared by every scope
/// - **Scoped**: one instance per [`Scope`](crate::Scope); the same within a
///   scope, distinct across scopes
/// - **Transient**: a new instance on every resolution
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use interpose_container::{Lifetime, ResolverExt, ServiceCollection};
///
/// struct Session;
///
/// let mut services = ServiceCollection::new();
/// services.add::<Session>(Lifetime::Scoped, |_| Ok(Arc::new(Session)));
/// let container = services.build();
///
/// let scope = container.create_scope();
/// let first = scope.resolve::<Session>().unwrap().unwrap();
/// let second = scope.resolve::<Session>().unwrap().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// let other = container.create_scope().resolve::<Session>().unwrap().unwrap();
/// assert!(!Arc::ptr_eq(&first, &other));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Created once and cached for the container's lifetime.
    Singleton,
    /// Created once per scope and cached for the scope's lifetime.
    Scoped,
    /// Created on every resolution, never cached.
    Transient,
}

impl Lifetime {
    /// Returns the lifetime's lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
