//! Interception markers.

use core::fmt;

use interpose_container::{Lifetime, TypeKey};

/// One `#[intercept(with = I, lifetime = L)]` occurrence.
///
/// The interceptor is stored as a key only. Discovery checks that it names a
/// registered interceptor before using it.
#[derive(Clone, Copy)]
pub struct Marker {
    interceptor: fn() -> TypeKey,
    lifetime: Lifetime,
}

impl Marker {
    /// Creates a marker from an interceptor key function.
    #[must_use]
    pub const fn new(interceptor: fn() -> TypeKey, lifetime: Lifetime) -> Self {
        Self {
            interceptor,
            lifetime,
        }
    }

    /// Creates a marker naming interceptor type `I`.
    #[must_use]
    pub const fn of<I: 'static>(lifetime: Lifetime) -> Self {
        Self::new(TypeKey::of::<I>, lifetime)
    }

    /// The named interceptor type.
    #[must_use]
    pub fn interceptor(&self) -> TypeKey {
        (self.interceptor)()
    }

    /// The registration lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("interceptor", &self.interceptor())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
