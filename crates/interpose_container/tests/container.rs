//! Tests for the reference container.
//!
//! Cover the three sharing lifetimes, scope isolation, factory failures and
//! re-entrant resolution.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use interpose_container::{
    BoxError, ContainerError, Lifetime, Resolver, ResolverExt, ServiceCollection, TypeKey,
};

// ─────────────────────────────────────────────────────────────────────────
// Test Services
// ─────────────────────────────────────────────────────────────────────────

struct Session {
    number: usize,
}

trait Greeting: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeting for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

fn numbered(lifetime: Lifetime) -> (ServiceCollection, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let mut services = ServiceCollection::new();
    services.add::<Session>(lifetime, move |_| {
        let number = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Session { number }))
    });
    (services, created)
}

// ─────────────────────────────────────────────────────────────────────────
// Lifetimes
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn singleton_is_shared_across_scopes() {
    let (services, created) = numbered(Lifetime::Singleton);
    let container = services.build();

    let first = container.create_scope().resolve::<Session>().unwrap().unwrap();
    let second = container.create_scope().resolve::<Session>().unwrap().unwrap();
    let root = container.resolve::<Session>().unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &root));
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn scoped_is_shared_within_a_scope_only() {
    let (services, created) = numbered(Lifetime::Scoped);
    let container = services.build();

    let scope = container.create_scope();
    let first = scope.resolve::<Session>().unwrap().unwrap();
    let again = scope.resolve::<Session>().unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let other = container.create_scope().resolve::<Session>().unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_ne!(first.number, other.number);
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn transient_is_never_shared() {
    let (services, created) = numbered(Lifetime::Transient);
    let container = services.build();
    let scope = container.create_scope();

    let first = scope.resolve::<Session>().unwrap().unwrap();
    let second = scope.resolve::<Session>().unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn contract_registration_resolves_as_trait_object() {
    let mut services = ServiceCollection::new();
    services.add_instance::<dyn Greeting>(Arc::new(English));
    let container = services.build();

    let greeting = container
        .resolve::<dyn Greeting>()
        .expect("resolution should succeed")
        .expect("contract is registered");
    assert_eq!(greeting.greet(), "hello");
    assert!(container.resolve::<English>().unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn factory_error_names_the_key() {
    let mut services = ServiceCollection::new();
    services.add::<Session>(Lifetime::Transient, |_| {
        Err::<Arc<Session>, BoxError>("database offline".into())
    });
    let container = services.build();

    let err = container
        .resolve::<Session>()
        .err()
        .expect("factory failure should propagate");
    match err {
        ContainerError::Factory { key, source } => {
            assert_eq!(key, TypeKey::of::<Session>());
            assert_eq!(source.to_string(), "database offline");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reentrant_factory_is_reported_as_cyclic() {
    let mut services = ServiceCollection::new();
    services.add::<Session>(Lifetime::Transient, |resolver: &dyn Resolver| {
        let inner = resolver.resolve::<Session>()?;
        inner.ok_or_else(|| BoxError::from("unreachable"))
    });
    let container = services.build();

    let err = container
        .resolve::<Session>()
        .err()
        .expect("self-dependency should fail");
    let ContainerError::Factory { source, .. } = err else {
        panic!("outer failure should be the factory error");
    };
    let inner = source
        .downcast_ref::<ContainerError>()
        .expect("inner error should be a container error");
    assert!(matches!(inner, ContainerError::Cyclic { path } if path.len() == 2));
}

#[test]
fn unexpected_instance_is_reported() {
    use interpose_container::{FactoryRegistry, Instance, factory_fn};

    let mut services = ServiceCollection::new();
    services.register_factory(
        TypeKey::of::<Session>(),
        Lifetime::Transient,
        factory_fn(|_| Ok(Instance::new(Arc::new(English)))),
    );
    let container = services.build();

    let err = container
        .resolve::<Session>()
        .err()
        .expect("mismatched instance should fail");
    assert!(matches!(err, ContainerError::UnexpectedInstance { .. }));
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scoped_identity_holds_for_any_scope_count(scopes in 1usize..12, lookups in 1usize..6) {
            let (services, created) = numbered(Lifetime::Scoped);
            let container = services.build();

            let mut firsts = Vec::new();
            for _ in 0..scopes {
                let scope = container.create_scope();
                let first = scope.resolve::<Session>().unwrap().unwrap();
                for _ in 0..lookups {
                    let again = scope.resolve::<Session>().unwrap().unwrap();
                    prop_assert!(Arc::ptr_eq(&first, &again));
                }
                firsts.push(first);
            }

            prop_assert_eq!(created.load(Ordering::SeqCst), scopes);
            for (index, first) in firsts.iter().enumerate() {
                prop_assert_eq!(first.number, index);
            }
        }
    }
}
