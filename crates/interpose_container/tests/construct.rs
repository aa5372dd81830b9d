//! Tests for constructor resolution.
//!
//! Types here derive `Injectable` and are found through the link-time
//! catalog, so `Constructors::linked()` is exercised end to end.

use core::sync::atomic::AtomicU64;
use std::sync::Arc;

use interpose_container::{
    ConstructionError, ConstructorResolver, Constructors, EmptyResolver, Injectable, Instance,
    Lifetime, ResolverExt, ServiceCollection, TypeKey,
};

// ─────────────────────────────────────────────────────────────────────────
// Test Types
// ─────────────────────────────────────────────────────────────────────────

trait Store: Send + Sync {
    fn name(&self) -> &'static str;
}

struct MemoryStore;

impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Injectable)]
struct Clock;

#[derive(Injectable)]
struct Audit {
    clock: Arc<Clock>,
}

#[derive(Injectable)]
struct Reports {
    store: Arc<dyn Store>,
    audit: Arc<Audit>,
    #[inject(default)]
    generated: AtomicU64,
}

#[derive(Injectable)]
struct Pair(Arc<Clock>, Arc<Audit>);

// Ouroboros depends on itself through Tail.
#[derive(Injectable)]
struct Ouroboros {
    tail: Arc<Tail>,
}

#[derive(Injectable)]
struct Tail {
    head: Arc<Ouroboros>,
}

#[derive(Injectable)]
struct Generic<T: Send + Sync + 'static> {
    inner: Arc<T>,
}

fn with_store() -> interpose_container::Container {
    let mut services = ServiceCollection::new();
    services.add::<dyn Store>(Lifetime::Singleton, |_| Ok(Arc::new(MemoryStore)));
    services.build()
}

// ─────────────────────────────────────────────────────────────────────────
// Argument Resolution
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn parameterless_constructor_yields_empty_arguments() {
    let constructors = Constructors::linked();
    let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);

    let arguments = resolver
        .resolve_arguments_of(TypeKey::of::<Clock>())
        .expect("resolution should succeed")
        .expect("Clock derives Injectable");
    assert!(arguments.is_empty());
}

#[test]
fn arguments_match_parameters_in_order() {
    let container = with_store();
    let constructors = Constructors::linked();
    let resolver = ConstructorResolver::new(&container, &constructors);

    let entry = constructors
        .get(TypeKey::of::<Reports>())
        .expect("Reports should be linked");
    let parameters = entry.parameters();
    assert_eq!(
        parameters,
        vec![TypeKey::of::<dyn Store>(), TypeKey::of::<Audit>()]
    );

    let arguments = resolver
        .resolve_arguments_of(TypeKey::of::<Reports>())
        .expect("resolution should succeed")
        .expect("Reports derives Injectable");
    assert_eq!(arguments.len(), parameters.len());
    for (argument, parameter) in arguments.iter().zip(&parameters) {
        assert_eq!(argument.key(), *parameter);
    }
}

#[test]
fn container_argument_is_preferred_over_construction() {
    let mut services = ServiceCollection::new();
    let clock = Arc::new(Clock);
    services.add_instance(Arc::clone(&clock));
    let container = services.build();
    let constructors = Constructors::linked();

    let audit = ConstructorResolver::new(&container, &constructors)
        .construct::<Audit>()
        .expect("construction should succeed");
    assert!(Arc::ptr_eq(&audit.clock, &clock));
}

#[test]
fn absent_argument_is_constructed_recursively() {
    let container = with_store();
    let constructors = Constructors::linked();

    let reports = ConstructorResolver::new(&container, &constructors)
        .construct::<Reports>()
        .expect("construction should succeed");
    assert_eq!(reports.store.name(), "memory");
    assert_eq!(Arc::strong_count(&reports.audit.clock), 1);
    assert_eq!(
        reports
            .generated
            .load(core::sync::atomic::Ordering::Relaxed),
        0
    );

    // Constructed arguments are not registered back.
    assert!(container.resolve::<Audit>().unwrap().is_none());
}

#[test]
fn tuple_struct_is_constructed() {
    let constructors = Constructors::linked();
    let pair = ConstructorResolver::new(&EmptyResolver, &constructors)
        .construct::<Pair>()
        .expect("construction should succeed");
    assert!(!Arc::ptr_eq(&pair.0, &pair.1.clock));
}

#[test]
fn typed_arguments_match_declaration() {
    let constructors = Constructors::linked();
    let (clock, audit) = ConstructorResolver::new(&EmptyResolver, &constructors)
        .resolve_arguments::<Pair>()
        .expect("resolution should succeed");
    let _: Arc<Clock> = clock;
    let _: Arc<Audit> = audit;
}

// ─────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn missing_contract_has_no_constructor() {
    let constructors = Constructors::linked();
    let err = ConstructorResolver::new(&EmptyResolver, &constructors)
        .construct::<Reports>()
        .err()
        .expect("dyn Store is neither registered nor constructible");
    assert!(matches!(
        err,
        ConstructionError::NoConstructor { type_name } if type_name.contains("Store")
    ));
}

#[test]
fn cycle_is_reported_with_its_path() {
    let constructors = Constructors::linked();
    let err = ConstructorResolver::new(&EmptyResolver, &constructors)
        .construct_of(TypeKey::of::<Ouroboros>())
        .err()
        .expect("cycle should be detected");

    let ConstructionError::Cyclic { path } = err else {
        panic!("expected a cyclic error, got {err}");
    };
    assert_eq!(
        path,
        vec![
            TypeKey::of::<Ouroboros>(),
            TypeKey::of::<Tail>(),
            TypeKey::of::<Ouroboros>(),
        ]
    );
}

#[test]
fn explicit_arguments_must_match_signature() {
    let constructors = Constructors::linked();
    let resolver = ConstructorResolver::new(&EmptyResolver, &constructors);

    let err = resolver
        .construct_with(TypeKey::of::<Pair>(), vec![Instance::new(Arc::new(Clock))])
        .err()
        .expect("one argument is missing");
    assert!(matches!(
        err,
        ConstructionError::SignatureMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));

    let built = resolver
        .construct_with(
            TypeKey::of::<Pair>(),
            vec![
                Instance::new(Arc::new(Clock)),
                Instance::new(Arc::new(Audit {
                    clock: Arc::new(Clock),
                })),
            ],
        )
        .expect("matching arguments should succeed");
    assert!(built.is::<Pair>());
}

#[test]
fn generic_types_are_not_linked_but_can_be_registered() {
    let mut constructors = Constructors::linked();
    assert!(!constructors.contains(TypeKey::of::<Generic<Clock>>()));

    constructors.register::<Generic<Clock>>();
    let generic = ConstructorResolver::new(&EmptyResolver, &constructors)
        .construct::<Generic<Clock>>()
        .expect("registered generic should construct");
    assert_eq!(Arc::strong_count(&generic.inner), 1);
}
