//! Integration tests for marker discovery and registration.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use interpose_container::{
    ConstructionError, ConstructorResolver, Constructors, Lifetime, ResolverExt,
    ServiceCollection, TypeKey,
};
use interpose_discovery::{
    Component, ContractBinding, DiscoveryConfig, DiscoveryRegistrar, Exported, intercept,
};
use interpose_proxy::{
    BoxError, Failure, Injectable, Interceptor, MethodDescriptor, ResolveProxy, Value, contract,
    interceptor,
};

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

static CALLS: AtomicUsize = AtomicUsize::new(0);

#[contract]
pub trait Calculator: Send + Sync {
    fn add(&self, a: i32, b: i32) -> i32;
}

#[contract]
pub trait Describe: Send + Sync {
    fn describe(&self) -> String;
}

#[derive(Injectable)]
struct Counting;

#[interceptor]
impl Interceptor for Counting {
    fn after_call(&self, _: &MethodDescriptor, _: Option<&Value>) -> Result<(), BoxError> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
        None
    }
}

/// Not an interceptor: markers naming it are ignored.
#[derive(Injectable)]
struct Bystander;

#[derive(Injectable)]
#[intercept(with = Counting, lifetime = Scoped, implements(dyn Calculator, dyn Describe))]
struct Basic;

impl Calculator for Basic {
    fn add(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

impl Describe for Basic {
    fn describe(&self) -> String {
        "basic".to_string()
    }
}

#[derive(Injectable)]
#[intercept(with = Bystander, lifetime = Singleton)]
struct Ignored;

#[derive(Injectable)]
#[intercept(with = Counting, lifetime = Transient)]
#[intercept(with = Bystander, lifetime = Scoped)]
struct Meter {
    #[inject(default)]
    reading: AtomicUsize,
}

#[contract]
impl Meter {
    pub fn read(&self) -> usize {
        self.reading.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Injectable)]
struct Register {
    calculator: Arc<dyn Calculator>,
}

fn component() -> Component {
    Component::new("calculators")
        .with::<Basic>()
        .with::<Ignored>()
        .with::<Meter>()
}

// ─────────────────────────────────────────────────────────────────────
// 1. Discovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn first_interface_becomes_the_contract() {
    let bindings = DiscoveryRegistrar::linked().discover(&[Component::new("one").with::<Basic>()]);

    assert_eq!(
        bindings,
        [ContractBinding {
            contract: TypeKey::of::<dyn Calculator>(),
            proxy: TypeKey::of::<CalculatorProxy>(),
            implementation: TypeKey::of::<Basic>(),
            interceptor: TypeKey::of::<Counting>(),
            lifetime: Lifetime::Scoped,
        }]
    );
}

#[test]
fn markers_naming_non_interceptors_are_ignored() {
    let bindings = DiscoveryRegistrar::linked().discover(&[component()]);

    assert_eq!(bindings.len(), 2);
    assert!(
        bindings
            .iter()
            .all(|binding| binding.interceptor == TypeKey::of::<Counting>())
    );
}

#[test]
fn repeated_markers_are_collected_into_one_export() {
    let exported = Meter::exported();
    assert_eq!(exported.name(), "Meter");
    assert_eq!(exported.markers().len(), 2);
    assert_eq!(exported.contract(), TypeKey::of::<Meter>());
}

#[test]
fn excluded_components_are_skipped() {
    let registrar = DiscoveryRegistrar::linked()
        .with_config(DiscoveryConfig::new().with_excluded("calc"));
    assert!(registrar.discover(&[component()]).is_empty());
}

#[test]
fn linked_components_group_by_crate() {
    let components = Component::linked();
    let ours = components
        .iter()
        .find(|component| component.types().iter().any(|exported| exported.name() == "Basic"))
        .expect("marked types are linked");

    assert_eq!(ours.name(), Basic::exported().crate_name());
    assert_eq!(ours.types().len(), 3);
}

// ─────────────────────────────────────────────────────────────────────
// 2. Registration
// ─────────────────────────────────────────────────────────────────────

#[test]
fn registers_one_factory_under_the_contract() {
    let mut services = ServiceCollection::new();
    DiscoveryRegistrar::linked()
        .discover_and_register(&[Component::new("one").with::<Basic>()], &mut services);

    assert_eq!(services.len(), 1);
    let registration = services
        .get(TypeKey::of::<CalculatorProxy>())
        .expect("registered under the first interface's proxy");
    assert_eq!(registration.lifetime(), Lifetime::Scoped);
    assert!(!services.contains(TypeKey::of::<dyn Calculator>()));
    assert!(!services.contains(TypeKey::of::<DescribeProxy>()));
    assert!(!services.contains(TypeKey::of::<Basic>()));
}

#[test]
fn scoped_registration_shares_within_a_scope() {
    let mut services = ServiceCollection::new();
    DiscoveryRegistrar::linked().discover_and_register(&[component()], &mut services);
    let container = services.build();

    let scope = container.create_scope();
    let first = scope.resolve_proxy::<dyn Calculator>().unwrap().unwrap();
    let second = scope.resolve_proxy::<dyn Calculator>().unwrap().unwrap();
    let other = container
        .create_scope()
        .resolve_proxy::<dyn Calculator>()
        .unwrap()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn registered_proxies_run_the_interceptor() {
    let mut services = ServiceCollection::new();
    DiscoveryRegistrar::linked().discover_and_register(&[component()], &mut services);
    let container = services.build();

    let before = CALLS.load(Ordering::SeqCst);
    let calculator = container
        .create_scope()
        .resolve_proxy::<dyn Calculator>()
        .unwrap()
        .unwrap();
    assert!(calculator.add(2, 3).is_none());
    assert!(CALLS.load(Ordering::SeqCst) > before);
}

#[test]
fn transient_registration_is_fresh_each_time() {
    let mut services = ServiceCollection::new();
    DiscoveryRegistrar::linked().discover_and_register(&[component()], &mut services);
    let container = services.build();

    let first = container.resolve_proxy::<Meter>().unwrap().unwrap();
    let second = container.resolve_proxy::<Meter>().unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn rediscovery_replaces_earlier_registrations() {
    let registrar = DiscoveryRegistrar::linked();
    let mut services = ServiceCollection::new();
    registrar.discover_and_register(&[component()], &mut services);
    registrar.discover_and_register(&[component()], &mut services);

    assert_eq!(services.len(), 2);
}

#[test]
fn contract_key_stays_free_for_plain_registrations() {
    let mut services = ServiceCollection::new();
    DiscoveryRegistrar::linked().discover_and_register(&[component()], &mut services);
    let container = services.build();

    assert!(matches!(container.resolve::<dyn Calculator>(), Ok(None)));

    let constructors = Constructors::linked();
    let err = ConstructorResolver::new(&container, &constructors)
        .construct::<Register>()
        .err()
        .expect("dyn Calculator is not registered");
    assert!(matches!(err, ConstructionError::NoConstructor { .. }));
}

#[test]
fn proxies_and_raw_contracts_coexist() {
    let mut services = ServiceCollection::new();
    let raw: Arc<dyn Calculator> = Arc::new(Basic);
    services.add_instance(raw);
    DiscoveryRegistrar::linked().discover_and_register(&[component()], &mut services);
    let container = services.build();

    let plain = container
        .resolve::<dyn Calculator>()
        .expect("instance resolves")
        .expect("instance is registered");
    assert_eq!(plain.add(2, 3), 5);

    let constructors = Constructors::linked();
    let register = ConstructorResolver::new(&container, &constructors)
        .construct::<Register>()
        .expect("dyn Calculator resolves from the container");
    assert_eq!(register.calculator.add(1, 1), 2);

    let proxy = container
        .create_scope()
        .resolve_proxy::<dyn Calculator>()
        .expect("factory succeeds")
        .expect("proxy is registered");
    assert!(proxy.add(2, 3).is_none());
}
