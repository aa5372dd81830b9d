//! Integration tests for `ProxyFactory` and container registration.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use interpose_container::{
    ConstructionError, EmptyResolver, Instance, Lifetime, ResolverExt, ServiceCollection, TypeKey,
};
use interpose_proxy::{
    Failure, Injectable, Intercepted, InterceptedRegistry, Interceptor, InvalidContractError,
    MethodDescriptor, ProxyError, ProxyFactory, ProxyRequest, ResolveProxy, TypeRegistry, Value,
    contract, erase_arguments, implements, interceptor,
};

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

#[contract]
pub trait Greeter: Send + Sync {
    fn greet(&self, name: String) -> String;
}

#[contract]
pub trait Farewell: Send + Sync {
    fn bye(&self) -> String;
}

struct Prefix(&'static str);

#[derive(Injectable)]
#[implements(dyn Greeter, dyn Farewell)]
struct Polite {
    prefix: Arc<Prefix>,
}

impl Greeter for Polite {
    fn greet(&self, name: String) -> String {
        format!("{} {name}", self.prefix.0)
    }
}

impl Farewell for Polite {
    fn bye(&self) -> String {
        format!("{} bye", self.prefix.0)
    }
}

/// Counts calls and answers every failure with `"sorry"`.
#[derive(Injectable)]
struct Counting {
    #[inject(default)]
    calls: AtomicUsize,
}

#[interceptor]
impl Interceptor for Counting {
    fn after_call(
        &self,
        _: &MethodDescriptor,
        _: Option<&Value>,
    ) -> Result<(), interpose_proxy::BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_exception(&self, _: Failure, _: &MethodDescriptor) -> Option<Value> {
        Some(Value::new("sorry"))
    }
}

#[derive(Injectable)]
struct Tally {
    #[inject(default)]
    count: AtomicUsize,
}

#[contract]
impl Tally {
    pub fn bump(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Not registered as an interceptor.
#[derive(Injectable)]
struct Plain;

#[derive(Injectable)]
struct Front {
    greeter: Intercepted<dyn Greeter>,
}

fn prefixed(prefix: &'static str) -> interpose_container::Container {
    let mut services = ServiceCollection::new();
    services.add_instance(Arc::new(Prefix(prefix)));
    services.build()
}

// ─────────────────────────────────────────────────────────────────────
// 1. Typed creation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn create_resolves_target_dependencies_from_container() {
    let container = prefixed("hello");
    let factory = ProxyFactory::linked();

    let greeter = factory
        .create::<dyn Greeter, Polite, Counting>(&container)
        .expect("prefix is registered");
    assert!(greeter.greet("ada".to_string()).is_none());
}

#[test]
fn create_reports_missing_dependencies() {
    let err = ProxyFactory::linked()
        .create::<dyn Greeter, Polite, Counting>(&EmptyResolver)
        .err()
        .expect("prefix is not registered");

    assert!(matches!(
        err,
        ProxyError::Construction(ConstructionError::NoConstructor { .. })
    ));
}

#[test]
fn create_for_uses_the_type_as_its_own_contract() {
    let tally = ProxyFactory::linked()
        .create_for::<Tally, Counting>(&EmptyResolver)
        .expect("tally has no dependencies");

    assert!(tally.bump().is_none());
    assert!(tally.bump().is_none());
}

#[test]
fn create_with_arguments_bypasses_resolution() {
    let greeter = ProxyFactory::linked().create_with_arguments::<dyn Greeter, Polite, Counting>(
        (Arc::new(Prefix("hi")),),
        (),
    );
    assert!(greeter.greet("grace".to_string()).is_none());
}

#[test]
fn create_with_interceptor_accepts_a_prebuilt_interceptor() {
    let counting = Arc::new(Counting {
        calls: AtomicUsize::new(0),
    });
    let interceptor: Arc<dyn Interceptor> = counting.clone();
    let greeter = ProxyFactory::linked()
        .create_with_interceptor::<dyn Greeter, Polite>(Some(interceptor), &prefixed("hey"))
        .expect("prefix is registered");

    greeter.greet("alan".to_string());
    greeter.greet("edsger".to_string());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn wrap_binds_an_existing_target() {
    let target: Arc<dyn Greeter> = Arc::new(Polite {
        prefix: Arc::new(Prefix("yo")),
    });
    let greeter = ProxyFactory::linked().wrap::<dyn Greeter>(target, None);
    assert!(greeter.greet("barbara".to_string()).is_none());
}

// ─────────────────────────────────────────────────────────────────────
// 2. By-key creation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn create_by_key_returns_the_contract_proxy() {
    let request = ProxyRequest::new(
        TypeKey::of::<dyn Greeter>(),
        TypeKey::of::<Polite>(),
        TypeKey::of::<Counting>(),
    );
    let proxy = ProxyFactory::linked()
        .create_by_key(&request, &prefixed("hello"))
        .expect("request is valid");

    let greeter = proxy.downcast::<GreeterProxy>().expect("greeter proxy");
    assert!(greeter.greet("ada".to_string()).is_none());
}

#[test]
fn create_by_key_accepts_explicit_arguments() {
    let request = ProxyRequest::for_implementation(TypeKey::of::<Tally>(), TypeKey::of::<Counting>())
        .with_target_arguments(erase_arguments(()))
        .with_interceptor_arguments(Vec::new());
    let proxy = ProxyFactory::linked()
        .create_by_key(&request, &EmptyResolver)
        .expect("request is valid");
    assert!(proxy.is::<TallyProxy>());
}

#[test]
fn create_by_key_rejects_unknown_contracts() {
    let request = ProxyRequest::new(
        TypeKey::of::<Plain>(),
        TypeKey::of::<Plain>(),
        TypeKey::of::<Counting>(),
    );
    let err = ProxyFactory::linked()
        .create_by_key(&request, &EmptyResolver)
        .expect_err("Plain has no #[contract]");
    assert!(matches!(
        err,
        ProxyError::InvalidContract(InvalidContractError::NoBackend { .. })
    ));
}

#[test]
fn create_by_key_rejects_unrelated_implementations() {
    let request = ProxyRequest::new(
        TypeKey::of::<dyn Greeter>(),
        TypeKey::of::<Tally>(),
        TypeKey::of::<Counting>(),
    );
    let err = ProxyFactory::linked()
        .create_by_key(&request, &EmptyResolver)
        .expect_err("Tally does not implement Greeter");
    assert!(matches!(
        err,
        ProxyError::InvalidContract(InvalidContractError::NotImplemented { .. })
    ));
}

#[test]
fn create_by_key_rejects_non_interceptors() {
    let request = ProxyRequest::for_implementation(TypeKey::of::<Tally>(), TypeKey::of::<Plain>());
    let err = ProxyFactory::linked()
        .create_by_key(&request, &EmptyResolver)
        .expect_err("Plain is not an interceptor");
    assert!(matches!(
        err,
        ProxyError::InvalidContract(InvalidContractError::NotAnInterceptor { .. })
    ));
}

#[test]
fn empty_registry_knows_nothing() {
    let factory = ProxyFactory::new(TypeRegistry::new());
    let request = ProxyRequest::for_implementation(TypeKey::of::<Tally>(), TypeKey::of::<Counting>());
    assert!(factory.create_by_key(&request, &EmptyResolver).is_err());
    assert!(!factory.registry().is_contract(TypeKey::of::<Tally>()));
}

#[test]
fn linked_registry_knows_generated_entries() {
    let registry = TypeRegistry::linked();
    assert!(registry.is_contract(TypeKey::of::<dyn Greeter>()));
    assert!(registry.implements(TypeKey::of::<Polite>(), TypeKey::of::<dyn Greeter>()));
    assert!(registry.is_interceptor(TypeKey::of::<Counting>()));
    assert!(!registry.is_interceptor(TypeKey::of::<Plain>()));

    let polite = Instance::new(Arc::new(Polite {
        prefix: Arc::new(Prefix("x")),
    }));
    let upcast = registry
        .upcast_instance(&polite, TypeKey::of::<dyn Greeter>())
        .expect("upcast is registered");
    assert!(upcast.downcast::<dyn Greeter>().is_some());
}

#[test]
fn contracts_of_lists_every_contract_in_name_order() {
    let registry = TypeRegistry::linked();
    let contracts = registry.contracts_of(TypeKey::of::<Polite>());

    assert_eq!(
        contracts,
        [TypeKey::of::<dyn Farewell>(), TypeKey::of::<dyn Greeter>()]
    );
    for _ in 0..4 {
        assert_eq!(TypeRegistry::linked().contracts_of(TypeKey::of::<Polite>()), contracts);
    }
}

#[test]
fn upcast_instance_rejects_unregistered_pairs() {
    let tally = Instance::new(Arc::new(Tally {
        count: AtomicUsize::new(0),
    }));
    let err = TypeRegistry::linked()
        .upcast_instance(&tally, TypeKey::of::<dyn Greeter>())
        .err()
        .expect("Tally does not implement Greeter");
    assert!(matches!(err, InvalidContractError::NotImplemented { .. }));
}

#[test]
fn create_by_key_works_for_a_second_contract() {
    let request = ProxyRequest::new(
        TypeKey::of::<dyn Farewell>(),
        TypeKey::of::<Polite>(),
        TypeKey::of::<Counting>(),
    );
    let proxy = ProxyFactory::linked()
        .create_by_key(&request, &prefixed("ciao"))
        .expect("Polite implements Farewell");
    assert!(proxy.is::<FarewellProxy>());
}

// ─────────────────────────────────────────────────────────────────────
// 3. Container registration
// ─────────────────────────────────────────────────────────────────────

#[test]
fn scoped_proxies_are_shared_within_a_scope() {
    let factory = Arc::new(ProxyFactory::linked());
    let mut services = ServiceCollection::new();
    services.add_instance(Arc::new(Prefix("hello")));
    services.add_intercepted::<dyn Greeter, Polite, Counting>(Lifetime::Scoped, &factory);
    let container = services.build();

    let scope = container.create_scope();
    let first = scope.resolve_proxy::<dyn Greeter>().unwrap().unwrap();
    let again = scope.resolve_proxy::<dyn Greeter>().unwrap().unwrap();
    let other = container
        .create_scope()
        .resolve_proxy::<dyn Greeter>()
        .unwrap()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn transient_proxies_are_fresh_each_time() {
    let factory = Arc::new(ProxyFactory::linked());
    let mut services = ServiceCollection::new();
    services.add_intercepted_for::<Tally, Counting>(Lifetime::Transient, &factory);
    let container = services.build();

    let first = container.resolve_proxy::<Tally>().unwrap().unwrap();
    let second = container.resolve_proxy::<Tally>().unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn registered_proxies_are_not_the_raw_type() {
    let factory = Arc::new(ProxyFactory::linked());
    let mut services = ServiceCollection::new();
    services.add_intercepted_for::<Tally, Counting>(Lifetime::Singleton, &factory);
    let container = services.build();

    assert!(matches!(container.resolve::<Tally>(), Ok(None)));
    assert!(matches!(container.resolve::<TallyProxy>(), Ok(Some(_))));
}

#[derive(Injectable)]
struct Direct {
    greeter: Arc<dyn Greeter>,
}

#[test]
fn plain_contract_dependencies_ignore_registered_proxies() {
    let factory = Arc::new(ProxyFactory::linked());
    let mut services = ServiceCollection::new();
    services.add_instance(Arc::new(Prefix("hello")));
    let raw: Arc<dyn Greeter> = Arc::new(Polite {
        prefix: Arc::new(Prefix("raw")),
    });
    services.add_instance(raw);
    services.add_intercepted::<dyn Greeter, Polite, Counting>(Lifetime::Singleton, &factory);
    let container = services.build();

    let resolver = interpose_container::ConstructorResolver::new(
        &container,
        factory.registry().constructors(),
    );
    let direct = resolver.construct::<Direct>().expect("dyn Greeter is registered");
    assert_eq!(direct.greeter.greet("ada".to_string()), "raw ada");

    let front = resolver.construct::<Front>().expect("proxy is registered");
    assert!(front.greeter.greet("ada".to_string()).is_none());
}

#[test]
fn intercepted_dependency_receives_the_registered_proxy() {
    let factory = Arc::new(ProxyFactory::linked());
    let mut services = ServiceCollection::new();
    services.add_instance(Arc::new(Prefix("hello")));
    services.add_intercepted::<dyn Greeter, Polite, Counting>(Lifetime::Singleton, &factory);
    let container = services.build();

    let resolver = interpose_container::ConstructorResolver::new(
        &container,
        factory.registry().constructors(),
    );
    let front = resolver.construct::<Front>().expect("greeter is registered");
    assert!(front.greeter.greet("ada".to_string()).is_none());

    let registered = container.resolve_proxy::<dyn Greeter>().unwrap().unwrap();
    assert!(Arc::ptr_eq(&front.greeter.clone().into_inner(), &registered));
}

#[test]
fn intercepted_dependency_is_never_constructed_on_demand() {
    let factory = ProxyFactory::linked();
    let resolver =
        interpose_container::ConstructorResolver::new(&EmptyResolver, factory.registry().constructors());

    let err = resolver.construct::<Front>().err().expect("nothing registered");
    assert!(matches!(err, ConstructionError::NoConstructor { .. }));
}
