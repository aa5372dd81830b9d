//! Turning interception markers into container registrations.

use std::sync::Arc;

use interpose_container::{FactoryRegistry, Lifetime, TypeKey, factory_fn};
use interpose_proxy::{ProxyFactory, ProxyRequest};

use crate::component::Component;
use crate::config::DiscoveryConfig;

/// One discovered registration: resolve `contract` as a proxy around
/// `implementation`, intercepted by `interceptor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractBinding {
    /// The proxied contract.
    pub contract: TypeKey,
    /// The generated proxy type; the registration key.
    pub proxy: TypeKey,
    /// The marked type.
    pub implementation: TypeKey,
    /// The marker's interceptor.
    pub interceptor: TypeKey,
    /// The marker's lifetime.
    pub lifetime: Lifetime,
}

impl ContractBinding {
    /// The proxy request this binding issues on every resolution.
    #[must_use]
    pub fn request(&self) -> ProxyRequest {
        ProxyRequest::new(self.contract, self.implementation, self.interceptor)
    }
}

/// Scans components for `#[intercept]` markers and registers a proxy
/// factory for each.
///
/// Markers naming a type that is not a registered interceptor are skipped,
/// as are types whose contract has no generated proxy.
/// Running discovery again registers again; the container decides whether
/// the later registration replaces the earlier one.
#[derive(Debug, Clone)]
pub struct DiscoveryRegistrar {
    factory: Arc<ProxyFactory>,
    config: DiscoveryConfig,
}

impl DiscoveryRegistrar {
    /// Creates a registrar that creates proxies with `factory`.
    #[must_use]
    pub fn new(factory: Arc<ProxyFactory>) -> Self {
        Self {
            factory,
            config: DiscoveryConfig::default(),
        }
    }

    /// Creates a registrar over everything contributed at link time.
    #[must_use]
    pub fn linked() -> Self {
        Self::new(Arc::new(ProxyFactory::linked()))
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// The factory used by registered proxies.
    #[must_use]
    pub fn factory(&self) -> &Arc<ProxyFactory> {
        &self.factory
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Collects the bindings declared by `components`, in order.
    #[must_use]
    pub fn discover(&self, components: &[Component]) -> Vec<ContractBinding> {
        let registry = self.factory.registry();
        let mut bindings = Vec::new();

        for component in components {
            if self.config.excludes(component.name()) {
                tracing::debug!(component = component.name(), "component excluded");
                continue;
            }

            for exported in component.types() {
                let implementation = exported.key();
                let contract = exported.contract();
                let Some(proxy) = registry.proxy_of(contract) else {
                    tracing::warn!(
                        component = component.name(),
                        implementation = %implementation,
                        contract = %contract,
                        "marked type skipped, contract has no #[contract] proxy"
                    );
                    continue;
                };

                for marker in exported.markers() {
                    let interceptor = marker.interceptor();
                    if !registry.is_interceptor(interceptor) {
                        tracing::debug!(
                            component = component.name(),
                            implementation = %implementation,
                            interceptor = %interceptor,
                            "marker ignored, not an interceptor"
                        );
                        continue;
                    }

                    bindings.push(ContractBinding {
                        contract,
                        proxy,
                        implementation,
                        interceptor,
                        lifetime: marker.lifetime(),
                    });
                }
            }
        }

        bindings
    }

    /// Discovers bindings and registers a proxy factory for each.
    ///
    /// Returns the registered bindings.
    pub fn discover_and_register<R>(
        &self,
        components: &[Component],
        registry: &mut R,
    ) -> Vec<ContractBinding>
    where
        R: FactoryRegistry + ?Sized,
    {
        let bindings = self.discover(components);

        for binding in &bindings {
            let factory = Arc::clone(&self.factory);
            let request = binding.request();
            registry.register_factory(
                binding.proxy,
                binding.lifetime,
                factory_fn(move |resolver| Ok(factory.create_by_key(&request, resolver)?)),
            );
            tracing::info!(
                contract = %binding.contract,
                proxy = %binding.proxy,
                implementation = %binding.implementation,
                interceptor = %binding.interceptor,
                lifetime = %binding.lifetime,
                "intercepted contract registered"
            );
        }

        bindings
    }
}
