//! The discovery client query surface.

use k8s_openapi::api::core::v1::{Endpoints, Service};

use crate::lister::Lister;
use crate::{DiscoveryProperties, DiscoveryScope, ServiceInstance, catalog, endpoints};

/// Resolves Kubernetes services and their instances from watch-fed caches.
///
/// The client holds no state of its own besides its collaborators: every
/// query reads the current cache contents and the current policy, so results
/// are only as fresh as the caches feeding it.
///
/// # Example
///
/// ```ignore
/// use k8s_informer_discovery::{DiscoveryClient, DiscoveryConfig};
///
/// let config = DiscoveryConfig::new().namespace("my-namespace");
/// let client = DiscoveryClient::try_default(config).await?;
///
/// for instance in client.instances("my-service") {
///     println!("{}", instance.uri());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct DiscoveryClient<S, E, P> {
    namespace: String,
    services: S,
    endpoints: E,
    properties: P,
}

impl<S, E, P> DiscoveryClient<S, E, P>
where
    S: Lister<Service>,
    E: Lister<Endpoints>,
    P: DiscoveryProperties,
{
    /// Human-readable description of this discovery client.
    pub const DESCRIPTION: &'static str = "Kubernetes Informer Discovery Client";

    /// Creates a client over the given caches.
    ///
    /// `namespace` is used for queries whenever `properties` does not ask for
    /// all namespaces.
    #[must_use]
    pub fn new(namespace: impl Into<String>, services: S, endpoints: E, properties: P) -> Self {
        Self {
            namespace: namespace.into(),
            services,
            endpoints,
            properties,
        }
    }

    /// The namespace queries are scoped to unless all namespaces are enabled.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The policy consulted on each query.
    #[must_use]
    pub fn properties(&self) -> &P {
        &self.properties
    }

    /// Returns the name of every known service in scope.
    ///
    /// A name is listed once per `Service` object, so the same name in two
    /// namespaces appears twice when all namespaces are enabled.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        let scope = self.scope();
        let names = catalog::service_names(&self.services, &scope);
        tracing::debug!("Kubernetes discovery: {} services in {scope:?}", names.len());
        names
    }

    /// Returns the instances currently backing `service_name`.
    ///
    /// An empty result means the service is unknown or has no usable
    /// addresses right now; it is not an error.
    #[must_use]
    pub fn instances(&self, service_name: &str) -> Vec<ServiceInstance> {
        let scope = self.scope();
        if service_name.is_empty() {
            tracing::debug!("ignoring instance lookup for empty service name");
            return Vec::new();
        }

        let instances = endpoints::project(&self.endpoints, &self.properties, &scope, service_name);
        tracing::debug!(
            "Kubernetes discovery: {} instances for {service_name} in {scope:?}",
            instances.len()
        );

        instances
    }

    fn scope(&self) -> DiscoveryScope {
        if self.properties.is_all_namespaces() {
            DiscoveryScope::AllNamespaces
        } else {
            DiscoveryScope::Namespace(self.namespace.clone())
        }
    }
}
