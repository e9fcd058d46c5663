//! Service catalog enumeration.

use k8s_openapi::api::core::v1::Service;

use crate::DiscoveryScope;
use crate::lister::Lister;

/// Returns the name of every cached `Service` within `scope`.
///
/// Names are not deduplicated: the same service name in two namespaces yields
/// two entries under [`DiscoveryScope::AllNamespaces`].
pub(crate) fn service_names<S>(services: &S, scope: &DiscoveryScope) -> Vec<String>
where
    S: Lister<Service> + ?Sized,
{
    let records = match scope {
        DiscoveryScope::Namespace(ns) => services.list_namespaced(ns),
        DiscoveryScope::AllNamespaces => services.list(),
    };

    records
        .iter()
        .filter_map(|svc| svc.metadata.name.clone())
        .collect()
}
