//! Projection of `Endpoints` records into service instances.
//!
//! # How It Works
//!
//! 1. Finds the `Endpoints` record(s) named after the service within the scope
//! 2. Reads the readiness policy once per matching record
//! 3. Picks each subset's address pool: ready addresses, or not-ready ones
//!    only when the policy allows it and the subset has no ready addresses
//! 4. Emits one [`ServiceInstance`] per address and port of the subset

use std::sync::Arc;

use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset, Endpoints};

use crate::lister::Lister;
use crate::{DiscoveryProperties, DiscoveryScope, ServiceInstance};

/// Resolves the instances of `service_name` within `scope`.
pub(crate) fn project<E, P>(
    endpoints: &E,
    properties: &P,
    scope: &DiscoveryScope,
    service_name: &str,
) -> Vec<ServiceInstance>
where
    E: Lister<Endpoints> + ?Sized,
    P: DiscoveryProperties + ?Sized,
{
    let records: Vec<Arc<Endpoints>> = match scope {
        DiscoveryScope::Namespace(ns) => endpoints.get(ns, service_name).into_iter().collect(),
        DiscoveryScope::AllNamespaces => endpoints
            .list()
            .into_iter()
            .filter(|ep| ep.metadata.name.as_deref() == Some(service_name))
            .collect(),
    };

    let mut instances = Vec::new();
    for record in &records {
        let include_not_ready = properties.includes_not_ready_addresses();
        for subset in record.subsets.iter().flatten() {
            project_subset(subset, include_not_ready, service_name, &mut instances);
        }
    }

    instances
}

/// Selects the addresses a subset contributes under the readiness policy.
fn address_pool(subset: &EndpointSubset, include_not_ready: bool) -> &[EndpointAddress] {
    let ready = subset.addresses.as_deref().unwrap_or_default();
    if ready.is_empty() && include_not_ready {
        subset.not_ready_addresses.as_deref().unwrap_or_default()
    } else {
        ready
    }
}

fn project_subset(
    subset: &EndpointSubset,
    include_not_ready: bool,
    service_name: &str,
    instances: &mut Vec<ServiceInstance>,
) {
    let ports: Vec<u16> = subset
        .ports
        .iter()
        .flatten()
        .filter_map(|p| match u16::try_from(p.port) {
            Ok(port) if port != 0 => Some(port),
            _ => {
                tracing::debug!("skipping invalid port {} for {service_name}", p.port);
                None
            }
        })
        .collect();

    for addr in address_pool(subset, include_not_ready) {
        for port in &ports {
            instances.push(ServiceInstance::new(service_name, addr.ip.clone(), *port));
        }
    }
}
