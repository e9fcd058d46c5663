//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use k8s_openapi::api::core::v1::{EndpointAddress, EndpointPort, EndpointSubset, Endpoints, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use kube::runtime::reflector::{self, Store};
use kube::runtime::watcher::Event;

use crate::DiscoveryProperties;

// Builds a store the way a reflector would after applying each object
pub(crate) fn store_of<K>(objects: Vec<K>) -> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let (store, mut writer) = reflector::store();
    for obj in objects {
        writer.apply_watcher_event(&Event::Apply(obj));
    }

    store
}

// Like `store_of`, but via an initial listing so the store reports ready
pub(crate) fn ready_store_of<K>(objects: Vec<K>) -> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let (store, mut writer) = reflector::store();
    writer.apply_watcher_event(&Event::Init);
    for obj in objects {
        writer.apply_watcher_event(&Event::InitApply(obj));
    }

    writer.apply_watcher_event(&Event::InitDone);
    store
}

fn make_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

pub(crate) fn make_service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: make_meta(name, namespace),
        ..Default::default()
    }
}

pub(crate) fn make_endpoints(name: &str, namespace: &str, subsets: Vec<EndpointSubset>) -> Endpoints {
    Endpoints {
        metadata: make_meta(name, namespace),
        subsets: Some(subsets),
    }
}

fn make_addresses(ips: &[&str]) -> Option<Vec<EndpointAddress>> {
    if ips.is_empty() {
        return None;
    }

    Some(
        ips.iter()
            .map(|ip| EndpointAddress {
                ip: (*ip).to_string(),
                ..Default::default()
            })
            .collect(),
    )
}

pub(crate) fn make_subset(ready: &[&str], not_ready: &[&str], ports: &[i32]) -> EndpointSubset {
    EndpointSubset {
        addresses: make_addresses(ready),
        not_ready_addresses: make_addresses(not_ready),
        ports: Some(
            ports
                .iter()
                .map(|port| EndpointPort {
                    port: *port,
                    ..Default::default()
                })
                .collect(),
        ),
    }
}

/// Fixed policy that counts how often each accessor is read.
#[derive(Debug, Default)]
pub(crate) struct CountingProperties {
    all_namespaces: bool,
    include_not_ready_addresses: bool,
    scope_reads: AtomicUsize,
    readiness_reads: AtomicUsize,
}

impl CountingProperties {
    pub(crate) fn new(all_namespaces: bool, include_not_ready_addresses: bool) -> Self {
        Self {
            all_namespaces,
            include_not_ready_addresses,
            ..Default::default()
        }
    }

    pub(crate) fn scope_reads(&self) -> usize {
        self.scope_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn readiness_reads(&self) -> usize {
        self.readiness_reads.load(Ordering::SeqCst)
    }
}

impl DiscoveryProperties for CountingProperties {
    fn is_all_namespaces(&self) -> bool {
        self.scope_reads.fetch_add(1, Ordering::SeqCst);
        self.all_namespaces
    }

    fn includes_not_ready_addresses(&self) -> bool {
        self.readiness_reads.fetch_add(1, Ordering::SeqCst);
        self.include_not_ready_addresses
    }
}
