//! Read access to watch-fed object caches.
//!
//! The caches themselves are kept current by reflectors running elsewhere;
//! discovery only ever reads from them.

use std::sync::Arc;

use kube::runtime::reflector::{ObjectRef, Store};
use kube::{Resource, ResourceExt};

/// Typed read accessors over a cache of Kubernetes objects.
pub trait Lister<K>: Send + Sync {
    /// Looks up a single object by namespace and name.
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>>;

    /// Returns every cached object, across all namespaces.
    fn list(&self) -> Vec<Arc<K>>;

    /// Returns the cached objects in one namespace.
    fn list_namespaced(&self, namespace: &str) -> Vec<Arc<K>>;
}

impl<K> Lister<K> for Store<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        Store::get(self, &ObjectRef::new(name).within(namespace))
    }

    fn list(&self) -> Vec<Arc<K>> {
        self.state()
    }

    fn list_namespaced(&self, namespace: &str) -> Vec<Arc<K>> {
        self.state()
            .into_iter()
            .filter(|obj| obj.namespace().as_deref() == Some(namespace))
            .collect()
    }
}
