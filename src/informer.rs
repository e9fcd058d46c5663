//! Reflector-backed caches for `Service` and `Endpoints` objects.
//!
//! Each cache is fed by its own background watch task. Watch failures are
//! retried with the default backoff; queries keep reading whatever the cache
//! last observed.

use std::fmt::Debug;

use futures::TryStreamExt;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::runtime::WatchStreamExt;
use kube::runtime::reflector::{self, Store};
use kube::runtime::watcher::{self, Config as WatcherConfig};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

use crate::{DiscoveryClient, DiscoveryConfig, DiscoveryProperties};

/// Error type for informer startup failures.
type Error = Box<dyn std::error::Error + Send + Sync>;

/// Result type for informer operations.
type Result<T> = std::result::Result<T, Error>;

/// The pair of caches a [`DiscoveryClient`] reads from.
#[derive(Clone, Debug)]
pub struct Informers {
    /// Cache of `Service` objects.
    pub services: Store<Service>,

    /// Cache of `Endpoints` objects.
    pub endpoints: Store<Endpoints>,
}

impl Informers {
    /// Starts watching `Service` and `Endpoints` objects.
    ///
    /// Watches are limited to `namespace` when given and span the whole
    /// cluster otherwise. Must be called from within a tokio runtime.
    ///
    /// # Requirements
    ///
    /// - The application must have RBAC permissions to list and watch
    ///   `Service` and `Endpoints` resources in the watched namespace(s)
    #[must_use]
    pub fn spawn(client: Client, namespace: Option<&str>) -> Self {
        Self {
            services: spawn_reflector(api(client.clone(), namespace)),
            endpoints: spawn_reflector(api(client, namespace)),
        }
    }

    /// Waits until both caches have completed their initial listing.
    ///
    /// # Errors
    ///
    /// Fails if a watch task ends before its cache became ready.
    pub async fn wait_until_ready(&self) -> Result<()> {
        self.services.wait_until_ready().await?;
        self.endpoints.wait_until_ready().await?;
        Ok(())
    }

    /// Builds a discovery client reading from these caches.
    #[must_use]
    pub fn into_client<P: DiscoveryProperties>(
        self,
        namespace: impl Into<String>,
        properties: P,
    ) -> DiscoveryClient<Store<Service>, Store<Endpoints>, P> {
        DiscoveryClient::new(namespace, self.services, self.endpoints, properties)
    }
}

impl DiscoveryClient<Store<Service>, Store<Endpoints>, DiscoveryConfig> {
    /// Connects to the cluster, starts the informers and waits for their
    /// initial sync.
    ///
    /// Caches span the whole cluster when `config.all_namespaces` is set and
    /// the configured (or current) namespace otherwise.
    ///
    /// # Errors
    ///
    /// Fails if no Kubernetes client configuration is available or if the
    /// informers stop before their initial sync.
    pub async fn try_default(config: DiscoveryConfig) -> Result<Self> {
        let client = Client::try_default().await?;
        let namespace = config
            .namespace
            .clone()
            .unwrap_or_else(|| client.default_namespace().to_string());

        let watched = (!config.all_namespaces).then_some(namespace.as_str());
        let informers = Informers::spawn(client, watched);

        tracing::debug!(
            "Waiting for Kubernetes informers in {}",
            watched.unwrap_or("all namespaces")
        );

        informers.wait_until_ready().await?;
        Ok(informers.into_client(namespace, config))
    }
}

fn api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Spawns a background task that mirrors `api` into a new store.
fn spawn_reflector<K>(api: Api<K>) -> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (store, writer) = reflector::store();
    let kind = K::kind(&()).into_owned();

    tokio::spawn(async move {
        let stream = watcher::watcher(api, WatcherConfig::default())
            .default_backoff()
            .reflect(writer);
        tokio::pin!(stream);

        tracing::debug!("Starting Kubernetes {kind} watch");

        loop {
            match stream.try_next().await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => tracing::warn!("Kubernetes {kind} watcher error: {e}"),
            }
        }

        tracing::error!("Kubernetes {kind} watch ended");
    });

    store
}
