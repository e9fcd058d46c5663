#![deny(missing_docs)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Kubernetes service discovery backed by watch-fed reflector caches.
//!
//! Looking services up by asking the Kubernetes API on every request is slow
//! and puts load on the control plane. This crate instead answers discovery
//! queries synchronously from local `Service` and `Endpoints` caches that are
//! kept current by `kube` reflectors, accepting that the answer may briefly
//! lag behind the cluster.
//!
//! # Features
//!
//! - **Synchronous queries**: [`DiscoveryClient::services`] and
//!   [`DiscoveryClient::instances`] only read local caches
//! - **Namespace scoping**: one namespace or the whole cluster, decided per query
//! - **Readiness policy**: ready addresses, optionally falling back to
//!   not-ready ones for subsets without any ready address
//! - **Pluggable caches**: anything implementing [`Lister`] can back the client;
//!   `kube` reflector stores work out of the box
//! - **Load balancing**: [`balance()`] feeds resolved instances to a Tonic
//!   balance channel
//!
//! # Usage
//!
//! ```ignore
//! use k8s_informer_discovery::{DiscoveryClient, DiscoveryConfig};
//!
//! let config = DiscoveryConfig::new()
//!     .namespace("my-namespace")
//!     .include_not_ready_addresses(true);
//!
//! // Starts Service and Endpoints informers and waits for their initial sync
//! let client = DiscoveryClient::try_default(config).await?;
//!
//! for name in client.services() {
//!     for instance in client.instances(&name) {
//!         println!("{name}: {}", instance.uri());
//!     }
//! }
//! ```

mod balance;
mod catalog;
mod client;
mod config;
mod endpoints;
mod informer;
mod instance;
mod lister;

#[cfg(test)]
mod testing;

pub use balance::{BalanceConfig, DEFAULT_REFRESH_INTERVAL, balance};
pub use client::DiscoveryClient;
pub use config::{
    ALL_NAMESPACES_ENV, DiscoveryConfig, DiscoveryProperties, DiscoveryScope,
    INCLUDE_NOT_READY_ADDRESSES_ENV, NAMESPACE_ENV,
};
pub use informer::Informers;
pub use instance::ServiceInstance;
pub use lister::Lister;
