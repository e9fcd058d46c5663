//! Feeding discovered instances into a Tonic balance channel.
//!
//! # How It Works
//!
//! 1. Periodically resolves the service's instances through a [`DiscoveryClient`]
//! 2. Keeps the instances with an IP host (and the configured port, if any)
//! 3. Diffs them against the addresses sent so far
//! 4. Sends `Change::Insert` or `Change::Remove` events to the provided sender
//!
//! # Example
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tonic::transport::{Channel, Endpoint};
//! use k8s_informer_discovery::{BalanceConfig, DiscoveryClient, DiscoveryConfig, balance};
//!
//! let client = Arc::new(DiscoveryClient::try_default(DiscoveryConfig::new()).await?);
//! let (channel, tx) = Channel::balance_channel::<SocketAddr>(1024);
//!
//! balance(client, BalanceConfig::new("my-grpc-service").port(50051), tx, |addr| {
//!     Endpoint::from_shared(format!("http://{addr}"))
//!         .unwrap()
//!         .connect_timeout(Duration::from_secs(5))
//! });
//!
//! // Use the channel with your gRPC client
//! let client = MyServiceClient::new(channel);
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Endpoints, Service};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, MissedTickBehavior};
use tonic::transport::Endpoint;
use tonic::transport::channel::Change;

use crate::lister::Lister;
use crate::{DiscoveryClient, DiscoveryProperties, ServiceInstance};

/// How often instances are re-resolved unless configured otherwise.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for feeding a balance channel.
#[derive(Clone, Debug)]
pub struct BalanceConfig {
    /// The Kubernetes service name to resolve.
    pub service_name: String,

    /// Only use instances on this port. If `None`, every port is used.
    pub port: Option<u16>,

    /// How often instances are re-resolved.
    pub refresh_interval: Duration,
}

impl BalanceConfig {
    /// Creates a new balance configuration for all ports of a service.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            port: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Restricts the balanced endpoints to one port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets how often instances are re-resolved.
    #[must_use]
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// Starts resolving instances and sends changes to the provided sender.
///
/// This function spawns a background task that re-resolves the configured
/// service on every refresh tick and sends `Change` events to the provided
/// sender. The user is responsible for creating the balance channel and
/// building endpoints. The task stops once the receiving side is dropped.
///
/// # Arguments
///
/// * `client` - Discovery client resolving the service
/// * `config` - Balance configuration specifying the service and port
/// * `tx` - Sender for endpoint changes (from `Channel::balance_channel()`)
/// * `build` - Function to build an `Endpoint` from a `SocketAddr`
pub fn balance<S, E, P, F>(
    client: Arc<DiscoveryClient<S, E, P>>,
    config: BalanceConfig,
    tx: Sender<Change<SocketAddr, Endpoint>>,
    build: F,
) where
    S: Lister<Service> + 'static,
    E: Lister<Endpoints> + 'static,
    P: DiscoveryProperties + 'static,
    F: Fn(SocketAddr) -> Endpoint + Send + 'static,
{
    tokio::spawn(async move {
        balance_loop(&client, &config, &tx, build).await;
    });
}

/// Background task that re-resolves instances and sends endpoint changes.
async fn balance_loop<S, E, P, F>(
    client: &DiscoveryClient<S, E, P>,
    config: &BalanceConfig,
    tx: &Sender<Change<SocketAddr, Endpoint>>,
    build: F,
) where
    S: Lister<Service>,
    E: Lister<Endpoints>,
    P: DiscoveryProperties,
    F: Fn(SocketAddr) -> Endpoint,
{
    let mut known: HashSet<SocketAddr> = HashSet::new();
    let mut ticks = time::interval(config.refresh_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(
        "Starting balance feed for {} on port {:?}",
        config.service_name,
        config.port
    );

    loop {
        ticks.tick().await;

        let instances = client.instances(&config.service_name);
        let actions = reconcile(&instances, &mut known, config.port);

        for action in actions {
            let change = match action {
                EndpointAction::Insert(addr) => Change::Insert(addr, build(addr)),
                EndpointAction::Remove(addr) => Change::Remove(addr),
            };

            if tx.send(change).await.is_err() {
                tracing::warn!("channel closed, stopping balance feed");
                return;
            }
        }

        tracing::debug!(
            "Balance feed: {} endpoints for {}",
            known.len(),
            config.service_name
        );
    }
}

/// Represents an endpoint change action.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EndpointAction {
    Insert(SocketAddr),
    Remove(SocketAddr),
}

/// Diffs the resolved instances against `known` and returns the actions
/// that bring a balance channel up to date.
fn reconcile(
    instances: &[ServiceInstance],
    known: &mut HashSet<SocketAddr>,
    port: Option<u16>,
) -> Vec<EndpointAction> {
    let current = socket_addrs(instances, port);
    let mut actions = Vec::new();

    known.retain(|addr| {
        let keep = current.contains(addr);
        if !keep {
            tracing::debug!("removing endpoint: {addr}");
            actions.push(EndpointAction::Remove(*addr));
        }

        keep
    });

    for addr in current {
        if known.insert(addr) {
            tracing::debug!("adding endpoint: {addr}");
            actions.push(EndpointAction::Insert(addr));
        }
    }

    actions
}

/// Extracts the socket addresses of instances with an IP host.
fn socket_addrs(instances: &[ServiceInstance], port: Option<u16>) -> HashSet<SocketAddr> {
    instances
        .iter()
        .filter(|instance| port.is_none_or(|p| instance.port == p))
        .filter_map(ServiceInstance::socket_addr)
        .collect()
}
