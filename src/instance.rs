//! The caller-facing service instance model.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

/// A single resolved `host:port` backing a service.
///
/// Instances are built fresh on every query and carry no identity beyond
/// their field values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceInstance {
    /// Cluster identifier of the service, empty when unknown.
    pub service_id: String,

    /// The logical service name the instance was resolved for.
    pub service_name: String,

    /// The endpoint address, usually an IP literal.
    pub host: String,

    /// The endpoint port.
    pub port: u16,

    /// Free-form instance metadata.
    pub metadata: BTreeMap<String, String>,

    /// Whether the endpoint expects TLS.
    pub secure: bool,
}

impl ServiceInstance {
    /// Creates an insecure instance with an unknown service id and no metadata.
    #[must_use]
    pub fn new(service_name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_id: String::new(),
            service_name: service_name.into(),
            host: host.into(),
            port,
            metadata: BTreeMap::new(),
            secure: false,
        }
    }

    /// Returns `"https"` for secure instances and `"http"` otherwise.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// Returns the socket address if the host is an IP literal.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.host
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Returns `scheme://host:port`, bracketing IPv6 hosts.
    #[must_use]
    pub fn uri(&self) -> String {
        match self.socket_addr() {
            Some(addr) => format!("{}://{addr}", self.scheme()),
            None => format!("{}://{}:{}", self.scheme(), self.host, self.port),
        }
    }
}
