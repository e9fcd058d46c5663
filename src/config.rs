//! Discovery configuration.
//!
//! The discovery client never memoizes its policy: both accessors of
//! [`DiscoveryProperties`] are consulted on every query, so a configuration
//! backed by something mutable (or shared behind an [`Arc`]) takes effect on
//! the next lookup.

use std::env;
use std::sync::Arc;

/// Environment variable holding the default namespace.
pub const NAMESPACE_ENV: &str = "DISCOVERY_NAMESPACE";

/// Environment variable enabling discovery across all namespaces.
pub const ALL_NAMESPACES_ENV: &str = "DISCOVERY_ALL_NAMESPACES";

/// Environment variable enabling fallback to not-ready addresses.
pub const INCLUDE_NOT_READY_ADDRESSES_ENV: &str = "DISCOVERY_INCLUDE_NOT_READY_ADDRESSES";

/// Policy accessors consulted by the discovery client on every query.
pub trait DiscoveryProperties: Send + Sync {
    /// Whether queries span every namespace in the cache.
    fn is_all_namespaces(&self) -> bool;

    /// Whether not-ready addresses may be used when a subset has no ready ones.
    fn includes_not_ready_addresses(&self) -> bool;
}

impl<P: DiscoveryProperties + ?Sized> DiscoveryProperties for Arc<P> {
    fn is_all_namespaces(&self) -> bool {
        (**self).is_all_namespaces()
    }

    fn includes_not_ready_addresses(&self) -> bool {
        (**self).includes_not_ready_addresses()
    }
}

/// The set of namespaces a single query looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoveryScope {
    /// Only objects in the named namespace.
    Namespace(String),
    /// Objects in every namespace.
    AllNamespaces,
}

impl DiscoveryScope {
    /// Returns `true` if an object in `namespace` falls within this scope.
    #[must_use]
    pub fn matches(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Namespace(ns) => namespace == Some(ns.as_str()),
            Self::AllNamespaces => true,
        }
    }
}

/// Configuration for Kubernetes service discovery.
#[derive(Clone, Debug, Default)]
pub struct DiscoveryConfig {
    /// The namespace queries are scoped to.
    /// If `None`, uses the current namespace from the kube client.
    pub namespace: Option<String>,

    /// Query every namespace instead of just [`DiscoveryConfig::namespace`].
    pub all_namespaces: bool,

    /// Fall back to not-ready addresses for subsets without ready ones.
    pub include_not_ready_addresses: bool,
}

impl DiscoveryConfig {
    /// Creates a configuration scoped to the kube client's current namespace
    /// that only resolves ready addresses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from `DISCOVERY_*` environment variables.
    ///
    /// Unset variables keep their defaults; boolean variables accept
    /// `true`/`false`/`1`/`0` in any case.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        if let Some(ns) = lookup(NAMESPACE_ENV).filter(|ns| !ns.is_empty()) {
            config.namespace = Some(ns);
        }

        config.all_namespaces = lookup(ALL_NAMESPACES_ENV)
            .and_then(|value| parse_flag(ALL_NAMESPACES_ENV, &value))
            .unwrap_or(config.all_namespaces);

        config.include_not_ready_addresses = lookup(INCLUDE_NOT_READY_ADDRESSES_ENV)
            .and_then(|value| parse_flag(INCLUDE_NOT_READY_ADDRESSES_ENV, &value))
            .unwrap_or(config.include_not_ready_addresses);

        config
    }

    /// Sets an explicit namespace for queries.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Enables or disables discovery across all namespaces.
    #[must_use]
    pub fn all_namespaces(mut self, enabled: bool) -> Self {
        self.all_namespaces = enabled;
        self
    }

    /// Enables or disables the not-ready address fallback.
    #[must_use]
    pub fn include_not_ready_addresses(mut self, enabled: bool) -> Self {
        self.include_not_ready_addresses = enabled;
        self
    }
}

impl DiscoveryProperties for DiscoveryConfig {
    fn is_all_namespaces(&self) -> bool {
        self.all_namespaces
    }

    fn includes_not_ready_addresses(&self) -> bool {
        self.include_not_ready_addresses
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            tracing::warn!("ignoring invalid boolean {value:?} for {key}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        move |key| vars.get(key).cloned()
    }

    #[test]
    fn config_new_defaults() {
        let config = DiscoveryConfig::new();

        assert!(config.namespace.is_none());
        assert!(!config.is_all_namespaces());
        assert!(!config.includes_not_ready_addresses());
    }

    #[test]
    fn config_builder_sets_fields() {
        let config = DiscoveryConfig::new()
            .namespace("my-namespace")
            .all_namespaces(true)
            .include_not_ready_addresses(true);

        assert_eq!(config.namespace, Some("my-namespace".to_string()));
        assert!(config.is_all_namespaces());
        assert!(config.includes_not_ready_addresses());
    }

    #[test]
    fn config_through_arc() {
        let config = Arc::new(DiscoveryConfig::new().all_namespaces(true));

        assert!(config.is_all_namespaces());
        assert!(!DiscoveryProperties::includes_not_ready_addresses(&config));
    }

    #[test]
    fn from_lookup_empty_keeps_defaults() {
        let config = DiscoveryConfig::from_lookup(lookup_in(&[]));

        assert!(config.namespace.is_none());
        assert!(!config.all_namespaces);
        assert!(!config.include_not_ready_addresses);
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = DiscoveryConfig::from_lookup(lookup_in(&[
            (NAMESPACE_ENV, "namespace1"),
            (ALL_NAMESPACES_ENV, "TRUE"),
            (INCLUDE_NOT_READY_ADDRESSES_ENV, "1"),
        ]));

        assert_eq!(config.namespace, Some("namespace1".to_string()));
        assert!(config.all_namespaces);
        assert!(config.include_not_ready_addresses);
    }

    #[test]
    fn from_lookup_ignores_invalid_flags() {
        let config = DiscoveryConfig::from_lookup(lookup_in(&[
            (NAMESPACE_ENV, ""),
            (ALL_NAMESPACES_ENV, "yes please"),
            (INCLUDE_NOT_READY_ADDRESSES_ENV, " false "),
        ]));

        assert!(config.namespace.is_none());
        assert!(!config.all_namespaces);
        assert!(!config.include_not_ready_addresses);
    }

    #[test]
    fn scope_matches_namespace() {
        let scope = DiscoveryScope::Namespace("namespace1".to_string());

        assert!(scope.matches(Some("namespace1")));
        assert!(!scope.matches(Some("namespace2")));
        assert!(!scope.matches(None));
    }

    #[test]
    fn scope_all_namespaces_matches_everything() {
        let scope = DiscoveryScope::AllNamespaces;

        assert!(scope.matches(Some("namespace1")));
        assert!(scope.matches(None));
    }
}
