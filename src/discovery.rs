//! Service registry boundary.
//!
//! The core never talks to a discovery protocol itself; it only consumes
//! implementations of the [`Discovery`] trait. [`StaticDiscovery`] covers
//! fixed server lists and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::net::SocketAddr;
use thiserror::Error;

/// Zone label used when a registry has no zone concept.
pub const DEFAULT_ZONE: &str = "default";

/// One registry answer: a concrete address plus its zone label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEndpoint {
    pub address: SocketAddr,
    pub zone: String,
}

impl DiscoveredEndpoint {
    pub fn new(address: SocketAddr, zone: impl Into<String>) -> Self {
        Self {
            address,
            zone: zone.into(),
        }
    }

    /// Endpoint in the default zone.
    pub fn unzoned(address: SocketAddr) -> Self {
        Self::new(address, DEFAULT_ZONE)
    }
}

/// Errors a registry lookup can produce.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The registry does not know this service name. Treated as a
    /// configuration error, not a transient failure.
    #[error("service '{0}' is not registered")]
    UnknownService(String),

    /// The registry could not be reached or answered with an error.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a logical service name to its current set of endpoints.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Return all known endpoints for `service_name`.
    ///
    /// An empty list is a valid answer (the service exists but has no
    /// instances right now); `UnknownService` means the name itself is not
    /// registered.
    async fn lookup(
        &self,
        service_name: &str,
    ) -> Result<Vec<DiscoveredEndpoint>, DiscoveryError>;
}

/// In-memory registry backed by a fixed table.
///
/// Useful for embedding the core against a static server list and as the
/// registry stub in tests.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    services: DashMap<String, Vec<DiscoveredEndpoint>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the endpoint list for a service.
    pub fn set(&self, service_name: impl Into<String>, endpoints: Vec<DiscoveredEndpoint>) {
        self.services.insert(service_name.into(), endpoints);
    }

    /// Remove a service entirely; later lookups fail with `UnknownService`.
    pub fn remove(&self, service_name: &str) {
        self.services.remove(service_name);
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn lookup(
        &self,
        service_name: &str,
    ) -> Result<Vec<DiscoveredEndpoint>, DiscoveryError> {
        self.services
            .get(service_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DiscoveryError::UnknownService(service_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_lookup() {
        let discovery = StaticDiscovery::new();
        discovery.set(
            "orders",
            vec![DiscoveredEndpoint::new(
                "127.0.0.1:8001".parse().unwrap(),
                "zone-a",
            )],
        );

        let endpoints = discovery.lookup("orders").await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].zone, "zone-a");
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let discovery = StaticDiscovery::new();
        let result = discovery.lookup("missing").await;
        assert!(matches!(result, Err(DiscoveryError::UnknownService(_))));
    }

    #[tokio::test]
    async fn test_set_replaces_endpoints() {
        let discovery = StaticDiscovery::new();
        let a: SocketAddr = "127.0.0.1:8001".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:8002".parse().unwrap();

        discovery.set("orders", vec![DiscoveredEndpoint::unzoned(a)]);
        discovery.set("orders", vec![DiscoveredEndpoint::unzoned(b)]);

        let endpoints = discovery.lookup("orders").await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].address, b);
    }
}
