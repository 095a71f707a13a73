//! Client registry: the crate's top-level façade.
//!
//! Maps each logical service name to its endpoint pool, resolved filter
//! chain, and strategy instance. Contexts are built lazily on first access
//! and cached for the registry's lifetime.

use crate::config::{Config, ServiceConfig, StrategyKind, resolve};
use crate::discovery::Discovery;
use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::pool::{Endpoint, EndpointPool};
use crate::strategy::{self, RetryStrategy, Strategy};
use dashmap::DashMap;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Everything one logical service name needs for selection.
struct ServiceContext {
    pool: EndpointPool,
    filters: FilterChain,
    strategy: Arc<dyn Strategy>,
    /// Present when the resolved strategy is retry-wrapped; sessions use it
    /// for attempt-aware re-selection.
    retry: Option<Arc<RetryStrategy>>,
}

impl ServiceContext {
    fn new(config: ServiceConfig) -> Self {
        let pool = EndpointPool::new(&config);
        let filters = FilterChain::new(config.filters.clone());

        let (strategy, retry): (Arc<dyn Strategy>, Option<Arc<RetryStrategy>>) =
            match &config.strategy {
                StrategyKind::Retry {
                    inner,
                    max_attempts,
                } => {
                    let retry = Arc::new(RetryStrategy::new(strategy::build(inner), *max_attempts));
                    (retry.clone() as Arc<dyn Strategy>, Some(retry))
                }
                kind => (strategy::build(kind), None),
            };

        Self {
            pool,
            filters,
            strategy,
            retry,
        }
    }

    /// Refresh if due, then produce the filtered candidate set.
    ///
    /// Refresh failures and timeouts are absorbed here: the pool already
    /// logged them and stale data is preferred over failing the request.
    async fn eligible(&self, discovery: &dyn Discovery) -> Result<Vec<Endpoint>> {
        match self.pool.refresh_if_due(discovery).await {
            Ok(()) => {}
            Err(err) if err.is_refresh_error() => {}
            Err(err) => return Err(err),
        }
        Ok(self.filters.apply(&self.pool.endpoints()))
    }
}

/// Top-level façade: resolves logical service names to endpoints.
///
/// Thread-safe; contexts for different service names are fully independent
/// and never block one another.
pub struct ClientRegistry {
    config: Config,
    discovery: Arc<dyn Discovery>,
    contexts: DashMap<String, Arc<ServiceContext>>,
}

impl ClientRegistry {
    pub fn new(config: Config, discovery: Arc<dyn Discovery>) -> Self {
        Self {
            config,
            discovery,
            contexts: DashMap::new(),
        }
    }

    /// Fetch or build the context for a service name.
    ///
    /// The entry lock makes construction at-most-once under concurrent
    /// first access.
    fn context(&self, service_name: &str) -> Arc<ServiceContext> {
        self.contexts
            .entry(service_name.to_string())
            .or_insert_with(|| {
                debug!(service = service_name, "building client context");
                Arc::new(ServiceContext::new(resolve(&self.config, service_name)))
            })
            .value()
            .clone()
    }

    /// Resolve one endpoint for `service_name`.
    ///
    /// Refreshes the pool if its snapshot went stale, narrows candidates
    /// through the resolved filter chain, and applies the resolved strategy.
    pub async fn get(&self, service_name: &str) -> Result<Endpoint> {
        let ctx = self.context(service_name);
        let eligible = ctx.eligible(self.discovery.as_ref()).await?;
        ctx.strategy.choose(&eligible)
    }

    /// Begin a retry-aware selection session for one logical request.
    ///
    /// Under a retry-wrapped strategy, each [`RetrySession::next`] call
    /// excludes endpoints already tried in this session, up to the
    /// configured attempt budget. For any other strategy each call is an
    /// independent selection.
    pub fn session(&self, service_name: &str) -> RetrySession {
        RetrySession {
            ctx: self.context(service_name),
            discovery: self.discovery.clone(),
            tried: HashSet::new(),
            attempts: 0,
        }
    }

    /// Mark a request against `address` as in flight.
    pub fn record_start(&self, service_name: &str, address: SocketAddr) {
        if let Some(ctx) = self.contexts.get(service_name) {
            ctx.pool.record_start(address);
        }
    }

    /// Report the outcome of a completed request against `address`.
    ///
    /// Unknown service names and delisted addresses are ignored.
    pub fn record_outcome(
        &self,
        service_name: &str,
        address: SocketAddr,
        success: bool,
        latency_ms: f64,
    ) {
        if let Some(ctx) = self.contexts.get(service_name) {
            ctx.pool.record_outcome(address, success, latency_ms);
        }
    }
}

/// Selection state for one logical request.
///
/// Tracks which endpoints this request already tried; dropped (and the
/// trial set with it) when the request resolves or exhausts.
pub struct RetrySession {
    ctx: Arc<ServiceContext>,
    discovery: Arc<dyn Discovery>,
    tried: HashSet<SocketAddr>,
    attempts: u32,
}

impl RetrySession {
    /// Select an endpoint for the next attempt of this request.
    pub async fn next(&mut self) -> Result<Endpoint> {
        let eligible = self.ctx.eligible(self.discovery.as_ref()).await?;

        let chosen = match &self.ctx.retry {
            Some(retry) => {
                if self.attempts >= retry.max_attempts() {
                    return Err(Error::AllCandidatesExhausted {
                        attempts: self.attempts,
                    });
                }
                retry.choose_excluding(&eligible, &self.tried)?
            }
            // Not retry-wrapped: every attempt is an independent selection
            None => self.ctx.strategy.choose(&eligible)?,
        };

        self.attempts += 1;
        self.tried.insert(chosen.address);
        Ok(chosen)
    }

    /// Report the outcome of the current attempt and feed pool statistics.
    pub fn report(&self, address: SocketAddr, success: bool, latency_ms: f64) {
        self.ctx.pool.record_outcome(address, success, latency_ms);
    }
}


#[cfg(test)]
mod refresh_tests {
    use super::*;
    use crate::config::ServiceOverrides;
    use crate::discovery::{DiscoveredEndpoint, DiscoveryError, StaticDiscovery};
    use std::time::Duration;

    /// Succeeds on the first lookup, then reports the registry unreachable.
    struct FlakyDiscovery {
        inner: StaticDiscovery,
        calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait::async_trait]
    impl Discovery for FlakyDiscovery {
        async fn lookup(
            &self,
            service_name: &str,
        ) -> std::result::Result<Vec<DiscoveredEndpoint>, DiscoveryError> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                self.inner.lookup(service_name).await
            } else {
                Err(DiscoveryError::Unavailable("connection refused".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_serving_stale_endpoints() {
        let inner = StaticDiscovery::new();
        inner.set(
            "orders",
            vec![DiscoveredEndpoint::unzoned("127.0.0.1:8001".parse().unwrap())],
        );
        let discovery = Arc::new(FlakyDiscovery {
            inner,
            calls: std::sync::atomic::AtomicU32::new(0),
        });

        let mut config = Config::default();
        config.global.strategy = StrategyKind::RoundRobin;
        config.services.insert(
            "orders".to_string(),
            ServiceOverrides {
                refresh_interval: Some(Duration::from_millis(1)),
                ..Default::default()
            },
        );

        let registry = ClientRegistry::new(config, discovery);

        let first = registry.get("orders").await.unwrap();
        assert_eq!(first.address.port(), 8001);

        // Refresh is due again and will fail; the stale snapshot still serves
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = registry.get("orders").await.unwrap();
        assert_eq!(second.address.port(), 8001);
    }
}
