//! Per-service endpoint pool.
//!
//! Holds the registry's last successful answer plus per-endpoint statistics.
//! Refresh is lazy: the pool re-queries the registry only when a caller asks
//! for endpoints and the snapshot has gone stale.

use crate::config::ServiceConfig;
use crate::discovery::{DiscoveredEndpoint, Discovery, DiscoveryError};
use crate::error::{Error, Result};
use crate::pool::endpoint::{Endpoint, EndpointStats};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Live candidate set and statistics for one logical service name.
pub struct EndpointPool {
    service_name: String,
    refresh_interval: Duration,
    refresh_timeout: Duration,
    dead_threshold: u32,

    /// Last successful registry answer. Swapped atomically as a whole, so
    /// readers see either the pre- or post-refresh snapshot, never a mix.
    snapshot: ArcSwap<Vec<DiscoveredEndpoint>>,

    /// Statistics per address, for addresses in the current snapshot.
    stats: DashMap<SocketAddr, EndpointStats>,

    /// Unix timestamp (milliseconds) of the last successful refresh.
    /// Zero means never refreshed.
    last_refresh_ms: AtomicU64,

    /// Serializes refreshes so concurrent callers trigger at most one.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl EndpointPool {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            refresh_interval: config.refresh_interval,
            refresh_timeout: config.refresh_timeout,
            dead_threshold: config.dead_threshold,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            stats: DashMap::new(),
            last_refresh_ms: AtomicU64::new(0),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn is_due(&self) -> bool {
        let last = self.last_refresh_ms.load(Ordering::Acquire);
        last == 0
            || now_millis().saturating_sub(last) >= self.refresh_interval.as_millis() as u64
    }

    /// Refresh the snapshot from the registry if it has gone stale.
    ///
    /// A failed or timed-out lookup leaves the previous snapshot (and
    /// `last_refresh`) untouched; the returned error is informational and
    /// absorbed by the caller holding this pool. Only `UnknownServiceName`
    /// is meant to propagate to the requester.
    pub async fn refresh_if_due(&self, discovery: &dyn Discovery) -> Result<()> {
        if !self.is_due() {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited for the lock
        if !self.is_due() {
            return Ok(());
        }

        match tokio::time::timeout(
            self.refresh_timeout,
            discovery.lookup(&self.service_name),
        )
        .await
        {
            Ok(Ok(endpoints)) => {
                self.install(endpoints);
                Ok(())
            }
            Ok(Err(DiscoveryError::UnknownService(name))) => {
                warn!(service = %self.service_name, "service name not known to registry");
                Err(Error::UnknownServiceName(name))
            }
            Ok(Err(err)) => {
                warn!(
                    service = %self.service_name,
                    error = %err,
                    "registry refresh failed, keeping previous snapshot"
                );
                Err(Error::RefreshFailed(err))
            }
            Err(_elapsed) => {
                warn!(
                    service = %self.service_name,
                    timeout = ?self.refresh_timeout,
                    "registry refresh timed out, keeping previous snapshot"
                );
                Err(Error::RefreshTimeout(self.refresh_timeout))
            }
        }
    }

    fn install(&self, endpoints: Vec<DiscoveredEndpoint>) {
        let now = now_millis();
        let listed: HashSet<SocketAddr> = endpoints.iter().map(|e| e.address).collect();

        // A refresh that still lists an endpoint revives it
        for endpoint in &endpoints {
            self.stats
                .entry(endpoint.address)
                .or_default()
                .revive(now);
        }

        // Delisted endpoints lose their statistics
        self.stats.retain(|address, _| listed.contains(address));

        debug!(
            service = %self.service_name,
            endpoints = endpoints.len(),
            "installed registry snapshot"
        );
        self.snapshot.store(Arc::new(endpoints));
        self.last_refresh_ms.store(now, Ordering::Release);
    }

    /// Materialize the current snapshot joined with statistics.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let snapshot = self.snapshot.load();
        snapshot
            .iter()
            .map(|discovered| {
                self.stats
                    .get(&discovered.address)
                    .map(|stats| stats.view(discovered.address, &discovered.zone))
                    .unwrap_or_else(|| {
                        EndpointStats::default().view(discovered.address, &discovered.zone)
                    })
            })
            .collect()
    }

    /// Mark a request as in flight against `address`.
    pub fn record_start(&self, address: SocketAddr) {
        if let Some(stats) = self.stats.get(&address) {
            stats.start_request(now_millis());
        }
    }

    /// Report the outcome of a completed request against `address`.
    pub fn record_outcome(&self, address: SocketAddr, success: bool, latency_ms: f64) {
        let Some(stats) = self.stats.get(&address) else {
            debug!(
                service = %self.service_name,
                endpoint = %address,
                "outcome for endpoint no longer in pool, ignoring"
            );
            return;
        };

        stats.finish_request();

        if success {
            if stats.record_success(latency_ms, now_millis()) {
                info!(
                    service = %self.service_name,
                    endpoint = %address,
                    "endpoint revived by successful request"
                );
            }
        } else if stats.record_failure(self.dead_threshold, now_millis()) {
            warn!(
                service = %self.service_name,
                endpoint = %address,
                threshold = self.dead_threshold,
                "endpoint marked dead after consecutive failures"
            );
        }
    }
}

/// Current Unix timestamp in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
