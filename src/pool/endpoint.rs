//! Endpoint views and per-endpoint statistics.

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Fraction of the distance toward a new latency sample the average moves
/// on each update.
pub(crate) const RESPONSE_TIME_DECAY: f64 = 0.8;

/// Immutable view of one endpoint at selection time.
///
/// Views are owned snapshots produced by the pool; filters and strategies
/// never see the pool's mutable state directly.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub address: SocketAddr,
    pub zone: String,
    pub alive: bool,
    pub active_requests: u32,
    /// Exponentially weighted average response time. Zero until sampled.
    pub avg_response_time_ms: f64,
    /// Whether at least one latency sample has been recorded.
    pub sampled: bool,
    /// Unix timestamp (milliseconds) of the last statistics update.
    pub last_updated_ms: u64,
}

/// Mutable statistics for one endpoint, keyed by address inside the pool.
#[derive(Debug)]
pub(crate) struct EndpointStats {
    alive: AtomicBool,
    consecutive_failures: AtomicU32,
    active_requests: AtomicU32,
    last_updated_ms: AtomicU64,
    response_time: Mutex<ResponseTime>,
}

#[derive(Debug, Default)]
struct ResponseTime {
    avg_ms: f64,
    samples: u64,
}

impl Default for EndpointStats {
    fn default() -> Self {
        Self {
            alive: AtomicBool::new(true),
            consecutive_failures: AtomicU32::new(0),
            active_requests: AtomicU32::new(0),
            last_updated_ms: AtomicU64::new(0),
            response_time: Mutex::new(ResponseTime::default()),
        }
    }
}

impl EndpointStats {
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn start_request(&self, now_ms: u64) {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        self.last_updated_ms.store(now_ms, Ordering::Release);
    }

    pub(crate) fn finish_request(&self) {
        // Prevent underflow if a start was never recorded
        let current = self.active_requests.load(Ordering::Relaxed);
        if current > 0 {
            self.active_requests.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Record a successful call. Clears the failure streak, revives the
    /// endpoint, and folds the latency sample into the running average.
    /// Returns true if the endpoint was dead and came back.
    pub(crate) fn record_success(&self, latency_ms: f64, now_ms: u64) -> bool {
        self.consecutive_failures.store(0, Ordering::Release);
        self.last_updated_ms.store(now_ms, Ordering::Release);

        {
            let mut rt = self.response_time.lock();
            if rt.samples == 0 {
                rt.avg_ms = latency_ms;
            } else {
                rt.avg_ms += RESPONSE_TIME_DECAY * (latency_ms - rt.avg_ms);
            }
            rt.samples += 1;
        }

        !self.alive.swap(true, Ordering::AcqRel)
    }

    /// Record a failed call. Returns true if this failure pushed the streak
    /// over `dead_threshold` and the endpoint was marked dead.
    pub(crate) fn record_failure(&self, dead_threshold: u32, now_ms: u64) -> bool {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        self.last_updated_ms.store(now_ms, Ordering::Release);

        if failures >= dead_threshold && self.alive.swap(false, Ordering::AcqRel) {
            return true;
        }
        false
    }

    /// A registry refresh still lists this endpoint: bring it back.
    pub(crate) fn revive(&self, now_ms: u64) {
        self.alive.store(true, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
        self.last_updated_ms.store(now_ms, Ordering::Release);
    }

    pub(crate) fn view(&self, address: SocketAddr, zone: &str) -> Endpoint {
        let (avg_ms, samples) = {
            let rt = self.response_time.lock();
            (rt.avg_ms, rt.samples)
        };
        Endpoint {
            address,
            zone: zone.to_string(),
            alive: self.alive.load(Ordering::Acquire),
            active_requests: self.active_requests.load(Ordering::Relaxed),
            avg_response_time_ms: avg_ms,
            sampled: samples > 0,
            last_updated_ms: self.last_updated_ms.load(Ordering::Acquire),
        }
    }
}
