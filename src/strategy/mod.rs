//! Selection strategies.

mod best_available;
mod random;
mod retry;
mod round_robin;
mod weighted_response_time;
mod zone_avoidance;

pub use best_available::BestAvailable;
pub use random::RandomChoice;
pub use retry::RetryStrategy;
pub use round_robin::RoundRobin;
pub use weighted_response_time::WeightedResponseTime;
pub use zone_avoidance::ZoneAvoidanceStrategy;

use crate::config::StrategyKind;
use crate::error::Result;
use crate::pool::Endpoint;
use std::sync::Arc;

/// Trait for selection strategies.
///
/// Stateful strategies carry their own counters per instance; an instance
/// belongs to exactly one service name and is never shared across services.
pub trait Strategy: Send + Sync {
    /// Pick one endpoint from the eligible set.
    ///
    /// Fails with [`Error::NoEligibleEndpoints`](crate::Error::NoEligibleEndpoints)
    /// when the set is empty, for every variant.
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint>;
}

/// Build a strategy instance from its configuration.
pub fn build(kind: &StrategyKind) -> Arc<dyn Strategy> {
    match kind {
        StrategyKind::Random => Arc::new(RandomChoice::new()),
        StrategyKind::RoundRobin => Arc::new(RoundRobin::new()),
        StrategyKind::Retry {
            inner,
            max_attempts,
        } => Arc::new(RetryStrategy::new(build(inner), *max_attempts)),
        StrategyKind::WeightedResponseTime => Arc::new(WeightedResponseTime::new()),
        StrategyKind::BestAvailable => Arc::new(BestAvailable::new()),
        StrategyKind::ZoneAvoidance { threshold } => {
            Arc::new(ZoneAvoidanceStrategy::new(*threshold))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::pool::Endpoint;
    use std::net::SocketAddr;

    /// Endpoint in the given zone with default statistics.
    pub(crate) fn endpoint(port: u16, zone: &str) -> Endpoint {
        Endpoint {
            address: SocketAddr::new("127.0.0.1".parse().unwrap(), port),
            zone: zone.to_string(),
            alive: true,
            active_requests: 0,
            avg_response_time_ms: 0.0,
            sampled: false,
            last_updated_ms: 0,
        }
    }

    pub(crate) fn endpoints(count: u16) -> Vec<Endpoint> {
        (0..count).map(|i| endpoint(8001 + i, "default")).collect()
    }
}
