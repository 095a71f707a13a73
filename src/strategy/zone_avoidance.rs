//! Zone-avoidance selection.

use super::{RoundRobin, Strategy};
use crate::error::{Error, Result};
use crate::filter::avoid_worst_zone;
use crate::pool::Endpoint;

/// Zone-avoidance filter composed with a round-robin terminal picker.
///
/// The process-wide default strategy: drop the worst zone when it stands
/// out, then rotate over what remains.
pub struct ZoneAvoidanceStrategy {
    threshold: f64,
    picker: RoundRobin,
}

impl ZoneAvoidanceStrategy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            picker: RoundRobin::new(),
        }
    }
}

impl Strategy for ZoneAvoidanceStrategy {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        if eligible.is_empty() {
            return Err(Error::NoEligibleEndpoints);
        }

        let preferred = avoid_worst_zone(eligible, self.threshold);
        self.picker.choose(&preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::endpoint;

    fn zoned(port: u16, zone: &str, avg_ms: f64) -> Endpoint {
        let mut e = endpoint(port, zone);
        e.avg_response_time_ms = avg_ms;
        e.sampled = true;
        e
    }

    #[test]
    fn test_empty() {
        let strategy = ZoneAvoidanceStrategy::new(2.0);
        assert!(matches!(
            strategy.choose(&[]),
            Err(Error::NoEligibleEndpoints)
        ));
    }

    #[test]
    fn test_avoids_slow_zone() {
        let strategy = ZoneAvoidanceStrategy::new(2.0);
        let eligible = vec![
            zoned(8001, "a", 10.0),
            zoned(8002, "b", 12.0),
            zoned(8003, "c", 400.0),
        ];

        for _ in 0..10 {
            let chosen = strategy.choose(&eligible).unwrap();
            assert_ne!(chosen.zone, "c");
        }
    }

    #[test]
    fn test_rotates_over_surviving_zones() {
        let strategy = ZoneAvoidanceStrategy::new(2.0);
        let eligible = vec![
            zoned(8001, "a", 10.0),
            zoned(8002, "b", 12.0),
            zoned(8003, "c", 400.0),
        ];

        let mut seen = std::collections::HashSet::new();
        for _ in 0..4 {
            seen.insert(strategy.choose(&eligible).unwrap().address);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_single_zone_plain_round_robin() {
        let strategy = ZoneAvoidanceStrategy::new(2.0);
        let eligible = vec![zoned(8001, "a", 10.0), zoned(8002, "a", 500.0)];

        let first = strategy.choose(&eligible).unwrap();
        let second = strategy.choose(&eligible).unwrap();
        assert_ne!(first.address, second.address);
    }
}
