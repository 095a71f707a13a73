//! Round-robin selection.

use super::Strategy;
use crate::error::{Error, Result};
use crate::pool::Endpoint;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Distributes picks evenly across the eligible set in order.
///
/// The cursor persists across calls for this instance. When the set size
/// changes between calls the modulo is simply recomputed against the
/// current size; no attempt is made to keep a position across resizes.
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RoundRobin {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        if eligible.is_empty() {
            return Err(Error::NoEligibleEndpoints);
        }

        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
        Ok(eligible[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::endpoints;

    #[test]
    fn test_round_robin_cycles() {
        let strategy = RoundRobin::new();
        let eligible = endpoints(3);

        let picks: Vec<_> = (0..4)
            .map(|_| strategy.choose(&eligible).unwrap().address)
            .collect();

        assert_eq!(picks[0], eligible[0].address);
        assert_eq!(picks[1], eligible[1].address);
        assert_eq!(picks[2], eligible[2].address);
        assert_eq!(picks[3], eligible[0].address); // Cycles back
    }

    #[test]
    fn test_round_robin_visits_everyone_once_per_cycle() {
        let strategy = RoundRobin::new();
        let eligible = endpoints(5);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            seen.insert(strategy.choose(&eligible).unwrap().address);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_round_robin_empty() {
        let strategy = RoundRobin::new();
        assert!(matches!(
            strategy.choose(&[]),
            Err(Error::NoEligibleEndpoints)
        ));
    }

    #[test]
    fn test_round_robin_handles_resize() {
        let strategy = RoundRobin::new();

        let five = endpoints(5);
        for _ in 0..4 {
            strategy.choose(&five).unwrap();
        }

        // Shrinks between calls; modulo is against the current size
        let two = endpoints(2);
        let chosen = strategy.choose(&two).unwrap();
        assert!(two.iter().any(|e| e.address == chosen.address));
    }
}
