//! Response-time weighted random selection.

use super::Strategy;
use crate::error::{Error, Result};
use crate::pool::Endpoint;
use rand::Rng;

/// Floor for observed response times when inverting them into weights.
const MIN_RESPONSE_TIME_MS: f64 = 0.001;

/// Picks endpoints with probability inversely proportional to their average
/// response time.
///
/// Endpoints without samples get the mean of the sampled weights, so a cold
/// endpoint is neither starved nor flooded. The weight table is rebuilt on
/// every call from the read-only endpoint views.
pub struct WeightedResponseTime;

impl WeightedResponseTime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeightedResponseTime {
    fn default() -> Self {
        Self::new()
    }
}

fn weights(eligible: &[Endpoint]) -> Vec<f64> {
    let sampled: Vec<f64> = eligible
        .iter()
        .filter(|e| e.sampled)
        .map(|e| 1.0 / e.avg_response_time_ms.max(MIN_RESPONSE_TIME_MS))
        .collect();

    // Nothing sampled yet: uniform
    let neutral = if sampled.is_empty() {
        1.0
    } else {
        sampled.iter().sum::<f64>() / sampled.len() as f64
    };

    eligible
        .iter()
        .map(|e| {
            if e.sampled {
                1.0 / e.avg_response_time_ms.max(MIN_RESPONSE_TIME_MS)
            } else {
                neutral
            }
        })
        .collect()
}

impl Strategy for WeightedResponseTime {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        if eligible.is_empty() {
            return Err(Error::NoEligibleEndpoints);
        }

        let weights = weights(eligible);
        let total: f64 = weights.iter().sum();
        let draw = rand::rng().random_range(0.0..total);

        let mut cumulative = 0.0;
        for (endpoint, weight) in eligible.iter().zip(&weights) {
            cumulative += weight;
            if draw < cumulative {
                return Ok(endpoint.clone());
            }
        }

        // Float rounding can leave the draw at the upper boundary
        Ok(eligible[eligible.len() - 1].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::endpoint;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    fn sampled(port: u16, avg_ms: f64) -> Endpoint {
        let mut e = endpoint(port, "default");
        e.avg_response_time_ms = avg_ms;
        e.sampled = true;
        e
    }

    fn frequencies(eligible: &[Endpoint], draws: u32) -> HashMap<SocketAddr, u32> {
        let strategy = WeightedResponseTime::new();
        let mut counts = HashMap::new();
        for _ in 0..draws {
            let chosen = strategy.choose(eligible).unwrap();
            *counts.entry(chosen.address).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_weighted_empty() {
        let strategy = WeightedResponseTime::new();
        assert!(matches!(
            strategy.choose(&[]),
            Err(Error::NoEligibleEndpoints)
        ));
    }

    #[test]
    fn test_faster_endpoint_preferred() {
        // 10ms vs 40ms gives weights 0.1 vs 0.025, i.e. 80% vs 20%
        let fast = sampled(8001, 10.0);
        let slow = sampled(8002, 40.0);
        let eligible = vec![fast.clone(), slow.clone()];

        let counts = frequencies(&eligible, 10_000);
        let fast_share = counts[&fast.address] as f64 / 10_000.0;

        assert!(
            (fast_share - 0.8).abs() < 0.05,
            "fast share was {fast_share}"
        );
    }

    #[test]
    fn test_unsampled_gets_neutral_weight() {
        // The cold endpoint inherits the mean sampled weight, so two
        // endpoints with one 10ms sample between them split evenly.
        let warm = sampled(8001, 10.0);
        let cold = endpoint(8002, "default");
        let eligible = vec![warm, cold.clone()];

        let counts = frequencies(&eligible, 10_000);
        let cold_share = counts[&cold.address] as f64 / 10_000.0;

        assert!(
            (cold_share - 0.5).abs() < 0.05,
            "cold share was {cold_share}"
        );
    }

    #[test]
    fn test_all_unsampled_is_uniform() {
        let eligible = vec![endpoint(8001, "a"), endpoint(8002, "a"), endpoint(8003, "a")];

        let counts = frequencies(&eligible, 9_000);
        for count in counts.values() {
            let share = *count as f64 / 9_000.0;
            assert!((share - 1.0 / 3.0).abs() < 0.05, "share was {share}");
        }
    }

    #[test]
    fn test_zero_latency_is_floored() {
        // A 0ms average must not produce an infinite weight
        let instant = sampled(8001, 0.0);
        let normal = sampled(8002, 10.0);
        let eligible = vec![instant, normal.clone()];

        let counts = frequencies(&eligible, 1_000);
        // The floored endpoint dominates but the draw still terminates
        assert_eq!(counts.values().sum::<u32>(), 1_000);
    }
}
