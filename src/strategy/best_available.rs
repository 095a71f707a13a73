//! Least-loaded selection.

use super::Strategy;
use crate::error::{Error, Result};
use crate::pool::Endpoint;

/// Picks the endpoint with the fewest in-flight requests.
///
/// Ties break toward the lowest average response time, then the first
/// endpoint in the eligible set's stable order.
pub struct BestAvailable;

impl BestAvailable {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BestAvailable {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BestAvailable {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        let Some(first) = eligible.first() else {
            return Err(Error::NoEligibleEndpoints);
        };

        let mut best = first;
        for candidate in &eligible[1..] {
            let less_loaded = candidate.active_requests < best.active_requests;
            let faster_tie = candidate.active_requests == best.active_requests
                && candidate.avg_response_time_ms < best.avg_response_time_ms;
            if less_loaded || faster_tie {
                best = candidate;
            }
        }

        Ok(best.clone())
    }
}
