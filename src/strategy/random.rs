//! Uniform random selection.

use super::Strategy;
use crate::error::{Error, Result};
use crate::pool::Endpoint;
use rand::Rng;

/// Picks uniformly at random over the eligible set. Stateless.
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomChoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomChoice {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        if eligible.is_empty() {
            return Err(Error::NoEligibleEndpoints);
        }

        let idx = rand::rng().random_range(0..eligible.len());
        Ok(eligible[idx].clone())
    }
}
