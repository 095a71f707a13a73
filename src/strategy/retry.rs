//! Retry-wrapped selection.

use super::Strategy;
use crate::error::{Error, Result};
use crate::pool::Endpoint;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

/// Wraps an inner strategy with retry-aware re-selection.
///
/// `choose` is a fresh first attempt and delegates straight to the inner
/// strategy. Later attempts of the same logical request go through
/// [`choose_excluding`](RetryStrategy::choose_excluding) with the trial set
/// that [`RetrySession`](crate::client::RetrySession) tracks for that one
/// request. This is the only strategy whose behavior spans selection calls.
pub struct RetryStrategy {
    inner: Arc<dyn Strategy>,
    max_attempts: u32,
}

impl RetryStrategy {
    pub fn new(inner: Arc<dyn Strategy>, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Re-select for a later attempt, excluding endpoints already tried.
    ///
    /// Fails with `AllCandidatesExhausted` once every eligible endpoint has
    /// been tried; the attempt budget itself is enforced by the session.
    pub fn choose_excluding(
        &self,
        eligible: &[Endpoint],
        tried: &HashSet<SocketAddr>,
    ) -> Result<Endpoint> {
        let remaining: Vec<Endpoint> = eligible
            .iter()
            .filter(|e| !tried.contains(&e.address))
            .cloned()
            .collect();

        if remaining.is_empty() {
            if tried.is_empty() {
                return Err(Error::NoEligibleEndpoints);
            }
            return Err(Error::AllCandidatesExhausted {
                attempts: tried.len() as u32,
            });
        }

        self.inner.choose(&remaining)
    }
}

impl Strategy for RetryStrategy {
    fn choose(&self, eligible: &[Endpoint]) -> Result<Endpoint> {
        self.inner.choose(eligible)
    }
}
