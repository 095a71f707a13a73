//! Predicate filters narrowing a pool to eligible endpoints.
//!
//! Filters run in configured order, each consuming the previous output. A
//! filter whose output would be empty is skipped so selection can still
//! proceed on a less-ideal set.

use crate::config::FilterSpec;
use crate::pool::Endpoint;
use std::collections::HashMap;
use tracing::debug;

/// Cost assigned to a dead endpoint when aggregating zone metrics, in
/// milliseconds.
const DEAD_ENDPOINT_PENALTY_MS: f64 = 1000.0;

/// Ordered chain of eligibility filters.
#[derive(Debug, Clone)]
pub struct FilterChain {
    filters: Vec<FilterSpec>,
}

impl FilterChain {
    pub fn new(filters: Vec<FilterSpec>) -> Self {
        Self { filters }
    }

    /// Narrow `endpoints` through every filter in order.
    ///
    /// A filter that would empty the set is skipped: a non-empty, less
    /// ideal candidate set beats failing the request outright.
    pub fn apply(&self, endpoints: &[Endpoint]) -> Vec<Endpoint> {
        let mut current = endpoints.to_vec();

        for filter in &self.filters {
            if current.is_empty() {
                break;
            }
            let narrowed = eligible(filter, &current);
            if narrowed.is_empty() {
                debug!(filter = ?filter, "filter would empty the candidate set, skipping");
                continue;
            }
            current = narrowed;
        }

        current
    }
}

fn eligible(filter: &FilterSpec, endpoints: &[Endpoint]) -> Vec<Endpoint> {
    match filter {
        FilterSpec::AliveOnly => endpoints.iter().filter(|e| e.alive).cloned().collect(),
        FilterSpec::ConcurrencyCap { max_active } => endpoints
            .iter()
            .filter(|e| e.active_requests < *max_active)
            .cloned()
            .collect(),
        FilterSpec::ZoneAvoidance { threshold } => avoid_worst_zone(endpoints, *threshold),
    }
}

/// Exclude the worst zone when its aggregate metric stands out.
///
/// The per-zone metric is the mean endpoint cost: EWMA latency for alive
/// endpoints, a flat penalty for dead ones. The worst zone is dropped when
/// its metric exceeds `threshold` times the lower-median zone metric.
pub(crate) fn avoid_worst_zone(endpoints: &[Endpoint], threshold: f64) -> Vec<Endpoint> {
    let mut zones: HashMap<&str, Vec<&Endpoint>> = HashMap::new();
    for endpoint in endpoints {
        zones.entry(endpoint.zone.as_str()).or_default().push(endpoint);
    }

    // One zone gives the metric nothing to compare against
    if zones.len() < 2 {
        return endpoints.to_vec();
    }

    let metrics: HashMap<&str, f64> = zones
        .iter()
        .map(|(zone, members)| (*zone, zone_metric(members)))
        .collect();

    let mut sorted: Vec<f64> = metrics.values().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let median = sorted[(sorted.len() - 1) / 2];

    let Some((worst_zone, worst_metric)) = metrics
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(zone, metric)| (*zone, *metric))
    else {
        return endpoints.to_vec();
    };

    if median <= 0.0 || worst_metric <= threshold * median {
        return endpoints.to_vec();
    }

    debug!(
        zone = worst_zone,
        metric = worst_metric,
        median = median,
        "excluding worst zone from candidate set"
    );
    endpoints
        .iter()
        .filter(|e| e.zone != worst_zone)
        .cloned()
        .collect()
}

fn zone_metric(members: &[&Endpoint]) -> f64 {
    let total: f64 = members
        .iter()
        .map(|e| {
            if e.alive {
                e.avg_response_time_ms
            } else {
                DEAD_ENDPOINT_PENALTY_MS
            }
        })
        .sum();
    total / members.len() as f64
}
