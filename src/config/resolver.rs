//! Named configuration resolution.
//!
//! Collapses the two override layers into the effective configuration for
//! one logical service name. Every per-service field that is present
//! replaces the corresponding global field wholesale; there is no merging.

use crate::config::{Config, FilterSpec, StrategyKind};
use std::time::Duration;

/// Effective configuration for one logical service name.
///
/// Produced once per name on first access and cached inside the per-service
/// context for the registry's lifetime.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub strategy: StrategyKind,
    pub filters: Vec<FilterSpec>,
    pub refresh_interval: Duration,
    pub refresh_timeout: Duration,
    pub dead_threshold: u32,
}

/// Resolve the effective configuration for `service_name`.
///
/// Starts from the global layer; each field the per-service layer sets wins
/// unconditionally. A per-service filter chain replaces the global chain in
/// full rather than appending to it.
pub fn resolve(config: &Config, service_name: &str) -> ServiceConfig {
    let global = &config.global;
    let overrides = config.services.get(service_name);

    ServiceConfig {
        service_name: service_name.to_string(),
        strategy: overrides
            .and_then(|o| o.strategy.clone())
            .unwrap_or_else(|| global.strategy.clone()),
        filters: overrides
            .and_then(|o| o.filters.clone())
            .unwrap_or_else(|| global.filters.clone()),
        refresh_interval: overrides
            .and_then(|o| o.refresh_interval)
            .unwrap_or(global.refresh_interval),
        refresh_timeout: overrides
            .and_then(|o| o.refresh_timeout)
            .unwrap_or(global.refresh_timeout),
        dead_threshold: overrides
            .and_then(|o| o.dead_threshold)
            .unwrap_or(global.dead_threshold),
    }
}
