//! Configuration validation.

use crate::config::{Config, FilterSpec, GlobalConfig, ServiceOverrides, StrategyKind};
use std::time::Duration;

/// Validate the configuration.
///
/// Checks for:
/// - Positive refresh interval and timeout
/// - Dead threshold of at least one failure
/// - Sane strategy parameters (retry attempts, zone thresholds, no nested retry)
/// - Sane filter parameters
/// - A known log level
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    validate_global(&config.global, &mut errors);

    for (name, overrides) in &config.services {
        if name.is_empty() {
            errors.push("service name cannot be empty".to_string());
        }
        validate_overrides(name, overrides, &mut errors);
    }

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

fn validate_global(global: &GlobalConfig, errors: &mut Vec<String>) {
    if global.refresh_interval == Duration::ZERO {
        errors.push("global refresh_interval must be greater than zero".to_string());
    }
    if global.refresh_timeout == Duration::ZERO {
        errors.push("global refresh_timeout must be greater than zero".to_string());
    }
    if global.dead_threshold == 0 {
        errors.push("global dead_threshold must be at least 1".to_string());
    }
    validate_strategy("global", &global.strategy, errors);
    validate_filters("global", &global.filters, errors);
}

fn validate_overrides(name: &str, overrides: &ServiceOverrides, errors: &mut Vec<String>) {
    if overrides.refresh_interval == Some(Duration::ZERO) {
        errors.push(format!(
            "service '{name}' refresh_interval must be greater than zero"
        ));
    }
    if overrides.refresh_timeout == Some(Duration::ZERO) {
        errors.push(format!(
            "service '{name}' refresh_timeout must be greater than zero"
        ));
    }
    if overrides.dead_threshold == Some(0) {
        errors.push(format!("service '{name}' dead_threshold must be at least 1"));
    }
    if let Some(strategy) = &overrides.strategy {
        validate_strategy(name, strategy, errors);
    }
    if let Some(filters) = &overrides.filters {
        validate_filters(name, filters, errors);
    }
}

fn validate_strategy(scope: &str, strategy: &StrategyKind, errors: &mut Vec<String>) {
    match strategy {
        StrategyKind::Retry {
            inner,
            max_attempts,
        } => {
            if *max_attempts == 0 {
                errors.push(format!("{scope}: retry max_attempts must be at least 1"));
            }
            if matches!(inner.as_ref(), StrategyKind::Retry { .. }) {
                errors.push(format!("{scope}: retry strategy cannot nest another retry"));
            } else {
                validate_strategy(scope, inner, errors);
            }
        }
        StrategyKind::ZoneAvoidance { threshold } => {
            if *threshold <= 0.0 {
                errors.push(format!(
                    "{scope}: zone avoidance threshold must be positive, got {threshold}"
                ));
            }
        }
        StrategyKind::Random
        | StrategyKind::RoundRobin
        | StrategyKind::WeightedResponseTime
        | StrategyKind::BestAvailable => {}
    }
}

fn validate_filters(scope: &str, filters: &[FilterSpec], errors: &mut Vec<String>) {
    for filter in filters {
        match filter {
            FilterSpec::ZoneAvoidance { threshold } => {
                if *threshold <= 0.0 {
                    errors.push(format!(
                        "{scope}: zone avoidance threshold must be positive, got {threshold}"
                    ));
                }
            }
            FilterSpec::ConcurrencyCap { max_active } => {
                if *max_active == 0 {
                    errors.push(format!(
                        "{scope}: concurrency cap max_active must be at least 1"
                    ));
                }
            }
            FilterSpec::AliveOnly => {}
        }
    }
}
