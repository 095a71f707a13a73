//! Configuration data types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
///
/// Two override layers: `global` applies to every logical service name,
/// `services` holds per-service overrides. Both are loaded once at startup
/// and immutable afterwards.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Process-wide defaults.
    #[serde(default)]
    pub global: GlobalConfig,

    /// Per-service overrides, keyed by logical service name.
    #[serde(default)]
    pub services: HashMap<String, ServiceOverrides>,
}

/// Process-wide default settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub log_format: LogFormat,

    /// Default selection strategy.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Default filter chain, applied in order before selection.
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterSpec>,

    /// How long an endpoint snapshot stays fresh.
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Upper bound on a single registry lookup.
    #[serde(default = "default_refresh_timeout", with = "humantime_serde")]
    pub refresh_timeout: Duration,

    /// Consecutive failures before an endpoint is marked dead.
    #[serde(default = "default_dead_threshold")]
    pub dead_threshold: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Json,
            strategy: StrategyKind::default(),
            filters: default_filters(),
            refresh_interval: default_refresh_interval(),
            refresh_timeout: default_refresh_timeout(),
            dead_threshold: default_dead_threshold(),
        }
    }
}

/// Per-service override layer.
///
/// Every present field replaces the corresponding global field wholesale;
/// absent fields inherit from global. Precedence lives in this type itself:
/// a `Some` here always wins, there is no separate "primary" marker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceOverrides {
    #[serde(default)]
    pub strategy: Option<StrategyKind>,

    #[serde(default)]
    pub filters: Option<Vec<FilterSpec>>,

    #[serde(default, with = "option_humantime_serde")]
    pub refresh_interval: Option<Duration>,

    #[serde(default, with = "option_humantime_serde")]
    pub refresh_timeout: Option<Duration>,

    #[serde(default)]
    pub dead_threshold: Option<u32>,
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Selection strategy specification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Uniform random pick.
    Random,

    /// Monotonic cursor modulo the eligible-set size.
    RoundRobin,

    /// Wraps an inner strategy with per-request retry bookkeeping.
    Retry {
        #[serde(default = "default_retry_inner")]
        inner: Box<StrategyKind>,
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },

    /// Inverse-latency weighted random pick.
    WeightedResponseTime,

    /// Fewest in-flight requests, ties by lowest latency.
    BestAvailable,

    /// Zone-avoidance filter composed with a round-robin picker.
    ZoneAvoidance {
        #[serde(default = "default_zone_threshold")]
        threshold: f64,
    },
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::ZoneAvoidance {
            threshold: default_zone_threshold(),
        }
    }
}

/// Filter chain entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    /// Keep only endpoints currently marked alive.
    AliveOnly,

    /// Drop the worst zone when its aggregate metric exceeds
    /// `threshold` times the median zone metric.
    ZoneAvoidance {
        #[serde(default = "default_zone_threshold")]
        threshold: f64,
    },

    /// Keep only endpoints with fewer than `max_active` in-flight requests.
    ConcurrencyCap { max_active: u32 },
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_filters() -> Vec<FilterSpec> {
    vec![FilterSpec::AliveOnly]
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_refresh_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_dead_threshold() -> u32 {
    3
}

fn default_retry_inner() -> Box<StrategyKind> {
    Box::new(StrategyKind::RoundRobin)
}

fn default_max_attempts() -> u32 {
    3
}

pub(crate) fn default_zone_threshold() -> f64 {
    2.0
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Custom serde module for optional humantime durations.
mod option_humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => {
                let s = humantime::format_duration(*d).to_string();
                serializer.serialize_some(&s)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let d = humantime::parse_duration(&s).map_err(serde::de::Error::custom)?;
                Ok(Some(d))
            }
            None => Ok(None),
        }
    }
}
