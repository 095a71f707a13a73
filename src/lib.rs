//! steer - a client-side load-balancing core
//!
//! Embedded in a service consumer, this crate resolves a logical service
//! name to a concrete network endpoint:
//! - Pluggable selection strategies: random, round-robin, retry-wrapped,
//!   weighted response time, best available, zone avoidance
//! - Composable eligibility filters with fallback-to-less-strict semantics
//! - Lazy, bounded-timeout pool refresh against a pluggable service registry
//! - Two-tier (global / per-service) configuration overrides
//!
//! ```no_run
//! use std::sync::Arc;
//! use steer::discovery::{DiscoveredEndpoint, StaticDiscovery};
//! use steer::{ClientRegistry, Config};
//!
//! # async fn example() -> Result<(), steer::Error> {
//! let discovery = StaticDiscovery::new();
//! discovery.set(
//!     "orders",
//!     vec![DiscoveredEndpoint::unzoned("10.0.0.1:8080".parse().unwrap())],
//! );
//!
//! let registry = ClientRegistry::new(Config::default(), Arc::new(discovery));
//! let endpoint = registry.get("orders").await?;
//!
//! // ... perform the request against endpoint.address ...
//! registry.record_outcome("orders", endpoint.address, true, 12.5);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod pool;
pub mod strategy;
pub mod util;

pub use client::{ClientRegistry, RetrySession};
pub use config::Config;
pub use error::{Error, Result};
pub use pool::Endpoint;
