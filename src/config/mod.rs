//! Configuration loading, parsing, validation, and per-service resolution.

mod loader;
mod resolver;
mod types;
mod validation;

pub use loader::{ConfigError, load_config};
pub use resolver::{ServiceConfig, resolve};
pub use types::*;
pub use validation::validate_config;
