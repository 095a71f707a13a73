//! Crate-wide error types.

use crate::discovery::DiscoveryError;
use std::time::Duration;
use thiserror::Error;

/// Result alias for selection operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while resolving an endpoint for a logical service name.
///
/// Refresh errors are absorbed at the pool (stale data is kept and reused);
/// callers of [`ClientRegistry::get`](crate::ClientRegistry::get) only ever
/// see selection-time failures and `UnknownServiceName`.
#[derive(Debug, Error)]
pub enum Error {
    /// The service registry could not be reached. Non-fatal: the previous
    /// endpoint snapshot stays in place.
    #[error("registry refresh failed: {0}")]
    RefreshFailed(#[source] DiscoveryError),

    /// The registry lookup did not answer within the refresh timeout.
    /// Non-fatal: stale data is used.
    #[error("registry refresh timed out after {0:?}")]
    RefreshTimeout(Duration),

    /// Filtering left no endpoint to choose from. Request-fatal.
    #[error("no eligible endpoints")]
    NoEligibleEndpoints,

    /// A retry-wrapped strategy ran out of candidates. Request-fatal.
    #[error("all candidates exhausted after {attempts} attempts")]
    AllCandidatesExhausted { attempts: u32 },

    /// The registry does not know this service name at all. Configuration
    /// error, surfaced immediately and not retried by the core.
    #[error("unknown service name '{0}'")]
    UnknownServiceName(String),
}

impl Error {
    /// Whether this error is absorbed at the pool rather than surfaced to
    /// the caller requesting an endpoint.
    pub fn is_refresh_error(&self) -> bool {
        matches!(self, Error::RefreshFailed(_) | Error::RefreshTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_errors_are_non_fatal() {
        assert!(Error::RefreshTimeout(Duration::from_secs(1)).is_refresh_error());
        assert!(
            Error::RefreshFailed(DiscoveryError::Unavailable("down".into())).is_refresh_error()
        );
        assert!(!Error::NoEligibleEndpoints.is_refresh_error());
        assert!(!Error::UnknownServiceName("orders".into()).is_refresh_error());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::AllCandidatesExhausted { attempts: 2 };
        assert_eq!(err.to_string(), "all candidates exhausted after 2 attempts");

        let err = Error::UnknownServiceName("orders".to_string());
        assert!(err.to_string().contains("orders"));
    }
}
