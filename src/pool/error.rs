//! Pool error definitions.

use thiserror::Error;

use crate::net::DialError;

/// Errors returned by [`Pool::get_conn`] and [`Pool::dial`].
///
/// [`Pool::get_conn`]: crate::pool::Pool::get_conn
/// [`Pool::dial`]: crate::pool::Pool::dial
#[derive(Debug, Error)]
pub enum PoolError {
    /// The dialer could not open a transport connection.
    #[error("dial {address} failed: {source}")]
    Dial {
        address: String,
        #[source]
        source: DialError,
    },

    /// A connection exists but has not reached Ready. Retry later, or call
    /// `dial` to force a fresh connection.
    #[error("connection to {address} is not ready")]
    NotReady { address: String },

    /// The pool has been shut down.
    #[error("connection pool is closed")]
    Closed,
}

impl PoolError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PoolError::Closed)
    }
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PoolError::NotReady { address: "10.0.0.1:80".into() };
        assert_eq!(err.to_string(), "connection to 10.0.0.1:80 is not ready");

        let err = PoolError::Dial {
            address: "a:1".into(),
            source: DialError::Rejected("refused".into()),
        };
        assert_eq!(err.to_string(), "dial a:1 failed: dial rejected: refused");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn closed_is_final() {
        assert!(!PoolError::Closed.is_retryable());
        assert!(PoolError::NotReady { address: "a:1".into() }.is_retryable());
    }
}
