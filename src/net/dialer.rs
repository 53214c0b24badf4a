//! Dialer capability.
//!
//! A dialer opens a new transport connection for an address. The pool
//! never retries a failed dial on its own; the error goes straight back to
//! the caller of `get_conn`/`dial`.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a dialer can report.
#[derive(Debug, Error)]
pub enum DialError {
    /// The address is not a usable `host:port` pair.
    #[error("invalid address '{0}': expected host:port")]
    InvalidAddress(String),

    /// Dialer-specific refusal.
    #[error("dial rejected: {0}")]
    Rejected(String),
}

/// Opens transport connections of type `C`.
#[async_trait]
pub trait Dialer<C>: Send + Sync + 'static {
    async fn dial(&self, address: &str) -> Result<C, DialError>;
}

/// Adapter turning a synchronous closure into a [`Dialer`].
///
/// Useful when the transport connects lazily and dialing itself cannot
/// block, e.g. a channel that connects in the background.
pub struct DialFn<F> {
    f: F,
}

/// Wrap `f` as a dialer.
pub fn dial_fn<C, F>(f: F) -> DialFn<F>
where
    F: Fn(&str) -> Result<C, DialError> + Send + Sync + 'static,
{
    DialFn { f }
}

#[async_trait]
impl<C, F> Dialer<C> for DialFn<F>
where
    C: Send + 'static,
    F: Fn(&str) -> Result<C, DialError> + Send + Sync + 'static,
{
    async fn dial(&self, address: &str) -> Result<C, DialError> {
        (self.f)(address)
    }
}

/// Split `host:port`, accepting bracketed IPv6 hosts.
pub fn split_host_port(address: &str) -> Result<(&str, u16), DialError> {
    let invalid = || DialError::InvalidAddress(address.to_string());

    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(invalid());
    }
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dial_fn_forwards_address() {
        let dialer = dial_fn(|addr: &str| Ok::<_, DialError>(addr.len()));
        assert_eq!(Dialer::<usize>::dial(&dialer, "a:1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn dial_fn_forwards_errors() {
        let dialer = dial_fn(|_: &str| Err::<(), _>(DialError::Rejected("nope".into())));
        let err = Dialer::<()>::dial(&dialer, "a:1").await.unwrap_err();
        assert_eq!(err.to_string(), "dial rejected: nope");
    }

    #[test]
    fn host_port_parsing() {
        assert_eq!(split_host_port("127.0.0.1:8080").unwrap(), ("127.0.0.1", 8080));
        assert_eq!(split_host_port("svc.local:50051").unwrap(), ("svc.local", 50051));
        assert_eq!(split_host_port("[::1]:9000").unwrap(), ("::1", 9000));
        assert!(split_host_port("no-port").is_err());
        assert!(split_host_port(":80").is_err());
        assert!(split_host_port("host:0").is_err());
        assert!(split_host_port("host:99999").is_err());
    }
}
