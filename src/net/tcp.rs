//! Default TCP transport.
//!
//! # Responsibilities
//! - Dial addresses without blocking the caller (connect happens in the background)
//! - Track connectivity like an RPC client channel does
//! - Reconnect with backoff after the peer goes away
//!
//! # Design Decisions
//! - One background task per channel owns the socket
//! - State is published through a watch channel; `Shutdown` is sticky
//! - Inbound bytes are drained and discarded, the channel only keeps the
//!   link alive and observable

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::DialConfig;
use crate::net::connection::{Connection, Connectivity, ConnectivityState};
use crate::net::dialer::{split_host_port, DialError, Dialer};
use crate::resilience::Backoff;

/// Dials [`TcpChannel`]s.
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    config: DialConfig,
}

impl TcpDialer {
    pub fn new(config: DialConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Dialer<TcpChannel> for TcpDialer {
    async fn dial(&self, address: &str) -> Result<TcpChannel, DialError> {
        split_host_port(address)?;
        Ok(TcpChannel::open(address, &self.config))
    }
}

/// A self-reconnecting TCP channel to one address.
#[derive(Debug)]
pub struct TcpChannel {
    address: String,
    state: Arc<watch::Sender<ConnectivityState>>,
    cancel: CancellationToken,
}

impl TcpChannel {
    /// Start connecting to `address` in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(address: &str, config: &DialConfig) -> Self {
        let (tx, _) = watch::channel(ConnectivityState::Idle);
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();

        let worker = ChannelWorker {
            address: address.to_string(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            backoff: Backoff::from_config(config),
            state: state.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            address: address.to_string(),
            state,
            cancel,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Connection for TcpChannel {
    fn close(&self) {
        self.cancel.cancel();
        set_state(&self.state, ConnectivityState::Shutdown);
    }
}

#[async_trait]
impl Connectivity for TcpChannel {
    fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    async fn state_changed(&self, from: ConnectivityState) -> ConnectivityState {
        let mut rx = self.state.subscribe();
        let next = match rx.wait_for(|s| *s != from).await {
            Ok(s) => *s,
            Err(_) => ConnectivityState::Shutdown,
        };
        next
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Publish `next` unless the channel is already shut down.
fn set_state(tx: &watch::Sender<ConnectivityState>, next: ConnectivityState) {
    tx.send_if_modified(|current| {
        if *current == ConnectivityState::Shutdown || *current == next {
            return false;
        }
        *current = next;
        true
    });
}

struct ChannelWorker {
    address: String,
    connect_timeout: Duration,
    backoff: Backoff,
    state: Arc<watch::Sender<ConnectivityState>>,
    cancel: CancellationToken,
}

impl ChannelWorker {
    async fn run(self) {
        let mut attempt: u32 = 0;

        loop {
            set_state(&self.state, ConnectivityState::Connecting);

            let connect = time::timeout(self.connect_timeout, TcpStream::connect(&self.address));
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                r = connect => r,
            };

            match result {
                Ok(Ok(stream)) => {
                    attempt = 0;
                    set_state(&self.state, ConnectivityState::Ready);
                    tracing::debug!(address = %self.address, "TCP channel connected");

                    let outcome = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        r = drain_until_closed(&stream) => r,
                    };
                    match outcome {
                        Ok(()) => tracing::debug!(address = %self.address, "Peer closed TCP channel"),
                        Err(e) => tracing::debug!(address = %self.address, error = %e, "TCP channel read error"),
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!(address = %self.address, error = %e, attempt, "TCP connect failed");
                }
                Err(_) => {
                    tracing::debug!(
                        address = %self.address,
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        attempt,
                        "TCP connect timed out"
                    );
                }
            }

            set_state(&self.state, ConnectivityState::TransientFailure);
            attempt = attempt.saturating_add(1);
            let delay = self.backoff.delay(attempt);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = time::sleep(delay) => {}
            }
        }

        set_state(&self.state, ConnectivityState::Shutdown);
        tracing::trace!(address = %self.address, "TCP channel worker exited");
    }
}

/// Read and discard until EOF (`Ok`) or a socket error.
async fn drain_until_closed(stream: &TcpStream) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        stream.readable().await?;
        match stream.try_read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
}
