//! Shared mocks for pool integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::time::Instant;

use conn_pool::{Connection, DialError, Dialer, Liveness, PoolConfig, ReadyCheck};

/// Fake transport handle that counts closes.
#[derive(Debug)]
pub struct MockConn {
    pub id: u64,
    closes: Arc<AtomicUsize>,
}

impl MockConn {
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connection for MockConn {
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct DialerState {
    next_id: AtomicU64,
    dials: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    issued: Mutex<Vec<Arc<AtomicUsize>>>,
}

/// Dialer that counts dials and remembers every handle's close counter.
#[derive(Clone, Default)]
pub struct MockDialer {
    inner: Arc<DialerState>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` dials.
    pub fn fail_next(&self, n: usize) {
        self.inner.failures_left.store(n, Ordering::SeqCst);
    }

    /// Make every dial take `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    pub fn dial_count(&self) -> usize {
        self.inner.dials.load(Ordering::SeqCst)
    }

    /// Close counts of every handle issued so far, in dial order.
    pub fn close_counts(&self) -> Vec<usize> {
        self.inner
            .issued
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .collect()
    }
}

#[async_trait]
impl Dialer<MockConn> for MockDialer {
    async fn dial(&self, _address: &str) -> Result<MockConn, DialError> {
        self.inner.dials.fetch_add(1, Ordering::SeqCst);

        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .inner
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DialError::Rejected("mock dial failure".into()));
        }

        let closes = Arc::new(AtomicUsize::new(0));
        self.inner.issued.lock().unwrap().push(closes.clone());
        Ok(MockConn {
            id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
            closes,
        })
    }
}

struct ReadyState {
    script: Mutex<VecDeque<Liveness>>,
    fallback: Mutex<Liveness>,
    calls: AtomicUsize,
    hang: AtomicBool,
}

/// Ready check driven by the test: scripted answers first, then a fallback
/// that can be switched at any time.
#[derive(Clone)]
pub struct MockReadyCheck {
    inner: Arc<ReadyState>,
}

impl MockReadyCheck {
    pub fn new(fallback: Liveness) -> Self {
        Self {
            inner: Arc::new(ReadyState {
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(fallback),
                calls: AtomicUsize::new(0),
                hang: AtomicBool::new(false),
            }),
        }
    }

    /// Answer the next checks with `answers`, in order.
    pub fn script(&self, answers: &[Liveness]) {
        self.inner.script.lock().unwrap().extend(answers.iter().copied());
    }

    pub fn set(&self, answer: Liveness) {
        *self.inner.fallback.lock().unwrap() = answer;
    }

    /// Block every check past its deadline.
    pub fn set_hang(&self, hang: bool) {
        self.inner.hang.store(hang, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: Connection> ReadyCheck<C> for MockReadyCheck {
    async fn check(&self, _conn: &C, deadline: Instant) -> Liveness {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.hang.load(Ordering::SeqCst) {
            tokio::time::sleep_until(deadline + Duration::from_secs(3600)).await;
        }
        let scripted = self.inner.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| *self.inner.fallback.lock().unwrap())
    }
}

/// Pool timings small enough for paused-clock tests.
pub fn fast_config() -> PoolConfig {
    PoolConfig {
        timeout_ms: 5_000,
        check_ready_timeout_ms: 500,
        heartbeat_interval_ms: 1_000,
    }
}

/// Start a TCP server that accepts and holds connections open.
pub async fn start_holding_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    (addr, handle)
}
