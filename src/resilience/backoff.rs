//! Exponential reconnect backoff with jitter.

use std::time::Duration;
use rand::Rng;

use crate::config::DialConfig;

/// Reconnect delay policy for a channel.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms: max_ms.max(base_ms) }
    }

    pub fn from_config(config: &DialConfig) -> Self {
        Self::new(config.backoff_base_ms, config.backoff_max_ms)
    }

    /// Delay before reconnect attempt number `attempt` (1-based).
    ///
    /// Attempt 0 never waits. The delay doubles per attempt up to the cap,
    /// then up to 10% jitter is added so channels to one dead host do not
    /// reconnect in lockstep.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u64.saturating_pow(attempt - 1);
        let capped = self.base_ms.saturating_mul(factor).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let backoff = Backoff::new(100, 1000);
        assert_eq!(backoff.delay(0), Duration::ZERO);

        let d1 = backoff.delay(1).as_millis();
        assert!((100..110).contains(&d1));

        let d2 = backoff.delay(2).as_millis();
        assert!((200..220).contains(&d2));

        let capped = backoff.delay(30).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn max_never_below_base() {
        let backoff = Backoff::new(500, 10);
        assert!(backoff.delay(1).as_millis() >= 500);
    }
}
