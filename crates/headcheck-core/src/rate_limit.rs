//! Process-wide request rate limiting.
//!
//! One `RateLimiter` is shared by every probe worker of a run. Permits are
//! handed out on a fixed-interval schedule: each caller reserves the next free
//! slot and sleeps until it arrives, so the aggregate rate never exceeds the
//! configured requests per second regardless of how many workers ask.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Negative rate: no throttling at all.
    Unlimited,
    /// Zero rate: no permit is ever granted.
    Stopped,
    /// One permit per interval.
    Every(Duration),
}

/// Shared throughput gate for outgoing requests.
#[derive(Debug)]
pub struct RateLimiter {
    mode: Mode,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter for `requests_per_sec`.
    ///
    /// A negative value means unlimited; zero means no request is ever
    /// permitted (callers block until cancelled).
    pub fn new(requests_per_sec: i64) -> Self {
        let mode = match requests_per_sec {
            r if r < 0 => Mode::Unlimited,
            0 => Mode::Stopped,
            r => {
                let nanos = (1_000_000_000 / r as u64).max(1);
                Mode::Every(Duration::from_nanos(nanos))
            }
        };
        Self {
            mode,
            next_slot: Mutex::new(None),
        }
    }

    /// Limiter that never throttles.
    pub fn unlimited() -> Self {
        Self::new(-1)
    }

    pub fn is_unlimited(&self) -> bool {
        self.mode == Mode::Unlimited
    }

    /// Minimum spacing between two permits, if throttled.
    pub fn interval(&self) -> Option<Duration> {
        match self.mode {
            Mode::Every(d) => Some(d),
            _ => None,
        }
    }

    /// Wait until one request may be issued.
    ///
    /// Never completes for a zero rate; race it against a cancellation signal.
    /// A caller dropped while waiting forfeits its slot.
    pub async fn acquire(&self) {
        match self.mode {
            Mode::Unlimited => {}
            Mode::Stopped => std::future::pending::<()>().await,
            Mode::Every(interval) => {
                let slot = self.reserve(interval);
                tokio::time::sleep_until(slot).await;
            }
        }
    }

    fn reserve(&self, interval: Duration) -> Instant {
        let now = Instant::now();
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = match *next {
            Some(n) if n > now => n,
            _ => now,
        };
        *next = Some(slot + interval);
        slot
    }
}
