//! Decision counters for one aggregate.
//!
//! Updated from the packet paths with relaxed atomics; readers take a
//! [`L2daStatsSnapshot`].

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;

#[derive(Debug, Default)]
pub struct L2daStats {
    pub tx_mapped: AtomicU64,
    pub tx_default: AtomicU64,
    pub tx_all: AtomicU64,
    pub tx_dropped: AtomicU64,
    pub rx_rejected: AtomicU64,
    pub rx_forwarded: AtomicU64,
    pub rx_consumed: AtomicU64,
    pub clone_failures: AtomicU64,
}

impl L2daStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> L2daStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        L2daStatsSnapshot {
            tx_mapped: load(&self.tx_mapped),
            tx_default: load(&self.tx_default),
            tx_all: load(&self.tx_all),
            tx_dropped: load(&self.tx_dropped),
            rx_rejected: load(&self.rx_rejected),
            rx_forwarded: load(&self.rx_forwarded),
            rx_consumed: load(&self.rx_consumed),
            clone_failures: load(&self.clone_failures),
        }
    }
}

/// Point-in-time copy of [`L2daStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct L2daStatsSnapshot {
    /// Frames sent on their mapped link.
    pub tx_mapped: u64,
    /// Frames sent on the default link.
    pub tx_default: u64,
    /// Multicast frames duplicated on every member.
    pub tx_all: u64,
    /// Frames discarded for lack of a capable link.
    pub tx_dropped: u64,
    /// Frames refused by RX dedup.
    pub rx_rejected: u64,
    /// Clones queued towards other members.
    pub rx_forwarded: u64,
    /// Unicast frames handed to their mapped link instead of the local stack.
    pub rx_consumed: u64,
    pub clone_failures: u64,
}

/// Rate limiter for error logs on the packet paths.
///
/// Allows a burst of `per_second` messages and counts what it suppresses so
/// the next permitted message can report it.
pub(crate) struct LogLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    suppressed: AtomicU64,
}

impl LogLimiter {
    pub(crate) fn per_second(per_second: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            suppressed: AtomicU64::new(0),
        }
    }

    /// `Some(n)` when a message may be logged now, `n` being the number of
    /// messages dropped since the last one.
    pub(crate) fn check(&self) -> Option<u64> {
        if self.limiter.check().is_ok() {
            Some(self.suppressed.swap(0, Ordering::Relaxed))
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}

impl std::fmt::Debug for LogLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLimiter")
            .field("suppressed", &self.suppressed.load(Ordering::Relaxed))
            .finish()
    }
}
