//! Reader/writer lock guarding the steering table and the default link.
//!
//! # Usage contract
//!
//! The lock is taken on packet TX/RX paths, so critical sections must be
//! short and must never block on I/O, sleep, or wait on another aggregate
//! lock. Hold a guard only across table reads/writes and link predicate
//! checks; send frames after the guard is dropped.
//!
//! Guards are `!Send`, so they cannot be carried across an `.await` in a
//! spawned task. From async code use [`SteeringLock::try_read`] /
//! [`SteeringLock::try_write`] and treat `None` as "busy, decide again".
//!
//! Lock order: this lock first, then any lock owned by the notifier. A
//! notifier must never call back into the context that is notifying it.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader/writer lock that spins briefly before parking. Many readers or
/// one writer.
#[derive(Debug, Default)]
pub struct SteeringLock<T> {
    inner: RwLock<T>,
}

impl<T> SteeringLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Shared access for TX resolution, RX admission and queries.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Exclusive access for configuration and link events.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.inner.try_read()
    }

    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.inner.try_write()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
