//! Cancellation and session primitives.
//!
//! Two mechanisms cooperate here. A [`CancellationToken`] is handed to a
//! single in-flight job (a render, a merge pass) so it can be stopped
//! cooperatively. A [`SessionCounter`] is shared across generations of
//! work: bumping it both starts a new generation and invalidates every
//! token minted before the bump, which is how debouncing and superseding
//! fall out of one primitive.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

/// Token for cooperative cancellation of one job.
///
/// Clones share state: any clone's `cancel()` is observed by all.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether `cancel()` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Monotonic generation counter shared between work producers.
///
/// Each call to [`SessionCounter::next_token`] starts a new generation;
/// tokens from earlier generations report stale at their next checkpoint.
#[derive(Clone, Debug, Default)]
pub struct SessionCounter {
    current: Arc<AtomicU64>,
}

impl SessionCounter {
    /// Create a counter at generation zero.
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a new generation and return its token.
    ///
    /// Every token minted before this call becomes stale.
    pub fn next_token(&self) -> SessionToken {
        let value = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        SessionToken {
            counter: self.clone(),
            value,
        }
    }

    /// Invalidate all outstanding tokens without minting a new one.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    /// The current generation number.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// A claim on one generation of a [`SessionCounter`].
#[derive(Clone, Debug)]
pub struct SessionToken {
    counter: SessionCounter,
    value: u64,
}

impl SessionToken {
    /// Whether this token's generation is still the latest one.
    pub fn is_current(&self) -> bool {
        self.counter.current() == self.value
    }

    /// The generation number this token was minted for.
    pub fn value(&self) -> u64 {
        self.value
    }
}
