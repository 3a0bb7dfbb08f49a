/*!
 * Synchronization Traits
 *
 * The lock seam between a condition variable and whatever mutex the caller
 * guards its state with, plus the small result types shared by the primitives.
 */

use serde::{Deserialize, Serialize};

/// Outcome of a non-blocking lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryLock {
    /// The lock is now held by the calling thread
    Acquired,
    /// Another thread holds the lock; the caller did not block
    WouldBlock,
}

impl TryLock {
    #[inline(always)]
    pub fn is_acquired(&self) -> bool {
        matches!(self, TryLock::Acquired)
    }
}

/// Why a condition variable wait returned
///
/// `Signaled` does not promise the caller's predicate holds; recheck it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
}

impl WaitOutcome {
    #[inline(always)]
    pub fn timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

/// Result of a wake operation
///
/// Compact representation (single usize) for efficient returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Signaled N linked waiters (N >= 1)
    Woken(usize),
    /// No waiters were linked
    NoWaiters,
}

impl WakeResult {
    pub(crate) fn from_count(count: usize) -> Self {
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }

    /// Check if any waiters were signaled
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of signaled waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Exclusive, non-recursive lock usable as a condition variable's external mutex
///
/// Implementations must be:
/// - **Thread-safe**: lock and unlock may be called from any thread
/// - **Owner-bound**: only the locking thread unlocks
///
/// A condition variable never binds to one lock at creation; every `wait`
/// call names the lock it releases and reacquires.
pub trait ExclusiveLock: Send + Sync {
    /// Block until the calling thread holds the lock
    fn lock(&self);

    /// Take the lock if it is free, never blocking
    fn try_lock(&self) -> TryLock;

    /// Release a lock held by the calling thread
    fn unlock(&self);

    /// Whether the calling thread holds the lock
    ///
    /// `None` means the lock cannot tell, which leaves the wait
    /// precondition unchecked.
    fn held_by_current_thread(&self) -> Option<bool> {
        None
    }
}
