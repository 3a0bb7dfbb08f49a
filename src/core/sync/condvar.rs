/*!
 * Semaphore-Backed Condition Variable
 *
 * A condition variable built from nothing but a lock and per-waiter
 * semaphores, and not bound to any one mutex: every `wait` names the
 * external lock it releases and reacquires.
 *
 * # Protocol
 *
 * wait:
 * 1. Turn the deadline into a relative timeout
 * 2. Link a fresh waiter (semaphore at zero) at the list head
 * 3. Unlock the external lock
 * 4. Block on the waiter's own semaphore, bounded by the timeout
 * 5. Relock the external lock
 * 6. Unlink the waiter
 *
 * notify_all releases the semaphore of every waiter linked when it takes the
 * waiters lock. Because step 2 happens before step 3, a notifier that runs
 * after the caller checked its predicate under the external lock always finds
 * the waiter linked, so no wakeup is lost.
 */

use super::config::SyncConfig;
use super::time::{Deadline, WaitTimeout};
use super::traits::{ExclusiveLock, WaitOutcome, WakeResult};
use super::waiters::{Registration, Waiter, WaiterList};
use crate::core::errors::{contract_violation, ContractViolation};
use parking_lot::Mutex;
use std::pin::pin;
use std::time::{Duration, Instant};
use tracing::trace;

/// Condition variable usable with any [`ExclusiveLock`]
///
/// Supports only notify-all. Callers must recheck their predicate after every
/// return from `wait`, including `Signaled` ones.
///
/// # Examples
///
/// ```
/// use rtos_compat_sync::core::sync::{Condvar, Deadline, Mutex, WaitOutcome};
/// use std::time::Duration;
///
/// let mutex = Mutex::new();
/// let cv = Condvar::new();
///
/// mutex.lock();
/// let outcome = cv.wait(&mutex, Deadline::after(Duration::from_millis(10)));
/// assert_eq!(outcome, WaitOutcome::TimedOut);
/// assert!(mutex.held_by_current_thread());
/// mutex.unlock();
/// ```
pub struct Condvar {
    waiters: Mutex<WaiterList>,
    config: SyncConfig,
}

impl Condvar {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            waiters: Mutex::new(WaiterList::new()),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Signal every thread currently linked as a waiter
    ///
    /// Returns without waiting for anyone to wake. Threads that start waiting
    /// after this call has released the waiters lock are not signaled.
    pub fn notify_all(&self) -> WakeResult {
        let waiters = self.waiters.lock();
        let woken = WakeResult::from_count(waiters.signal_all());
        drop(waiters);

        if self.config.trace_waits {
            trace!(woken = woken.count(), "Condvar notify_all");
        }
        woken
    }

    /// Release `lock`, block until notified or `deadline`, then retake `lock`
    ///
    /// # Panics
    ///
    /// If `lock` reports it is not held by the calling thread (and ownership
    /// checks are enabled).
    pub fn wait<L>(&self, lock: &L, deadline: impl Into<Deadline>) -> WaitOutcome
    where
        L: ExclusiveLock + ?Sized,
    {
        if self.config.check_ownership && lock.held_by_current_thread() == Some(false) {
            contract_violation(ContractViolation::WaitWithoutLock);
        }

        let deadline = deadline.into();
        let timeout = deadline.timeout_from(Instant::now(), self.config.max_wait);

        let waiter = pin!(Waiter::new());
        let registration = Registration::register(&self.waiters, waiter.as_ref());

        lock.unlock();
        let signaled = registration.waiter().semaphore().acquire_timeout(timeout);
        lock.lock();

        registration.unregister();

        let outcome = if signaled {
            WaitOutcome::Signaled
        } else {
            WaitOutcome::TimedOut
        };

        if self.config.trace_waits {
            trace!(timeout = ?timeout, outcome = ?outcome, "Condvar wait finished");
        }
        outcome
    }

    /// [`wait`](Self::wait) bounded by a relative timeout
    pub fn wait_timeout<L>(&self, lock: &L, timeout: Duration) -> WaitOutcome
    where
        L: ExclusiveLock + ?Sized,
    {
        self.wait(lock, Deadline::after(timeout))
    }

    /// Wait while `condition` holds, rechecking it after every wakeup
    ///
    /// Returns `Signaled` once the condition is false, `TimedOut` if the
    /// deadline passes first. The condition is evaluated with `lock` held.
    pub fn wait_while<L, F>(
        &self,
        lock: &L,
        deadline: impl Into<Deadline>,
        mut condition: F,
    ) -> WaitOutcome
    where
        L: ExclusiveLock + ?Sized,
        F: FnMut() -> bool,
    {
        let deadline = deadline.into();
        loop {
            if !condition() {
                return WaitOutcome::Signaled;
            }
            if deadline.has_passed(Instant::now()) {
                return WaitOutcome::TimedOut;
            }
            self.wait(lock, deadline);
        }
    }

    /// Number of threads currently linked (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Whether no thread is linked
    pub fn has_no_waiters(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    /// Relative timeout a wait on `deadline` would block for right now
    pub fn timeout_for(&self, deadline: Deadline) -> WaitTimeout {
        deadline.timeout_from(Instant::now(), self.config.max_wait)
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Condvar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condvar")
            .field("waiters", &self.waiter_count())
            .field("config", &self.config)
            .finish()
    }
}
