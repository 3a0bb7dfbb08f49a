/*!
 * Mutex Wrapper
 *
 * One parking_lot raw mutex plus the id of the thread holding it. Owner
 * tracking is what lets a condition variable check its wait precondition
 * and what makes `unlock` safe to expose.
 */

use super::traits::{ExclusiveLock, TryLock};
use crate::core::errors::{contract_violation, ContractViolation};
use parking_lot::lock_api::{GetThreadId, RawMutex as _};
use parking_lot::{RawMutex, RawThreadId};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owner slot value while nobody holds the lock
const NO_OWNER: usize = 0;

#[inline]
fn current_thread() -> NonZeroUsize {
    RawThreadId::INIT.nonzero_thread_id()
}

/// Exclusive, non-recursive mutex decoupled from the data it guards
///
/// Unlike `parking_lot::Mutex<T>`, locking yields no guard: `lock` and
/// `unlock` are separate calls, as a condition variable needs when it
/// releases the lock on the caller's behalf.
pub struct Mutex {
    raw: RawMutex,
    owner: AtomicUsize,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            raw: RawMutex::INIT,
            owner: AtomicUsize::new(NO_OWNER),
        }
    }

    /// Block until the calling thread holds the lock
    ///
    /// # Panics
    ///
    /// If the calling thread already holds it.
    pub fn lock(&self) {
        let me = current_thread().get();
        if self.owner.load(Ordering::Relaxed) == me {
            contract_violation(ContractViolation::RecursiveLock);
        }
        self.raw.lock();
        self.owner.store(me, Ordering::Relaxed);
    }

    /// Take the lock if it is free, never blocking
    pub fn try_lock(&self) -> TryLock {
        if self.raw.try_lock() {
            self.owner.store(current_thread().get(), Ordering::Relaxed);
            TryLock::Acquired
        } else {
            TryLock::WouldBlock
        }
    }

    /// Release the lock
    ///
    /// # Panics
    ///
    /// If the calling thread does not hold it.
    pub fn unlock(&self) {
        if !self.held_by_current_thread() {
            contract_violation(ContractViolation::UnlockNotOwner);
        }
        self.owner.store(NO_OWNER, Ordering::Relaxed);
        // SAFETY: the owner check above proves this thread locked `raw`.
        unsafe { self.raw.unlock() };
    }

    /// Lock and return a guard that unlocks on drop
    pub fn lock_scoped(&self) -> MutexGuard<'_> {
        self.lock();
        MutexGuard { mutex: self }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    #[inline]
    pub fn held_by_current_thread(&self) -> bool {
        self.owner.load(Ordering::Relaxed) == current_thread().get()
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl ExclusiveLock for Mutex {
    #[inline]
    fn lock(&self) {
        Mutex::lock(self)
    }

    #[inline]
    fn try_lock(&self) -> TryLock {
        Mutex::try_lock(self)
    }

    #[inline]
    fn unlock(&self) {
        Mutex::unlock(self)
    }

    #[inline]
    fn held_by_current_thread(&self) -> Option<bool> {
        Some(Mutex::held_by_current_thread(self))
    }
}

/// RAII guard returned by [`Mutex::lock_scoped`]
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
}

impl MutexGuard<'_> {
    /// The mutex this guard holds, e.g. to pass to a condition variable wait
    pub fn mutex(&self) -> &Mutex {
        self.mutex
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
