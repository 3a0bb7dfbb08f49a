/*!
 * Counting Semaphore
 *
 * Uses parking_lot_core for futex-like parking keyed by the permit counter's
 * address. On Linux, this maps directly to futex syscalls.
 *
 * # Design
 *
 * - Permit count lives in one atomic; acquire is a CAS loop
 * - Parking validates `permits == 0` under the parking bucket lock, so a
 *   release that lands between the failed CAS and the park is never lost
 * - Releases above `max` are dropped, which makes a binary semaphore
 *   tolerate surplus signals
 */

use super::time::WaitTimeout;
use crate::core::limits::BINARY_SEMAPHORE_MAX;
use parking_lot_core::{park, unpark_one, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Bounded counting semaphore
///
/// # Performance
///
/// - Lock-free fast path for both acquire and release
/// - No allocation; safe to embed in a stack frame
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct Semaphore {
    permits: AtomicUsize,
    max: usize,
}

impl Semaphore {
    /// Semaphore holding `initial` permits, never more than `max`
    pub const fn new(initial: usize, max: usize) -> Self {
        let initial = if initial > max { max } else { initial };
        Self {
            permits: AtomicUsize::new(initial),
            max,
        }
    }

    /// Empty semaphore with a single permit slot
    pub const fn binary() -> Self {
        Self::new(0, BINARY_SEMAPHORE_MAX)
    }

    #[inline]
    fn key(&self) -> usize {
        &self.permits as *const AtomicUsize as usize
    }

    /// Current number of permits (for diagnostics)
    pub fn available(&self) -> usize {
        self.permits.load(Ordering::Relaxed)
    }

    /// Take a permit if one is available, never blocking
    pub fn try_acquire(&self) -> bool {
        let mut current = self.permits.load(Ordering::Relaxed);
        while current > 0 {
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Block until a permit is taken
    pub fn acquire(&self) {
        let acquired = self.acquire_timeout(WaitTimeout::Forever);
        debug_assert!(acquired);
    }

    /// Block for at most `timeout` waiting for a permit
    ///
    /// Returns `true` if a permit was taken, `false` on expiry. A zero
    /// timeout still polls once.
    pub fn acquire_timeout(&self, timeout: WaitTimeout) -> bool {
        // An unrepresentable finite deadline behaves as no deadline
        let deadline = timeout.expires_at(Instant::now());

        loop {
            if self.try_acquire() {
                return true;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }

            // SAFETY: the key is the address of our own counter, and the
            // callbacks neither park nor unpark.
            let result = unsafe {
                park(
                    self.key(),
                    || self.permits.load(Ordering::Relaxed) == 0,
                    || {},
                    |_key, _was_last| {},
                    DEFAULT_PARK_TOKEN,
                    deadline,
                )
            };

            match result {
                // One last poll: a release may have raced the expiry
                ParkResult::TimedOut => return self.try_acquire(),
                ParkResult::Unparked(_) | ParkResult::Invalid => continue,
            }
        }
    }

    /// Add a permit and wake one parked acquirer
    ///
    /// Never blocks. A release while already at `max` is a no-op.
    pub fn release(&self) {
        let mut current = self.permits.load(Ordering::Relaxed);
        loop {
            if current >= self.max {
                return;
            }
            match self.permits.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        // SAFETY: same key as `acquire_timeout`; the callback does nothing.
        unsafe {
            unpark_one(self.key(), |_| DEFAULT_UNPARK_TOKEN);
        }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::binary()
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("permits", &self.available())
            .field("max", &self.max)
            .finish()
    }
}
