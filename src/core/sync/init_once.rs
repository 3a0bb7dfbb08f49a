/*!
 * One-Time Initialization
 *
 * Every `InitOnce` in the process is serialized through one global
 * re-entrant lock. A failed initializer leaves the cell untouched so the
 * next caller retries.
 */

use crate::core::errors::{contract_violation, ContractViolation};
use parking_lot::{const_reentrant_mutex, ReentrantMutex};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

/// Re-entrant so a nested call reaches the state check instead of deadlocking
static INIT_ONCE_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

const NOT_STARTED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const DONE: u8 = 2;

/// Run-once cell for fallible initializers
#[derive(Debug)]
pub struct InitOnce {
    state: AtomicU8,
}

impl InitOnce {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(NOT_STARTED),
        }
    }

    /// Run `init` unless an earlier call already succeeded
    ///
    /// An `Err` from `init` is returned and the next call runs it again.
    ///
    /// # Panics
    ///
    /// If called again from inside `init`.
    pub fn call<E, F>(&self, init: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        let _lock = INIT_ONCE_LOCK.lock();

        match self.state.load(Ordering::Acquire) {
            DONE => return Ok(()),
            IN_PROGRESS => contract_violation(ContractViolation::RecursiveInitOnce),
            _ => {}
        }

        self.state.store(IN_PROGRESS, Ordering::Relaxed);
        let reset = ResetOnUnwind(&self.state);
        let result = init();
        std::mem::forget(reset);

        match result {
            Ok(()) => {
                self.state.store(DONE, Ordering::Release);
                debug!("One-time initialization completed");
                Ok(())
            }
            Err(err) => {
                self.state.store(NOT_STARTED, Ordering::Relaxed);
                debug!("One-time initialization failed, will retry on next call");
                Err(err)
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }
}

impl Default for InitOnce {
    fn default() -> Self {
        Self::new()
    }
}

/// Puts the cell back to `NOT_STARTED` if the initializer panics
struct ResetOnUnwind<'a>(&'a AtomicU8);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(NOT_STARTED, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_runs_once() {
        let once = InitOnce::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result: Result<(), ()> = once.call(|| {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(())
            });
            assert!(result.is_ok());
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(once.is_done());
    }

    #[test]
    fn test_failure_allows_retry() {
        let once = InitOnce::new();

        assert_eq!(once.call(|| Err("not yet")), Err("not yet"));
        assert!(!once.is_done());
        assert_eq!(once.call(|| Ok::<(), &str>(())), Ok(()));
        assert!(once.is_done());
    }

    #[test]
    fn test_panic_resets_state() {
        let once = Arc::new(InitOnce::new());
        let once_clone = once.clone();

        let joined = thread::spawn(move || {
            let _: Result<(), ()> = once_clone.call(|| panic!("initializer exploded"));
        })
        .join();
        assert!(joined.is_err());

        assert!(!once.is_done());
        assert_eq!(once.call(|| Ok::<(), ()>(())), Ok(()));
    }

    #[test]
    #[should_panic(expected = "recursive init_once call")]
    fn test_recursive_call_panics() {
        let once = InitOnce::new();
        let _: Result<(), ()> = once.call(|| once.call(|| Ok(())));
    }

    #[test]
    fn test_concurrent_callers_run_once() {
        let once = Arc::new(InitOnce::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let once = once.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    once.call(|| {
                        calls.fetch_add(1, Ordering::Relaxed);
                        Ok::<(), ()>(())
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
