/*!
 * Error Types
 * Recoverable failures (thiserror + miette) and fatal contract violations
 */

use miette::Diagnostic;
use thiserror::Error;
use tracing::error;

/// Result type for fallible synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Recoverable synchronization errors
///
/// A timed-out wait is not an error; it is reported through
/// [`WaitOutcome::TimedOut`](crate::core::sync::WaitOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SyncError {
    #[error("Failed to allocate {what} ({size} bytes)")]
    #[diagnostic(
        code(sync::allocation_failed),
        help("System may be low on memory. Retry or fail the enclosing operation.")
    )]
    AllocationFailed { what: &'static str, size: usize },
}

/// Programmer errors that leave a primitive in a state nobody can reason about
///
/// These are never returned. [`contract_violation`] logs and panics with the
/// variant's message; the offending thread does not continue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Diagnostic)]
pub enum ContractViolation {
    #[error("possible attempt to reinitialize a live {0}")]
    #[diagnostic(code(sync::reinitialized_handle))]
    ReinitializedHandle(&'static str),

    #[error("waited on a condition variable with a mutex not held by the current thread")]
    #[diagnostic(code(sync::wait_without_lock))]
    WaitWithoutLock,

    #[error("waiter node inexplicably disappeared from condition variable")]
    #[diagnostic(code(sync::waiter_vanished))]
    WaiterVanished,

    #[error("recursive lock attempt on a non-recursive mutex")]
    #[diagnostic(code(sync::recursive_lock))]
    RecursiveLock,

    #[error("attempted to unlock a mutex not held by the current thread")]
    #[diagnostic(code(sync::unlock_not_owner))]
    UnlockNotOwner,

    #[error("unexpected init state (recursive init_once call?)")]
    #[diagnostic(code(sync::recursive_init_once))]
    RecursiveInitOnce,
}

/// Abort the current thread on a broken invariant
#[cold]
#[track_caller]
pub fn contract_violation(violation: ContractViolation) -> ! {
    error!(violation = ?violation, "Synchronization contract violated");
    panic!("{}", violation)
}
