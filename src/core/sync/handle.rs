/*!
 * Handle API
 *
 * Create/use/destroy functions over opaque heap handles, for runtimes that
 * manage primitive lifetimes explicitly instead of through ownership.
 *
 * - Creating into a handle that is already live is a contract violation
 * - Destroying an empty handle is a no-op
 * - Allocation failure is reported, never aborted on
 */

use super::condvar::Condvar;
use super::mutex::Mutex;
use super::time::Deadline;
use super::traits::{TryLock, WaitOutcome};
use crate::core::errors::{contract_violation, ContractViolation, SyncError, SyncResult};
use std::alloc::{alloc, Layout};
use tracing::{debug, trace};

/// Slot holding a live mutex, or `None`
pub type MutexHandle = Option<Box<Mutex>>;

/// Slot holding a live condition variable, or `None`
pub type CondvarHandle = Option<Box<Condvar>>;

/// Box `value` without aborting the process on allocation failure
fn try_box<T>(value: T, what: &'static str) -> SyncResult<Box<T>> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }

    // SAFETY: the layout has a non-zero size.
    let ptr = unsafe { alloc(layout) } as *mut T;
    if ptr.is_null() {
        return Err(SyncError::AllocationFailed {
            what,
            size: layout.size(),
        });
    }

    // SAFETY: `ptr` is a fresh, properly aligned allocation of `Layout::new::<T>()`,
    // which is exactly what `Box<T>` frees.
    unsafe {
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

pub fn mutex_create(out: &mut MutexHandle) -> SyncResult<()> {
    if out.is_some() {
        contract_violation(ContractViolation::ReinitializedHandle("mutex"));
    }
    *out = Some(try_box(Mutex::new(), "mutex")?);
    debug!("Mutex created");
    Ok(())
}

pub fn mutex_lock(mutex: &Mutex) -> SyncResult<()> {
    mutex.lock();
    Ok(())
}

/// Never blocks; `WouldBlock` if another thread holds the mutex
pub fn mutex_try_lock(mutex: &Mutex) -> TryLock {
    mutex.try_lock()
}

pub fn mutex_unlock(mutex: &Mutex) -> SyncResult<()> {
    mutex.unlock();
    Ok(())
}

pub fn mutex_destroy(handle: &mut MutexHandle) {
    if handle.take().is_some() {
        debug!("Mutex destroyed");
    }
}

pub fn condvar_create(out: &mut CondvarHandle) -> SyncResult<()> {
    if out.is_some() {
        contract_violation(ContractViolation::ReinitializedHandle("condition variable"));
    }
    *out = Some(try_box(Condvar::new(), "condition variable")?);
    debug!("Condition variable created");
    Ok(())
}

pub fn condvar_notify_all(condvar: &Condvar) -> SyncResult<()> {
    let woken = condvar.notify_all();
    trace!(woken = woken.count(), "condvar_notify_all");
    Ok(())
}

/// Wait on `condvar`, releasing `mutex` meanwhile
///
/// `deadline` of [`Deadline::Never`] waits forever. A timeout is
/// `Ok(WaitOutcome::TimedOut)`, not an error.
pub fn condvar_wait(
    condvar: &Condvar,
    mutex: &Mutex,
    deadline: impl Into<Deadline>,
) -> SyncResult<WaitOutcome> {
    Ok(condvar.wait(mutex, deadline))
}

pub fn condvar_destroy(handle: &mut CondvarHandle) {
    if handle.take().is_some() {
        debug!("Condition variable destroyed");
    }
}
