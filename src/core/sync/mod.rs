/*!
 * Synchronization Primitives
 *
 * A mutex and a condition variable for platforms whose only native blocking
 * primitives are locks and semaphores:
 * - Mutex wrapper with owner tracking
 * - Condition variable not bound to any one mutex, built from a waiters lock
 *   and one private semaphore per waiting thread
 * - Handle-style create/destroy API for explicitly managed lifetimes
 *
 * # Architecture
 *
 * `Condvar::wait` links a stack-allocated waiter into an intrusive list
 * before releasing the caller's lock, so a notify can never slip between the
 * caller's predicate check and the start of the wait.
 *
 * # Use Cases
 *
 * - **Runtime porting layers**: POSIX-style mutex/condvar pairs over an RTOS
 * - **Deadline waits**: block until notified or an absolute monotonic deadline
 * - **Lazy setup**: fallible, retryable one-time initialization
 */

mod condvar;
mod config;
mod handle;
mod init_once;
mod mutex;
mod semaphore;
mod time;
mod traits;
mod waiters;

pub use condvar::Condvar;
pub use config::SyncConfig;
pub use handle::{
    condvar_create, condvar_destroy, condvar_notify_all, condvar_wait, mutex_create,
    mutex_destroy, mutex_lock, mutex_try_lock, mutex_unlock, CondvarHandle, MutexHandle,
};
pub use init_once::InitOnce;
pub use mutex::{Mutex, MutexGuard};
pub use semaphore::Semaphore;
pub use time::{Deadline, WaitTimeout};
pub use traits::{ExclusiveLock, TryLock, WaitOutcome, WakeResult};
