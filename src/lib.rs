/*!
 * RTOS Compatibility Synchronization Library
 * Decoupled mutex and condition variable built on locks and semaphores
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{ContractViolation, SyncError, SyncResult};
pub use crate::core::sync::{
    Condvar, Deadline, ExclusiveLock, InitOnce, Mutex, SyncConfig, TryLock, WaitOutcome,
    WakeResult,
};
pub use monitoring::init_tracing;
