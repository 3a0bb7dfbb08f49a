/*!
 * Synchronization Limits and Constants
 *
 * Centralized location for wait bounds and semaphore capacities.
 */

use std::time::Duration;

// =============================================================================
// WAIT BOUNDS
// =============================================================================

/// Longest finite wait a condition variable will schedule (~49.7 days)
/// Deadlines further out than this are waited on without a timeout.
/// Matches the 32-bit millisecond range of RTOS semaphore waits.
pub const MAX_FINITE_WAIT: Duration = Duration::from_millis(u32::MAX as u64);

// =============================================================================
// SEMAPHORE CAPACITY
// =============================================================================

/// Permit ceiling of a binary semaphore
/// Surplus releases above this are dropped.
pub const BINARY_SEMAPHORE_MAX: usize = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_finite_wait_is_u32_millis() {
        assert_eq!(MAX_FINITE_WAIT.as_millis(), u32::MAX as u128);
    }
}
