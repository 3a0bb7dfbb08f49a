/*!
 * Monotonic Deadlines
 *
 * Absolute deadlines on the monotonic clock and their conversion into the
 * relative timeouts a semaphore can block for.
 */

use std::time::{Duration, Instant};

/// Absolute point on the monotonic clock at which a wait gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// Wait until signaled
    Never,
    /// Give up once this instant has passed
    At(Instant),
}

/// Relative bound on a single blocking call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitTimeout {
    Forever,
    /// `For(Duration::ZERO)` is a single non-blocking poll
    For(Duration),
}

impl Deadline {
    /// Deadline `timeout` from now; saturates to `Never` if unrepresentable
    pub fn after(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Deadline::Never, Deadline::At)
    }

    #[inline]
    pub fn is_never(&self) -> bool {
        matches!(self, Deadline::Never)
    }

    pub fn has_passed(&self, now: Instant) -> bool {
        match self {
            Deadline::Never => false,
            Deadline::At(at) => *at <= now,
        }
    }

    /// Time left before the deadline, `None` for `Never`
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self {
            Deadline::Never => None,
            Deadline::At(at) => Some(at.saturating_duration_since(now)),
        }
    }

    /// Relative timeout for a wait starting at `now`
    ///
    /// Anything longer than `max_wait` is waited on without a bound.
    pub fn timeout_from(&self, now: Instant, max_wait: Duration) -> WaitTimeout {
        match self.remaining(now) {
            None => WaitTimeout::Forever,
            Some(left) if left > max_wait => WaitTimeout::Forever,
            Some(left) => WaitTimeout::For(left),
        }
    }
}

impl From<Instant> for Deadline {
    fn from(at: Instant) -> Self {
        Deadline::At(at)
    }
}

impl From<Option<Instant>> for Deadline {
    fn from(at: Option<Instant>) -> Self {
        at.map_or(Deadline::Never, Deadline::At)
    }
}

impl WaitTimeout {
    /// Absolute instant this timeout ends at, `None` if it never does
    pub(crate) fn expires_at(&self, start: Instant) -> Option<Instant> {
        match self {
            WaitTimeout::Forever => None,
            WaitTimeout::For(d) => start.checked_add(*d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::MAX_FINITE_WAIT;
    use proptest::prelude::*;

    #[test]
    fn test_never_waits_forever() {
        let now = Instant::now();
        assert_eq!(
            Deadline::Never.timeout_from(now, MAX_FINITE_WAIT),
            WaitTimeout::Forever
        );
        assert!(!Deadline::Never.has_passed(now));
    }

    #[test]
    fn test_past_deadline_is_zero_poll() {
        let now = Instant::now();
        let past = Deadline::At(now);
        let later = now + Duration::from_millis(10);
        assert_eq!(
            past.timeout_from(later, MAX_FINITE_WAIT),
            WaitTimeout::For(Duration::ZERO)
        );
        assert!(past.has_passed(later));
    }

    #[test]
    fn test_far_deadline_clamps_to_forever() {
        let now = Instant::now();
        let far = Deadline::At(now + MAX_FINITE_WAIT + Duration::from_secs(1));
        assert_eq!(far.timeout_from(now, MAX_FINITE_WAIT), WaitTimeout::Forever);
    }

    #[test]
    fn test_unrepresentable_deadline_is_never() {
        assert_eq!(Deadline::after(Duration::MAX), Deadline::Never);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Deadline::from(None::<Instant>), Deadline::Never);
        let now = Instant::now();
        assert_eq!(Deadline::from(Some(now)), Deadline::At(now));
    }

    proptest! {
        #[test]
        fn prop_timeout_never_exceeds_max_wait(offset_ms in 0u64..10_000, max_ms in 1u64..5_000) {
            let now = Instant::now();
            let max_wait = Duration::from_millis(max_ms);
            let deadline = Deadline::At(now + Duration::from_millis(offset_ms));
            match deadline.timeout_from(now, max_wait) {
                WaitTimeout::For(d) => {
                    prop_assert!(d <= max_wait);
                    prop_assert_eq!(d, Duration::from_millis(offset_ms));
                }
                WaitTimeout::Forever => prop_assert!(offset_ms > max_ms),
            }
        }
    }
}
