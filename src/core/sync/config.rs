/*!
 * Synchronization Configuration
 *
 * Runtime knobs for condition variable waits
 */

use crate::core::limits::MAX_FINITE_WAIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Condition variable configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Panic when waiting with a lock the caller does not hold
    pub check_ownership: bool,
    /// Longest finite wait; deadlines further out wait unbounded
    pub max_wait: Duration,
    /// Emit a trace event per wait and notify
    pub trace_waits: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            check_ownership: true,
            max_wait: MAX_FINITE_WAIT,
            trace_waits: false,
        }
    }
}

impl SyncConfig {
    /// Every check on, every wait traced (debugging)
    pub const fn strict() -> Self {
        Self {
            check_ownership: true,
            max_wait: MAX_FINITE_WAIT,
            trace_waits: true,
        }
    }

    /// Skip the ownership check (locks that cannot report an owner)
    pub const fn unchecked() -> Self {
        Self {
            check_ownership: false,
            max_wait: MAX_FINITE_WAIT,
            trace_waits: false,
        }
    }

    /// Override the finite wait ceiling
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"trace_waits": true}"#).unwrap();
        assert_eq!(
            config,
            SyncConfig {
                trace_waits: true,
                ..SyncConfig::default()
            }
        );
    }

    #[test]
    fn test_presets() {
        assert!(SyncConfig::strict().trace_waits);
        assert!(!SyncConfig::unchecked().check_ownership);
        assert_eq!(
            SyncConfig::default().with_max_wait(Duration::from_secs(1)).max_wait,
            Duration::from_secs(1)
        );
    }
}
