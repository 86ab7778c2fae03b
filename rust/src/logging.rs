//! Logging macros for the scheduler with verbosity level control.
//!
//! Call sites pass the configured verbosity; events are emitted through
//! `tracing` so the embedding application decides where they end up.
//! Verbosity levels:
//! - 0: SILENT (nothing beyond warnings raised by the service)
//! - 1: CHANGES (dependency writes, deletions, progress updates)
//! - 2: CHECKS (cycle checks, guard decisions)
//! - 3: DEBUG (per-task pass internals)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: persisted writes and recomputed project values.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            ::tracing::info!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: cycle checks, dependent guards, lookups that fail.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: forward/backward pass values per task.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            ::tracing::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_ordering() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_compile() {
        // No subscriber installed; just make sure every level expands and runs
        for verbosity in [VERBOSITY_SILENT, VERBOSITY_DEBUG] {
            log_changes!(verbosity, task = "a", "changed {}", 1);
            log_checks!(verbosity, "checked {}", 2);
            log_debug!(verbosity, early_start = 0, "pass {}", 3);
        }
    }
}
