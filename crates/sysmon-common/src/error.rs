use thiserror::Error;

/// Monitor error types covering configuration, probe failures, and runtime faults.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic runtime fault.
    #[error("runtime fault: {0}")]
    Fault(String),

    /// A collaborator read failed for this tick.
    ///
    /// Transient by design: the loop substitutes a safe default and
    /// retries on the next tick.
    #[error("probe error: {what}: {detail}")]
    Probe {
        /// Which counter source failed (e.g. "cpu-temperature").
        what: String,
        /// Underlying failure description.
        detail: String,
    },

    /// Watchdog timer expired without being kicked.
    #[error("watchdog timeout: {0}")]
    WatchdogTimeout(String),

    /// Tick execution exceeded the configured deadline.
    #[error("tick overrun: expected {expected_ns}ns, actual {actual_ns}ns")]
    TickOverrun {
        /// Expected tick time in nanoseconds.
        expected_ns: u64,
        /// Actual tick time in nanoseconds.
        actual_ns: u64,
    },

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl MonitorError {
    /// Build a [`MonitorError::Probe`] from a source name and any displayable cause.
    pub fn probe(what: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Probe {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

/// Convenience type alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
