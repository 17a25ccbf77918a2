//! Runtime state machine for the monitor lifecycle.
//!
//! State transitions follow the daemon lifecycle:
//! BOOT → INIT → READY → RUN → FAULT → SAFE_STOP
//!
//! Fault transitions are allowed from most states so a broken probe
//! setup is caught wherever it surfaces.

use crate::error::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime states for the monitor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeState {
    /// Initial power-on state.
    #[default]
    Boot,
    /// Configuration loading and validation.
    Init,
    /// Probes resolved, renderer attached, ready to tick.
    Ready,
    /// Normal cyclic sampling.
    Run,
    /// Fault detected; the loop has stopped ticking.
    Fault,
    /// Clean shutdown.
    SafeStop,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boot => write!(f, "BOOT"),
            Self::Init => write!(f, "INIT"),
            Self::Ready => write!(f, "READY"),
            Self::Run => write!(f, "RUN"),
            Self::Fault => write!(f, "FAULT"),
            Self::SafeStop => write!(f, "SAFE_STOP"),
        }
    }
}

impl RuntimeState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: RuntimeState) -> bool {
        use RuntimeState::{Boot, Fault, Init, Ready, Run, SafeStop};

        matches!(
            (self, target),
            // Normal forward progression
            (Boot, Init)
                | (Init, Ready)
                | (Ready, Run)
                // Fault transitions (allowed from any startup or running state)
                | (Boot, Fault)
                | (Init, Fault)
                | (Ready, Fault)
                | (Run, Fault)
                // Safe stop from fault, run, or ready
                | (Fault, SafeStop)
                | (Run, SafeStop)
                | (Ready, SafeStop)
                // Recovery: fault -> init to retry
                | (Fault, Init)
                // Restart after safe stop
                | (SafeStop, Boot)
        )
    }

    /// Attempt to transition to `target`, returning error if invalid.
    pub fn transition_to(&mut self, target: RuntimeState) -> MonitorResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(MonitorError::InvalidStateTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns true if the monitor is ticking or about to.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Ready | Self::Run)
    }

    /// Returns true if the monitor is in a fault or stopped state.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Fault | Self::SafeStop)
    }
}

/// State machine wrapper with transition history tracking.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: RuntimeState,
    previous: Option<RuntimeState>,
    transition_count: u64,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine starting in BOOT.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RuntimeState::Boot,
            previous: None,
            transition_count: 0,
        }
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> RuntimeState {
        self.current
    }

    /// Get the previous state (if any transition occurred).
    #[must_use]
    pub fn previous_state(&self) -> Option<RuntimeState> {
        self.previous
    }

    /// Get total number of transitions.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt a state transition.
    pub fn transition(&mut self, target: RuntimeState) -> MonitorResult<()> {
        if self.current.can_transition_to(target) {
            self.previous = Some(self.current);
            self.current = target;
            self.transition_count += 1;
            Ok(())
        } else {
            Err(MonitorError::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Force a transition to FAULT state (always succeeds from operational states).
    pub fn enter_fault(&mut self) {
        if self.current.can_transition_to(RuntimeState::Fault) {
            self.previous = Some(self.current);
            self.current = RuntimeState::Fault;
            self.transition_count += 1;
        }
    }
}
