//! Daemon health and diagnostics.
//!
//! Tracks tick counters and derives a coarse health status from the
//! runtime state and the overrun rate; the final snapshot feeds the
//! shutdown summary in the log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysmon_common::metrics::TickMetrics;
use sysmon_common::state::RuntimeState;

/// Health status of the monitor daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Operating normally.
    Healthy,
    /// Operational but missing its cadence too often.
    Degraded,
    /// Faulted.
    Unhealthy,
    /// Starting up.
    Starting,
    /// Shutting down.
    ShuttingDown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Starting => write!(f, "starting"),
            HealthStatus::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

/// Snapshot of daemon diagnostics at a point in time.
#[derive(Debug, Clone)]
pub struct DiagnosticsSnapshot {
    /// Current health status.
    pub health: HealthStatus,
    /// Current runtime state.
    pub state: RuntimeState,
    /// Total ticks executed.
    pub tick_count: u64,
    /// Number of tick overruns.
    pub overrun_count: u64,
    /// Uptime since daemon start.
    pub uptime: Duration,
    /// Last tick execution time.
    pub last_tick_time: Option<Duration>,
    /// Average tick time (if available).
    pub avg_tick_time: Option<Duration>,
    /// Maximum tick time observed.
    pub max_tick_time: Option<Duration>,
}

/// Shared diagnostics state updated by the run loop.
#[derive(Debug)]
pub struct DiagnosticsState {
    /// Total ticks executed.
    tick_count: AtomicU64,
    /// Number of tick overruns.
    overrun_count: AtomicU64,
    /// Last tick time in nanoseconds (0 = none yet).
    last_tick_ns: AtomicU64,
    /// Daemon start time.
    start_time: Instant,
}

impl Default for DiagnosticsState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsState {
    /// Create new diagnostics state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            overrun_count: AtomicU64::new(0),
            last_tick_ns: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed tick.
    pub fn record_tick(&self, execution_time: Duration, overrun: bool) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.last_tick_ns
            .store(execution_time.as_nanos() as u64, Ordering::Relaxed);
        if overrun {
            self.overrun_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    /// Get overrun count.
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count.load(Ordering::Relaxed)
    }

    /// Get uptime since daemon start.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get last tick time.
    pub fn last_tick_time(&self) -> Option<Duration> {
        let ns = self.last_tick_ns.load(Ordering::Relaxed);
        (ns > 0).then(|| Duration::from_nanos(ns))
    }
}

/// Aggregates runtime information into reportable snapshots.
pub struct DiagnosticsCollector {
    state: Arc<DiagnosticsState>,
}

impl DiagnosticsCollector {
    /// Create a new collector over shared state.
    #[must_use]
    pub fn new(state: Arc<DiagnosticsState>) -> Self {
        Self { state }
    }

    /// Determine health status from the runtime state.
    pub fn health_from_state(&self, runtime_state: RuntimeState) -> HealthStatus {
        match runtime_state {
            RuntimeState::Boot | RuntimeState::Init | RuntimeState::Ready => HealthStatus::Starting,
            RuntimeState::Run => {
                let ticks = self.state.tick_count();
                let overrun_rate = if ticks > 0 {
                    self.state.overrun_count() as f64 / ticks as f64
                } else {
                    0.0
                };

                // More than 1% of ticks missing the cadence is degraded
                if overrun_rate > 0.01 {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                }
            }
            RuntimeState::SafeStop => HealthStatus::ShuttingDown,
            RuntimeState::Fault => HealthStatus::Unhealthy,
        }
    }

    /// Create a snapshot of current diagnostics.
    pub fn snapshot(&self, runtime_state: RuntimeState, metrics: &TickMetrics) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            health: self.health_from_state(runtime_state),
            state: runtime_state,
            tick_count: self.state.tick_count(),
            overrun_count: self.state.overrun_count(),
            uptime: self.state.uptime(),
            last_tick_time: self.state.last_tick_time(),
            avg_tick_time: metrics.mean(),
            max_tick_time: metrics.max(),
        }
    }

    /// Get the underlying state for updates.
    pub fn state(&self) -> &Arc<DiagnosticsState> {
        &self.state
    }
}
