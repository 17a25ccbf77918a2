//! Software watchdog for stall detection.
//!
//! The monitor loop kicks the watchdog once per tick. A monitor thread
//! checks several times per timeout period and invokes the trigger
//! callback once if the loop stops kicking - a hung probe or a wedged
//! renderer then surfaces as a fault instead of a silently frozen
//! display.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use sysmon_common::error::{MonitorError, MonitorResult};
use tracing::{debug, error, info, warn};

/// Watchdog timer that monitors the tick loop.
#[derive(Debug)]
pub struct Watchdog {
    /// Shared state between the loop and the monitor thread.
    state: Arc<WatchdogState>,
    /// Handle to the monitor thread.
    monitor_handle: Option<JoinHandle<()>>,
    /// Configured timeout duration.
    timeout: Duration,
}

/// Shared state for watchdog synchronization.
#[derive(Debug)]
struct WatchdogState {
    /// Timestamp of last kick (nanoseconds since start).
    last_kick_ns: AtomicU64,
    /// Monotonic start time for relative timestamps.
    start_time: Instant,
    /// Flag set when the watchdog triggers.
    triggered: AtomicBool,
    /// Flag to signal the monitor thread to stop.
    stop_requested: AtomicBool,
}

impl WatchdogState {
    fn new() -> Self {
        Self {
            last_kick_ns: AtomicU64::new(0),
            start_time: Instant::now(),
            triggered: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        }
    }

    fn elapsed_ns(&self) -> u64 {
        self.start_time.elapsed().as_nanos() as u64
    }

    fn kick(&self) {
        self.last_kick_ns.store(self.elapsed_ns(), Ordering::Release);
    }

    fn is_timed_out(&self, timeout_ns: u64) -> bool {
        let last = self.last_kick_ns.load(Ordering::Acquire);
        self.elapsed_ns().saturating_sub(last) > timeout_ns
    }
}

impl Watchdog {
    /// Create a watchdog with the specified timeout, in a stopped state.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(WatchdogState::new()),
            monitor_handle: None,
            timeout,
        }
    }

    /// Start the monitor thread; `on_trigger` runs once on expiry.
    pub fn start<F>(&mut self, on_trigger: F) -> MonitorResult<()>
    where
        F: Fn() + Send + 'static,
    {
        if self.monitor_handle.is_some() {
            return Err(MonitorError::Config("Watchdog already running".into()));
        }

        info!(timeout_ms = self.timeout.as_millis(), "Starting watchdog");

        self.state.stop_requested.store(false, Ordering::Release);
        self.state.triggered.store(false, Ordering::Release);

        // Baseline kick so the timeout counts from start, not from boot
        self.state.kick();

        let state = Arc::clone(&self.state);
        let timeout_ns = self.timeout.as_nanos() as u64;
        // Check 4x per timeout period, at least every 10 ms
        let check_interval = (self.timeout / 4).max(Duration::from_millis(10));

        let handle = thread::Builder::new()
            .name("sysmon-watchdog".into())
            .spawn(move || {
                debug!("Watchdog monitor thread started");

                while !state.stop_requested.load(Ordering::Acquire) {
                    thread::sleep(check_interval);

                    if state.stop_requested.load(Ordering::Acquire) {
                        break;
                    }

                    if state.is_timed_out(timeout_ns)
                        && !state.triggered.swap(true, Ordering::AcqRel)
                    {
                        error!("Watchdog timeout: monitor loop has stopped ticking");
                        on_trigger();
                    }
                }

                debug!("Watchdog monitor thread stopped");
            })
            .map_err(|e| MonitorError::Config(format!("Failed to spawn watchdog thread: {e}")))?;

        self.monitor_handle = Some(handle);
        Ok(())
    }

    /// Kick the watchdog; called once per tick.
    #[inline]
    pub fn kick(&self) {
        self.state.kick();
    }

    /// Check if the watchdog has triggered.
    #[inline]
    pub fn has_triggered(&self) -> bool {
        self.state.triggered.load(Ordering::Acquire)
    }

    /// Acknowledge a trigger and keep monitoring.
    pub fn reset(&self) {
        self.state.triggered.store(false, Ordering::Release);
        self.state.kick();
        info!("Watchdog reset");
    }

    /// Stop the monitor thread.
    pub fn stop(&mut self) {
        let Some(handle) = self.monitor_handle.take() else {
            return;
        };

        info!("Stopping watchdog");
        self.state.stop_requested.store(true, Ordering::Release);

        if let Err(e) = handle.join() {
            warn!("Watchdog thread panicked: {:?}", e);
        }
    }

    /// Check if the monitor thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.monitor_handle.is_some()
    }

    /// Get time since last kick.
    #[must_use]
    pub fn time_since_kick(&self) -> Duration {
        let last = self.state.last_kick_ns.load(Ordering::Acquire);
        Duration::from_nanos(self.state.elapsed_ns().saturating_sub(last))
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn triggers_without_kicks() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut wd = Watchdog::new(Duration::from_millis(50));
        wd.start(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(200));

        assert!(wd.has_triggered());
        // Trigger callback runs exactly once
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        wd.stop();
    }

    #[test]
    fn kicking_prevents_trigger() {
        let mut wd = Watchdog::new(Duration::from_millis(100));
        wd.start(|| {}).unwrap();

        for _ in 0..10 {
            wd.kick();
            thread::sleep(Duration::from_millis(20));
        }

        assert!(!wd.has_triggered());
        wd.stop();
    }

    #[test]
    fn reset_clears_trigger() {
        let mut wd = Watchdog::new(Duration::from_millis(40));
        wd.start(|| {}).unwrap();

        thread::sleep(Duration::from_millis(150));
        assert!(wd.has_triggered());

        wd.reset();
        assert!(!wd.has_triggered());
        wd.stop();
    }

    #[test]
    fn double_start_is_rejected() {
        let mut wd = Watchdog::new(Duration::from_millis(100));
        wd.start(|| {}).unwrap();
        assert!(wd.start(|| {}).is_err());
        wd.stop();
    }

    #[test]
    fn stop_without_start_is_noop() {
        let mut wd = Watchdog::new(Duration::from_millis(100));
        wd.stop();
        assert!(!wd.is_running());
    }
}
