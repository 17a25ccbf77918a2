//! Cyclic monitor loop.
//!
//! The monitor implements the classic fixed-cadence tick:
//! 1. Read raw counters from the stats source
//! 2. Derive percentages and rates via the sampler
//! 3. Hand the snapshot to the display renderer
//! 4. Wait for the next tick deadline
//!
//! Deadlines are absolute so jitter does not accumulate; a tick that
//! overruns a whole period re-bases instead of bursting to catch up.

use crate::power::PowerStatusAnalyzer;
use crate::render::DisplayRenderer;
use crate::sample::{MemoryInfo, SystemSnapshot};
use crate::sampler::MetricSampler;
use crate::source::SystemStatsSource;
use crate::watchdog::Watchdog;
use std::time::{Duration, Instant};
use sysmon_common::config::{MonitorConfig, OverrunPolicy};
use sysmon_common::error::{MonitorError, MonitorResult};
use sysmon_common::metrics::TickMetrics;
use sysmon_common::state::{RuntimeState, StateMachine};
use tracing::{error, info, trace, warn};

/// Result of a single tick execution.
#[derive(Debug, Clone)]
pub struct TickResult {
    /// Actual execution time of this tick (excluding the deadline wait).
    pub execution_time: Duration,
    /// Whether the tick exceeded the period.
    pub overrun: bool,
    /// Current tick number.
    pub tick_count: u64,
    /// The snapshot handed to the renderer.
    pub snapshot: SystemSnapshot,
}

/// Fixed-cadence monitor loop.
///
/// Coordinates one tick per period between the stats source, the
/// sampler/analyzer state, and the display renderer.
pub struct Monitor<S: SystemStatsSource, R: DisplayRenderer> {
    /// Counter source collaborator.
    pub source: S,
    /// Display collaborator.
    pub renderer: R,
    /// Delta/rate computation state.
    sampler: MetricSampler,
    /// Throttle word analyzer state.
    power: PowerStatusAnalyzer,
    /// Runtime state machine.
    state: StateMachine,
    /// Tick period.
    tick_period: Duration,
    /// Maximum allowed overrun before the fault policy escalates.
    max_overrun: Duration,
    /// What to do when a tick overruns.
    on_overrun: OverrunPolicy,
    /// Next tick deadline (absolute time).
    next_deadline: Option<Instant>,
    /// Total ticks executed.
    tick_count: u64,
    /// Tick latency metrics.
    metrics: TickMetrics,
    /// Watchdog timer.
    watchdog: Option<Watchdog>,
    /// Last good temperature reading, substituted on read failure.
    last_temp_c: f64,
    /// Last computed CPU percentage, substituted on read failure.
    last_cpu_pct: f64,
}

impl<S: SystemStatsSource, R: DisplayRenderer> Monitor<S, R> {
    /// Create a monitor from configuration.
    pub fn new(source: S, renderer: R, config: &MonitorConfig) -> Self {
        let metrics = TickMetrics::new(config.metrics.histogram_size, config.tick_period);

        Self {
            source,
            renderer,
            sampler: MetricSampler::new(),
            power: PowerStatusAnalyzer::new(),
            state: StateMachine::new(),
            tick_period: config.tick_period,
            max_overrun: config.max_overrun,
            on_overrun: config.fault_policy.on_overrun,
            next_deadline: None,
            tick_count: 0,
            metrics,
            watchdog: None,
            last_temp_c: 0.0,
            last_cpu_pct: 0.0,
        }
    }

    /// Create a monitor with default configuration.
    pub fn with_defaults(source: S, renderer: R) -> Self {
        Self::new(source, renderer, &MonitorConfig::default())
    }

    /// Set the watchdog timer.
    pub fn set_watchdog(&mut self, watchdog: Watchdog) {
        self.watchdog = Some(watchdog);
    }

    /// Get the current runtime state.
    pub fn state(&self) -> RuntimeState {
        self.state.state()
    }

    /// Get tick metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// Get total tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Check if the watchdog has triggered.
    pub fn watchdog_triggered(&self) -> bool {
        self.watchdog.as_ref().is_some_and(Watchdog::has_triggered)
    }

    /// Initialize the monitor.
    ///
    /// Transitions BOOT → INIT → READY and resolves the active
    /// interface once so a misconfigured route probe is visible in the
    /// log before the first tick.
    pub fn initialize(&mut self) -> MonitorResult<()> {
        info!("Initializing monitor");

        self.state.transition(RuntimeState::Init)?;

        let interface = self.source.resolve_active_interface();
        info!(interface = %interface, "Active network interface resolved");

        self.state.transition(RuntimeState::Ready)?;

        info!("Monitor initialized, state: READY");
        Ok(())
    }

    /// Start cyclic execution.
    ///
    /// Transitions READY → RUN and arms the first deadline.
    pub fn start(&mut self) -> MonitorResult<()> {
        if self.state.state() != RuntimeState::Ready {
            return Err(MonitorError::InvalidStateTransition {
                from: self.state.state().to_string(),
                to: RuntimeState::Run.to_string(),
            });
        }

        info!(
            tick_period_ms = self.tick_period.as_millis(),
            "Starting cyclic sampling"
        );

        self.state.transition(RuntimeState::Run)?;
        self.next_deadline = Some(Instant::now() + self.tick_period);

        if let Some(wd) = &mut self.watchdog {
            // The thread only records the trigger; callers observe it by
            // polling `watchdog_triggered`
            wd.start(|| {})?;
        }

        Ok(())
    }

    /// Execute one tick.
    ///
    /// Reads every counter family in a fixed order, derives the
    /// snapshot, renders it, then waits out the remainder of the
    /// period. Individual read failures substitute safe defaults and
    /// never abort the tick.
    pub fn run_tick(&mut self) -> MonitorResult<TickResult> {
        if self.state.state() != RuntimeState::Run {
            return Err(MonitorError::Fault(format!(
                "Cannot run tick in state {}",
                self.state.state()
            )));
        }

        let tick_start = Instant::now();

        if let Some(ref wd) = self.watchdog {
            wd.kick();
        }

        let snapshot = self.sample();
        self.renderer.render(&snapshot);

        let execution_time = tick_start.elapsed();
        self.tick_count += 1;
        self.metrics.record(execution_time);

        let overrun = execution_time > self.tick_period;
        if overrun {
            let overrun_amount = execution_time - self.tick_period;
            match self.on_overrun {
                OverrunPolicy::Fault if overrun_amount > self.max_overrun => {
                    error!(
                        execution_ms = execution_time.as_millis(),
                        period_ms = self.tick_period.as_millis(),
                        overrun_ms = overrun_amount.as_millis(),
                        "Critical tick overrun - entering fault state"
                    );
                    self.enter_fault("Critical tick overrun");
                    return Err(MonitorError::TickOverrun {
                        expected_ns: self.tick_period.as_nanos() as u64,
                        actual_ns: execution_time.as_nanos() as u64,
                    });
                }
                OverrunPolicy::Ignore => {}
                _ => {
                    warn!(
                        tick = self.tick_count,
                        execution_ms = execution_time.as_millis(),
                        period_ms = self.tick_period.as_millis(),
                        "Tick overrun"
                    );
                }
            }
        }

        if let Some(deadline) = self.next_deadline {
            let now = Instant::now();
            if deadline > now {
                Self::wait_until(deadline);
                self.next_deadline = Some(deadline + self.tick_period);
            } else {
                // Overran the whole period: re-base so we never burst
                self.next_deadline = Some(now + self.tick_period);
            }
        }

        trace!(
            tick = self.tick_count,
            execution_us = execution_time.as_micros(),
            "Tick complete"
        );

        Ok(TickResult {
            execution_time,
            overrun,
            tick_count: self.tick_count,
            snapshot,
        })
    }

    /// Run the loop until stopped or faulted. Blocks the current thread.
    pub fn run(&mut self) -> MonitorResult<()> {
        info!("Entering main monitor loop");

        while self.state.state() == RuntimeState::Run {
            self.run_tick()?;
        }

        info!(
            final_state = %self.state.state(),
            ticks = self.tick_count,
            "Monitor loop exited"
        );

        Ok(())
    }

    /// Stop cyclic execution gracefully.
    pub fn stop(&mut self) -> MonitorResult<()> {
        info!("Stopping monitor");

        if matches!(self.state.state(), RuntimeState::Run | RuntimeState::Ready) {
            self.state.transition(RuntimeState::SafeStop)?;
        }

        if let Some(wd) = &mut self.watchdog {
            wd.stop();
        }

        Ok(())
    }

    /// Enter fault state.
    fn enter_fault(&mut self, reason: &str) {
        error!(reason, "Entering FAULT state");
        self.state.enter_fault();
    }

    /// Read every counter family and derive this tick's snapshot.
    ///
    /// Read order is fixed: temperature, CPU times, memory, disk,
    /// network, throttle word. Each failure substitutes the documented
    /// safe default for that family.
    fn sample(&mut self) -> SystemSnapshot {
        let interface = self.source.resolve_active_interface();

        let cpu_temp_c = match self.source.read_cpu_temperature() {
            Ok(t) => {
                self.last_temp_c = t;
                t
            }
            Err(e) => {
                warn!(error = %e, "Temperature read failed, keeping last value");
                self.last_temp_c
            }
        };

        let cpu_usage_pct = match self.source.read_cpu_time_sample() {
            Ok(sample) => {
                let pct = self.sampler.cpu_usage(&sample);
                self.last_cpu_pct = pct;
                pct
            }
            Err(e) => {
                warn!(error = %e, "CPU time read failed, keeping last percentage");
                self.last_cpu_pct
            }
        };

        let mem = self.source.read_memory_info().unwrap_or_else(|e| {
            warn!(error = %e, "Memory info read failed, substituting empty mapping");
            MemoryInfo::default()
        });
        let ram_usage_pct = MetricSampler::ram_usage(&mem);

        let disk_usage_pct = match self.source.read_disk_usage() {
            Ok(du) => Some(MetricSampler::disk_usage(du)),
            Err(e) => {
                warn!(error = %e, "Disk usage unavailable this tick");
                None
            }
        };

        let (download_kbs, upload_kbs) = match self.source.read_network_counters(&interface) {
            Ok(counters) => self.sampler.network_speed(counters),
            Err(e) => {
                warn!(error = %e, interface = %interface, "Network counter read failed");
                (0.0, 0.0)
            }
        };

        let power = self.power.interpret(self.source.read_throttled_status());

        SystemSnapshot {
            cpu_temp_c,
            cpu_usage_pct,
            ram_usage_pct,
            disk_usage_pct,
            download_kbs,
            upload_kbs,
            power,
        }
    }

    /// Wait until the specified deadline using high-precision sleep.
    #[cfg(target_os = "linux")]
    fn wait_until(deadline: Instant) {
        let now = Instant::now();
        if deadline <= now {
            return;
        }

        let duration = deadline - now;
        let ts = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        // SAFETY: clock_nanosleep is safe with valid parameters
        #[allow(unsafe_code)]
        unsafe {
            libc::clock_nanosleep(libc::CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut());
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn wait_until(deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Builder for configuring the monitor.
pub struct MonitorBuilder<S: SystemStatsSource, R: DisplayRenderer> {
    source: S,
    renderer: R,
    config: MonitorConfig,
    watchdog_timeout: Option<Duration>,
}

impl<S: SystemStatsSource, R: DisplayRenderer> MonitorBuilder<S, R> {
    /// Create a new builder with the given collaborators.
    pub fn new(source: S, renderer: R) -> Self {
        Self {
            source,
            renderer,
            config: MonitorConfig::default(),
            watchdog_timeout: None,
        }
    }

    /// Set the tick period.
    #[must_use]
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.config.tick_period = period;
        self
    }

    /// Set the maximum allowed overrun.
    #[must_use]
    pub fn max_overrun(mut self, max: Duration) -> Self {
        self.config.max_overrun = max;
        self
    }

    /// Set the overrun policy.
    #[must_use]
    pub fn overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.config.fault_policy.on_overrun = policy;
        self
    }

    /// Set the watchdog timeout.
    #[must_use]
    pub fn watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = Some(timeout);
        self
    }

    /// Set the full monitor configuration.
    #[must_use]
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the monitor.
    pub fn build(self) -> Monitor<S, R> {
        let mut monitor = Monitor::new(self.source, self.renderer, &self.config);

        if let Some(timeout) = self.watchdog_timeout {
            monitor.set_watchdog(Watchdog::new(timeout));
        }

        monitor
    }
}
