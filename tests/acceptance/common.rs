//! Shared helpers for the acceptance suite.

use std::time::Duration;
use sysmon_common::config::MonitorConfig;
use sysmon_core::monitor::{Monitor, MonitorBuilder};
use sysmon_core::render::DisplayRenderer;
use sysmon_core::sample::SystemSnapshot;
use sysmon_probes::simulated::SimulatedStatsSource;

/// Renderer that records every snapshot handed to it.
#[derive(Default)]
pub struct RecordingRenderer {
    /// Snapshots in render order.
    pub snapshots: Vec<SystemSnapshot>,
}

impl DisplayRenderer for RecordingRenderer {
    fn render(&mut self, snapshot: &SystemSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

/// Configuration with a fast tick for test runs.
pub fn fast_config(period_ms: u64) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.tick_period = Duration::from_millis(period_ms);
    config.watchdog_timeout = Duration::from_millis(period_ms * 10);
    config
}

/// Monitor over a simulated source and recording renderer.
pub fn scripted_monitor(
    source: SimulatedStatsSource,
    period_ms: u64,
) -> Monitor<SimulatedStatsSource, RecordingRenderer> {
    MonitorBuilder::new(source, RecordingRenderer::default())
        .config(fast_config(period_ms))
        .build()
}

/// A simulated source with CPU and network baselines already queued.
pub fn seeded_source() -> SimulatedStatsSource {
    let mut source = SimulatedStatsSource::new();
    source.push_cpu_sample(&[100, 0, 50, 900]);
    source.push_network_counters(1024, 2048);
    source
}
