//! Raw counter samples and the per-tick derived snapshot.

use crate::power::PowerReport;
use std::collections::HashMap;

/// One point-in-time reading of the aggregate CPU time counters.
///
/// Values are in kernel clock ticks, in `/proc/stat` field order
/// (user, nice, system, idle, iowait, irq, softirq, steal, ...).
/// A sample is only meaningful paired with a previous one: utilization
/// is derived from the element-wise delta, never from absolute values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuTimeSample {
    /// Counter values in canonical field order.
    pub counters: Vec<u64>,
}

impl CpuTimeSample {
    /// Canonical position of the idle counter (user, nice, system, idle).
    pub const IDLE_INDEX: usize = 3;

    /// Wrap a counter vector read from the stats source.
    #[must_use]
    pub fn new(counters: Vec<u64>) -> Self {
        Self { counters }
    }
}

/// Cumulative interface byte counters, monotonically non-decreasing
/// while the interface stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkByteCounters {
    /// Total bytes received since the interface came up.
    pub rx_bytes: u64,
    /// Total bytes transmitted since the interface came up.
    pub tx_bytes: u64,
}

/// Parsed memory information: label to kilobytes, as in `/proc/meminfo`.
///
/// Only `MemTotal` and `MemAvailable` are consumed; the full mapping is
/// kept so the seam stays a plain parse of what the kernel exposes.
pub type MemoryInfo = HashMap<String, u64>;

/// Filesystem capacity reading for one mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskUsage {
    /// Total filesystem size in bytes.
    pub total_bytes: u64,
    /// Bytes in use.
    pub used_bytes: u64,
}

/// Derived metrics for one tick, handed to the display renderer.
///
/// Ephemeral: recomputed every tick, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    /// CPU temperature in degrees Celsius.
    pub cpu_temp_c: f64,
    /// Aggregate CPU utilization since the previous tick, 0-100.
    pub cpu_usage_pct: f64,
    /// RAM utilization, 0-100.
    pub ram_usage_pct: f64,
    /// Root filesystem utilization, 0-100; `None` when the reading is
    /// unavailable this tick (renderers must not show a number).
    pub disk_usage_pct: Option<f64>,
    /// Download rate in KB/s.
    pub download_kbs: f64,
    /// Upload rate in KB/s.
    pub upload_kbs: f64,
    /// Decoded power/throttling status.
    pub power: PowerReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_index_matches_proc_stat_order() {
        // user, nice, system, idle
        let sample = CpuTimeSample::new(vec![100, 0, 50, 900]);
        assert_eq!(sample.counters[CpuTimeSample::IDLE_INDEX], 900);
    }
}
