//! Stateful conversion of raw OS counters into percentages and rates.
//!
//! The sampler retains exactly one previous sample per counter family
//! (CPU time breakdown, network byte counters) and derives each tick's
//! metrics from the delta against it. Cold start is modelled with
//! explicit `Option` state: "no sample yet" is never conflated with an
//! all-zero sample.

use crate::sample::{CpuTimeSample, DiskUsage, MemoryInfo, NetworkByteCounters};

/// Previous-sample state for the delta-based metrics.
#[derive(Debug, Default)]
pub struct CounterStore {
    /// Last CPU time breakdown, `None` before the first sample.
    cpu: Option<CpuTimeSample>,
    /// Last network byte counters, `None` before the first sample.
    net: Option<NetworkByteCounters>,
}

impl CounterStore {
    /// True once a CPU baseline has been stored.
    #[must_use]
    pub fn has_cpu_baseline(&self) -> bool {
        self.cpu.is_some()
    }

    /// True once a network baseline has been stored.
    #[must_use]
    pub fn has_network_baseline(&self) -> bool {
        self.net.is_some()
    }
}

/// Turns point-in-time raw readings into rate and percentage metrics.
///
/// Single-threaded, single-writer: one instance is owned by the monitor
/// loop and mutated in place every tick.
#[derive(Debug, Default)]
pub struct MetricSampler {
    store: CounterStore,
}

impl MetricSampler {
    /// Create a sampler with no previous samples.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the previous-sample state (read-only).
    #[must_use]
    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Aggregate CPU utilization since the previous sample, in percent.
    ///
    /// The very first call stores `current` as the baseline and returns
    /// `0.0` - cold start is expected, not an error. Afterwards the
    /// element-wise delta against the stored sample is taken over the
    /// fields both samples share; `idle` is the canonical fourth field.
    /// A zero total delta (identical samples, or a paused clock) yields
    /// `0.0` rather than a division by zero. The stored sample is
    /// overwritten on every call, including the first.
    pub fn cpu_usage(&mut self, current: &CpuTimeSample) -> f64 {
        let Some(prev) = self.store.cpu.replace(current.clone()) else {
            return 0.0;
        };

        let deltas: Vec<u64> = current
            .counters
            .iter()
            .zip(prev.counters.iter())
            .map(|(c, p)| c.saturating_sub(*p))
            .collect();

        let total: u64 = deltas.iter().sum();
        if total == 0 {
            return 0.0;
        }

        let idle = deltas
            .get(CpuTimeSample::IDLE_INDEX)
            .copied()
            .unwrap_or(0);

        (1.0 - idle as f64 / total as f64) * 100.0
    }

    /// RAM utilization in percent from a meminfo mapping.
    ///
    /// Missing or zero `MemTotal` falls back to 1 so the division is
    /// always defined; missing `MemAvailable` falls back to 0. An empty
    /// mapping therefore reports 100% - the read failed, not the memory
    /// emptied - and the loop logs the failed read separately.
    #[must_use]
    pub fn ram_usage(mem: &MemoryInfo) -> f64 {
        let total = match mem.get("MemTotal") {
            Some(&t) if t != 0 => t,
            _ => 1,
        };
        let available = mem.get("MemAvailable").copied().unwrap_or(0);
        let used = total.saturating_sub(available);
        used as f64 / total as f64 * 100.0
    }

    /// Download and upload rates in KB/s since the previous sample.
    ///
    /// The first call stores the baseline and reports `(0.0, 0.0)`:
    /// counters accumulate since boot, and reporting the boot-to-now
    /// total as a rate would spike the display on tick one. The stored
    /// counters are overwritten unconditionally.
    pub fn network_speed(&mut self, current: NetworkByteCounters) -> (f64, f64) {
        let Some(prev) = self.store.net.replace(current) else {
            return (0.0, 0.0);
        };

        let download = current.rx_bytes.saturating_sub(prev.rx_bytes) as f64 / 1024.0;
        let upload = current.tx_bytes.saturating_sub(prev.tx_bytes) as f64 / 1024.0;
        (download, upload)
    }

    /// Filesystem utilization in percent. Zero total reports `0.0`.
    #[must_use]
    pub fn disk_usage(du: DiskUsage) -> f64 {
        if du.total_bytes == 0 {
            0.0
        } else {
            du.used_bytes as f64 / du.total_bytes as f64 * 100.0
        }
    }
}
