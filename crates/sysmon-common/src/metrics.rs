//! Tick latency metrics.
//!
//! Ring buffer-based histogram of tick execution times, allocation-free
//! during normal operation so recording never perturbs the cadence it
//! measures.

use std::time::Duration;

/// Tick execution metrics with ring buffer for latency tracking.
#[derive(Debug)]
pub struct TickMetrics {
    /// Ring buffer of tick durations in nanoseconds.
    samples: Box<[u64]>,
    /// Current write position in the ring buffer.
    write_pos: usize,
    /// Number of samples collected (saturates at buffer size).
    sample_count: usize,
    /// Total ticks executed.
    total_ticks: u64,
    /// Minimum observed tick time in nanoseconds.
    min_ns: u64,
    /// Maximum observed tick time in nanoseconds.
    max_ns: u64,
    /// Sum of all tick times for mean calculation.
    sum_ns: u64,
    /// Number of tick overruns detected.
    overrun_count: u64,
    /// Configured tick deadline in nanoseconds.
    deadline_ns: u64,
}

impl TickMetrics {
    /// Create a new metrics collector.
    ///
    /// `histogram_size` is the number of samples retained in the ring
    /// buffer; ticks longer than `tick_deadline` count as overruns.
    #[must_use]
    pub fn new(histogram_size: usize, tick_deadline: Duration) -> Self {
        let size = histogram_size.max(1);
        Self {
            samples: vec![0u64; size].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            total_ticks: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            overrun_count: 0,
            deadline_ns: tick_deadline.as_nanos() as u64,
        }
    }

    /// Record a tick execution time.
    pub fn record(&mut self, duration: Duration) {
        let ns = duration.as_nanos() as u64;

        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());

        self.total_ticks += 1;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
        self.sum_ns = self.sum_ns.wrapping_add(ns);

        if ns > self.deadline_ns {
            self.overrun_count += 1;
        }
    }

    /// Get total number of ticks executed.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Get minimum observed tick time.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.total_ticks > 0).then(|| Duration::from_nanos(self.min_ns))
    }

    /// Get maximum observed tick time.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.total_ticks > 0).then(|| Duration::from_nanos(self.max_ns))
    }

    /// Get mean tick time.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.total_ticks > 0).then(|| Duration::from_nanos(self.sum_ns / self.total_ticks))
    }

    /// Get number of tick overruns.
    #[must_use]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// Compute a percentile (0.0 to 100.0) from the ring buffer.
    ///
    /// Returns `None` if no samples have been collected or the
    /// percentile is out of range.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.sample_count == 0 {
            return None;
        }
        if !(0.0..=100.0).contains(&percentile) || percentile.is_nan() {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        let idx = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        let idx = idx.min(sorted.len() - 1);

        Some(Duration::from_nanos(sorted[idx]))
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> TickSnapshot {
        let populated = self.total_ticks > 0;
        TickSnapshot {
            total_ticks: self.total_ticks,
            min_ns: populated.then_some(self.min_ns),
            max_ns: populated.then_some(self.max_ns),
            mean_ns: populated.then(|| self.sum_ns / self.total_ticks),
            overrun_count: self.overrun_count,
            sample_count: self.sample_count,
        }
    }

    /// Reset all metrics to initial state.
    pub fn reset(&mut self) {
        self.samples.fill(0);
        self.write_pos = 0;
        self.sample_count = 0;
        self.total_ticks = 0;
        self.min_ns = u64::MAX;
        self.max_ns = 0;
        self.sum_ns = 0;
        self.overrun_count = 0;
    }
}

/// Immutable snapshot of tick metrics for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct TickSnapshot {
    /// Total ticks executed.
    pub total_ticks: u64,
    /// Minimum tick time in nanoseconds.
    pub min_ns: Option<u64>,
    /// Maximum tick time in nanoseconds.
    pub max_ns: Option<u64>,
    /// Mean tick time in nanoseconds.
    pub mean_ns: Option<u64>,
    /// Number of tick overruns.
    pub overrun_count: u64,
    /// Number of samples in the histogram.
    pub sample_count: usize,
}

impl TickSnapshot {
    /// Get jitter (max - min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_ns, self.max_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_recording() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));

        metrics.record(Duration::from_millis(5));
        metrics.record(Duration::from_millis(8));
        metrics.record(Duration::from_millis(6));

        assert_eq!(metrics.total_ticks(), 3);
        assert_eq!(metrics.min(), Some(Duration::from_millis(5)));
        assert_eq!(metrics.max(), Some(Duration::from_millis(8)));
    }

    #[test]
    fn test_overrun_counting() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));

        metrics.record(Duration::from_millis(900)); // OK
        metrics.record(Duration::from_millis(1100)); // Overrun
        metrics.record(Duration::from_millis(800)); // OK
        metrics.record(Duration::from_millis(1500)); // Overrun

        assert_eq!(metrics.overrun_count(), 2);
    }

    #[test]
    fn test_percentile_calculation() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));

        for i in 1..=100 {
            metrics.record(Duration::from_millis(i));
        }

        let p50 = metrics.percentile(50.0).unwrap();
        assert!(p50.as_millis() >= 49 && p50.as_millis() <= 51);

        let p99 = metrics.percentile(99.0).unwrap();
        assert!(p99.as_millis() >= 98 && p99.as_millis() <= 100);
    }

    #[test]
    fn test_percentile_validation() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));
        metrics.record(Duration::from_millis(10));

        assert!(metrics.percentile(0.0).is_some());
        assert!(metrics.percentile(100.0).is_some());
        assert!(metrics.percentile(-1.0).is_none());
        assert!(metrics.percentile(101.0).is_none());
        assert!(metrics.percentile(f64::NAN).is_none());
    }

    #[test]
    fn test_ring_buffer_wrapping() {
        let mut metrics = TickMetrics::new(10, Duration::from_secs(1));

        for i in 0..25 {
            metrics.record(Duration::from_micros(i));
        }

        assert_eq!(metrics.total_ticks(), 25);
        assert_eq!(metrics.snapshot().sample_count, 10);
    }

    #[test]
    fn test_reset() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));

        metrics.record(Duration::from_millis(500));
        metrics.record(Duration::from_millis(1500)); // Overrun

        metrics.reset();

        assert_eq!(metrics.total_ticks(), 0);
        assert_eq!(metrics.overrun_count(), 0);
        assert!(metrics.min().is_none());
    }

    #[test]
    fn test_snapshot_jitter() {
        let mut metrics = TickMetrics::new(100, Duration::from_secs(1));

        metrics.record(Duration::from_millis(4));
        metrics.record(Duration::from_millis(6));

        let snap = metrics.snapshot();
        assert_eq!(snap.total_ticks, 2);
        assert_eq!(snap.min_ns, Some(4_000_000));
        assert_eq!(snap.max_ns, Some(6_000_000));
        assert_eq!(snap.jitter_ns(), Some(2_000_000));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut metrics = TickMetrics::new(10, Duration::from_secs(1));
        metrics.record(Duration::from_millis(3));

        let json = serde_json::to_string(&metrics.snapshot()).unwrap();
        assert!(json.contains("\"total_ticks\":1"));
        assert!(json.contains("\"overrun_count\":0"));
    }

    #[test]
    fn test_empty_snapshot() {
        let metrics = TickMetrics::new(100, Duration::from_secs(1));
        let snap = metrics.snapshot();
        assert_eq!(snap.total_ticks, 0);
        assert!(snap.min_ns.is_none());
        assert!(snap.jitter_ns().is_none());
    }
}
