//! Collaborator contract for raw system counter reads.

use crate::sample::{CpuTimeSample, DiskUsage, MemoryInfo, NetworkByteCounters};
use sysmon_common::error::MonitorResult;

/// Abstraction over the OS-specific counter sources.
///
/// The monitor core depends on this seam and never touches `/proc`,
/// `/sys`, or external commands itself, so the loop is testable against
/// a scripted in-memory implementation. Every read must return or fail
/// within the tick budget; implementations own their timeouts.
pub trait SystemStatsSource: Send {
    /// Read the aggregate CPU time counters.
    fn read_cpu_time_sample(&mut self) -> MonitorResult<CpuTimeSample>;

    /// Read the memory information mapping.
    fn read_memory_info(&mut self) -> MonitorResult<MemoryInfo>;

    /// Read total/used bytes for the monitored filesystem.
    fn read_disk_usage(&mut self) -> MonitorResult<DiskUsage>;

    /// Read cumulative byte counters for `interface`.
    fn read_network_counters(&mut self, interface: &str) -> MonitorResult<NetworkByteCounters>;

    /// Read the CPU temperature in degrees Celsius.
    fn read_cpu_temperature(&mut self) -> MonitorResult<f64>;

    /// Resolve the interface behind the default route.
    ///
    /// Never fails: implementations return a fixed fallback name when
    /// the route cannot be inspected, so an interface change (say Wi-Fi
    /// to Ethernet) is followed transparently on the next tick.
    fn resolve_active_interface(&mut self) -> String;

    /// Read the raw 32-bit firmware throttle word.
    fn read_throttled_status(&mut self) -> MonitorResult<u32>;
}
