//! Simulated counter source for tests and hardware-free runs.

use std::collections::VecDeque;
use sysmon_common::error::{MonitorError, MonitorResult};
use sysmon_core::sample::{CpuTimeSample, DiskUsage, MemoryInfo, NetworkByteCounters};
use sysmon_core::source::SystemStatsSource;

/// In-memory `SystemStatsSource`.
///
/// Point-value probes (memory, disk, temperature, throttle) return the
/// last value set. Delta-based probes (CPU times, network counters) pop
/// a scripted queue and repeat the final entry once the script runs
/// dry, so an unscripted long run settles at zero deltas instead of
/// erroring out. Each probe can be failed independently to exercise the
/// loop's substitution paths.
#[derive(Debug)]
pub struct SimulatedStatsSource {
    cpu_script: VecDeque<CpuTimeSample>,
    last_cpu: Option<CpuTimeSample>,
    net_script: VecDeque<NetworkByteCounters>,
    last_net: Option<NetworkByteCounters>,
    memory: MemoryInfo,
    disk: DiskUsage,
    temperature_c: f64,
    throttled: u32,
    interface: String,
    fail_memory: bool,
    fail_disk: bool,
    fail_temperature: bool,
    fail_throttled: bool,
}

impl Default for SimulatedStatsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedStatsSource {
    /// Create a source with quiet-system defaults.
    #[must_use]
    pub fn new() -> Self {
        let mut memory = MemoryInfo::new();
        memory.insert(String::from("MemTotal"), 4_000_000);
        memory.insert(String::from("MemAvailable"), 3_000_000);

        Self {
            cpu_script: VecDeque::new(),
            last_cpu: None,
            net_script: VecDeque::new(),
            last_net: None,
            memory,
            disk: DiskUsage {
                total_bytes: 32_000_000_000,
                used_bytes: 8_000_000_000,
            },
            temperature_c: 42.0,
            throttled: 0,
            interface: String::from("sim0"),
            fail_memory: false,
            fail_disk: false,
            fail_temperature: false,
            fail_throttled: false,
        }
    }

    /// Queue a CPU time sample.
    pub fn push_cpu_sample(&mut self, counters: &[u64]) {
        self.cpu_script.push_back(CpuTimeSample::new(counters.to_vec()));
    }

    /// Queue a network counter reading.
    pub fn push_network_counters(&mut self, rx_bytes: u64, tx_bytes: u64) {
        self.net_script.push_back(NetworkByteCounters { rx_bytes, tx_bytes });
    }

    /// Set the memory mapping returned each tick.
    pub fn set_memory(&mut self, total_kb: u64, available_kb: u64) {
        self.memory.insert(String::from("MemTotal"), total_kb);
        self.memory.insert(String::from("MemAvailable"), available_kb);
    }

    /// Set the disk reading returned each tick.
    pub fn set_disk(&mut self, total_bytes: u64, used_bytes: u64) {
        self.disk = DiskUsage {
            total_bytes,
            used_bytes,
        };
    }

    /// Set the temperature returned each tick.
    pub fn set_temperature(&mut self, celsius: f64) {
        self.temperature_c = celsius;
    }

    /// Set the throttle word returned each tick.
    pub fn set_throttled(&mut self, raw: u32) {
        self.throttled = raw;
    }

    /// Set the resolved interface name.
    pub fn set_interface(&mut self, name: impl Into<String>) {
        self.interface = name.into();
    }

    /// Fail or restore the memory probe.
    pub fn fail_memory(&mut self, fail: bool) {
        self.fail_memory = fail;
    }

    /// Fail or restore the disk probe.
    pub fn fail_disk(&mut self, fail: bool) {
        self.fail_disk = fail;
    }

    /// Fail or restore the temperature probe.
    pub fn fail_temperature(&mut self, fail: bool) {
        self.fail_temperature = fail;
    }

    /// Fail or restore the throttle probe.
    pub fn fail_throttled(&mut self, fail: bool) {
        self.fail_throttled = fail;
    }
}

impl SystemStatsSource for SimulatedStatsSource {
    fn read_cpu_time_sample(&mut self) -> MonitorResult<CpuTimeSample> {
        if let Some(sample) = self.cpu_script.pop_front() {
            self.last_cpu = Some(sample.clone());
            return Ok(sample);
        }
        self.last_cpu
            .clone()
            .ok_or_else(|| MonitorError::probe("sim-cpu", "no sample scripted"))
    }

    fn read_memory_info(&mut self) -> MonitorResult<MemoryInfo> {
        if self.fail_memory {
            return Err(MonitorError::probe("sim-memory", "injected failure"));
        }
        Ok(self.memory.clone())
    }

    fn read_disk_usage(&mut self) -> MonitorResult<DiskUsage> {
        if self.fail_disk {
            return Err(MonitorError::probe("sim-disk", "injected failure"));
        }
        Ok(self.disk)
    }

    fn read_network_counters(&mut self, _interface: &str) -> MonitorResult<NetworkByteCounters> {
        if let Some(counters) = self.net_script.pop_front() {
            self.last_net = Some(counters);
            return Ok(counters);
        }
        self.last_net
            .ok_or_else(|| MonitorError::probe("sim-net", "no counters scripted"))
    }

    fn read_cpu_temperature(&mut self) -> MonitorResult<f64> {
        if self.fail_temperature {
            return Err(MonitorError::probe("sim-temperature", "injected failure"));
        }
        Ok(self.temperature_c)
    }

    fn resolve_active_interface(&mut self) -> String {
        self.interface.clone()
    }

    fn read_throttled_status(&mut self) -> MonitorResult<u32> {
        if self.fail_throttled {
            return Err(MonitorError::probe("sim-throttle", "injected failure"));
        }
        Ok(self.throttled)
    }
}
