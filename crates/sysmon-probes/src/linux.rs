//! Linux counter source.
//!
//! Reads the kernel's pseudo-files directly: `/proc/stat` for CPU time,
//! `/proc/meminfo` for memory, `/sys/class/net/<if>/statistics` for
//! byte counters, and the thermal zone for temperature. Disk capacity
//! comes from `statvfs`, and the default-route interface and firmware
//! throttle word from bounded external commands.

use crate::command::{parse_route_output, parse_throttled_output, CommandProbe};
use std::fs;
use std::path::{Path, PathBuf};
use sysmon_common::config::MonitorConfig;
use sysmon_common::error::{MonitorError, MonitorResult};
use sysmon_core::sample::{CpuTimeSample, DiskUsage, MemoryInfo, NetworkByteCounters};
use sysmon_core::source::SystemStatsSource;
use tracing::debug;

/// `SystemStatsSource` backed by the Linux pseudo-filesystems.
#[derive(Debug)]
pub struct LinuxStatsSource {
    proc_stat: PathBuf,
    proc_meminfo: PathBuf,
    net_stats_root: PathBuf,
    thermal_zone: PathBuf,
    disk_path: PathBuf,
    fallback_interface: String,
    route: CommandProbe,
    throttle: CommandProbe,
}

impl LinuxStatsSource {
    /// Build a source from the monitor configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error when a probe command line is empty.
    pub fn from_config(config: &MonitorConfig) -> MonitorResult<Self> {
        Ok(Self {
            proc_stat: PathBuf::from("/proc/stat"),
            proc_meminfo: PathBuf::from("/proc/meminfo"),
            net_stats_root: PathBuf::from("/sys/class/net"),
            thermal_zone: config.sampling.thermal_zone.clone(),
            disk_path: config.sampling.disk_path.clone(),
            fallback_interface: config.sampling.fallback_interface.clone(),
            route: CommandProbe::new(&config.probes.route_command, config.probes.command_timeout)?,
            throttle: CommandProbe::new(
                &config.probes.throttle_command,
                config.probes.command_timeout,
            )?,
        })
    }
}

impl SystemStatsSource for LinuxStatsSource {
    fn read_cpu_time_sample(&mut self) -> MonitorResult<CpuTimeSample> {
        read_cpu_time_sample_from(&self.proc_stat)
    }

    fn read_memory_info(&mut self) -> MonitorResult<MemoryInfo> {
        read_memory_info_from(&self.proc_meminfo)
    }

    fn read_disk_usage(&mut self) -> MonitorResult<DiskUsage> {
        read_disk_usage_from(&self.disk_path)
    }

    fn read_network_counters(&mut self, interface: &str) -> MonitorResult<NetworkByteCounters> {
        read_network_counters_from(&self.net_stats_root, interface)
    }

    fn read_cpu_temperature(&mut self) -> MonitorResult<f64> {
        read_temperature_from(&self.thermal_zone)
    }

    fn resolve_active_interface(&mut self) -> String {
        match self.route.run() {
            Ok(output) => match parse_route_output(&output) {
                Some(interface) => interface,
                None => {
                    debug!("No dev token in route output, using fallback interface");
                    self.fallback_interface.clone()
                }
            },
            Err(e) => {
                debug!(error = %e, "Route probe failed, using fallback interface");
                self.fallback_interface.clone()
            }
        }
    }

    fn read_throttled_status(&mut self) -> MonitorResult<u32> {
        let output = self.throttle.run()?;
        parse_throttled_output(&output)
    }
}

/// Read the first line of a pseudo-file.
fn read_first_line(path: &Path) -> MonitorResult<String> {
    let content =
        fs::read_to_string(path).map_err(|e| MonitorError::probe(path.display().to_string(), e))?;
    Ok(content.lines().next().unwrap_or_default().to_owned())
}

/// Read and parse the aggregate CPU line of a `/proc/stat`-format file.
pub fn read_cpu_time_sample_from(path: &Path) -> MonitorResult<CpuTimeSample> {
    let line = read_first_line(path)?;
    parse_cpu_line(&line)
}

/// Parse the aggregate CPU line (`cpu  user nice system idle ...`).
pub fn parse_cpu_line(line: &str) -> MonitorResult<CpuTimeSample> {
    let mut tokens = line.split_whitespace();

    match tokens.next() {
        Some(tag) if tag.starts_with("cpu") => {}
        other => {
            return Err(MonitorError::probe(
                "cpu-stat",
                format!("unexpected line tag: {other:?}"),
            ));
        }
    }

    let counters = tokens
        .map(str::parse::<u64>)
        .collect::<Result<Vec<u64>, _>>()
        .map_err(|e| MonitorError::probe("cpu-stat", e))?;

    if counters.is_empty() {
        return Err(MonitorError::probe("cpu-stat", "no counter fields"));
    }

    Ok(CpuTimeSample::new(counters))
}

/// Read and parse a `/proc/meminfo`-format file.
///
/// Malformed lines are skipped rather than failing the whole read: a
/// partial mapping still carries the two labels the sampler consumes.
pub fn read_memory_info_from(path: &Path) -> MonitorResult<MemoryInfo> {
    let content =
        fs::read_to_string(path).map_err(|e| MonitorError::probe(path.display().to_string(), e))?;

    let mut info = MemoryInfo::new();
    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(label), Some(value)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };
        info.insert(label.trim_end_matches(':').to_owned(), kb);
    }
    Ok(info)
}

/// Read cumulative byte counters for one interface from a
/// `/sys/class/net`-format tree.
pub fn read_network_counters_from(
    root: &Path,
    interface: &str,
) -> MonitorResult<NetworkByteCounters> {
    let statistics = root.join(interface).join("statistics");
    let rx_bytes = read_counter_file(&statistics.join("rx_bytes"))?;
    let tx_bytes = read_counter_file(&statistics.join("tx_bytes"))?;
    Ok(NetworkByteCounters { rx_bytes, tx_bytes })
}

fn read_counter_file(path: &Path) -> MonitorResult<u64> {
    let line = read_first_line(path)?;
    line.trim()
        .parse::<u64>()
        .map_err(|e| MonitorError::probe(path.display().to_string(), e))
}

/// Read a thermal zone file (millidegrees Celsius) as degrees.
pub fn read_temperature_from(path: &Path) -> MonitorResult<f64> {
    let line = read_first_line(path)?;
    let millidegrees = line
        .trim()
        .parse::<i64>()
        .map_err(|e| MonitorError::probe(path.display().to_string(), e))?;
    Ok(millidegrees as f64 / 1000.0)
}

/// Query filesystem capacity via `statvfs`, mirroring the semantics of
/// total/used as block counts times the fragment size.
#[cfg(target_os = "linux")]
pub fn read_disk_usage_from(path: &Path) -> MonitorResult<DiskUsage> {
    let stat = nix::sys::statvfs::statvfs(path)
        .map_err(|e| MonitorError::probe(path.display().to_string(), e))?;

    let fragment = stat.fragment_size() as u64;
    let total_bytes = stat.blocks() as u64 * fragment;
    let free_bytes = stat.blocks_free() as u64 * fragment;

    Ok(DiskUsage {
        total_bytes,
        used_bytes: total_bytes.saturating_sub(free_bytes),
    })
}

#[cfg(not(target_os = "linux"))]
pub fn read_disk_usage_from(path: &Path) -> MonitorResult<DiskUsage> {
    Err(MonitorError::probe(
        path.display().to_string(),
        "disk usage probe requires Linux",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn cpu_line_parses_all_fields() {
        let sample =
            parse_cpu_line("cpu  74608 2520 24433 1117073 6176 4054 0 0 0 0").unwrap();
        assert_eq!(
            sample.counters,
            vec![74608, 2520, 24433, 1117073, 6176, 4054, 0, 0, 0, 0]
        );
        assert_eq!(sample.counters[CpuTimeSample::IDLE_INDEX], 1117073);
    }

    #[test]
    fn cpu_line_rejects_wrong_tag() {
        assert!(parse_cpu_line("intr 12345 0 0").is_err());
        assert!(parse_cpu_line("").is_err());
    }

    #[test]
    fn cpu_line_rejects_non_numeric_field() {
        assert!(parse_cpu_line("cpu 1 2 x 4").is_err());
    }

    #[test]
    fn cpu_sample_reads_first_line_only() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "stat",
            "cpu  100 0 50 900\ncpu0 100 0 50 900\nintr 5\n",
        );
        let sample = read_cpu_time_sample_from(&path).unwrap();
        assert_eq!(sample.counters, vec![100, 0, 50, 900]);
    }

    #[test]
    fn meminfo_parses_labels_and_kilobytes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "meminfo",
            "MemTotal:       16316412 kB\nMemFree:         1210128 kB\nMemAvailable:    8794856 kB\nHugePages_Total:       0\n",
        );
        let info = read_memory_info_from(&path).unwrap();
        assert_eq!(info.get("MemTotal"), Some(&16_316_412));
        assert_eq!(info.get("MemAvailable"), Some(&8_794_856));
        assert_eq!(info.get("HugePages_Total"), Some(&0));
    }

    #[test]
    fn meminfo_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "meminfo", "garbage\nMemTotal: 2000 kB\n: :\n");
        let info = read_memory_info_from(&path).unwrap();
        assert_eq!(info.get("MemTotal"), Some(&2000));
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn network_counters_from_statistics_tree() {
        let dir = TempDir::new().unwrap();
        let statistics = dir.path().join("wlan0").join("statistics");
        fs::create_dir_all(&statistics).unwrap();
        fs::write(statistics.join("rx_bytes"), "123456\n").unwrap();
        fs::write(statistics.join("tx_bytes"), "7890\n").unwrap();

        let counters = read_network_counters_from(dir.path(), "wlan0").unwrap();
        assert_eq!(counters.rx_bytes, 123_456);
        assert_eq!(counters.tx_bytes, 7_890);
    }

    #[test]
    fn missing_interface_is_probe_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_network_counters_from(dir.path(), "eth9").is_err());
    }

    #[test]
    fn temperature_from_millidegrees() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "temp", "48200\n");
        let temp = read_temperature_from(&path).unwrap();
        assert!((temp - 48.2).abs() < 1e-9);
    }

    #[test]
    fn missing_thermal_zone_is_probe_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_temperature_from(&dir.path().join("missing")).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn disk_usage_of_root_is_sane() {
        let du = read_disk_usage_from(Path::new("/")).unwrap();
        assert!(du.total_bytes > 0);
        assert!(du.used_bytes <= du.total_bytes);
    }

    #[test]
    fn source_from_default_config() {
        let config = MonitorConfig::default();
        let source = LinuxStatsSource::from_config(&config).unwrap();
        assert_eq!(source.fallback_interface, "wlan0");
        assert_eq!(source.route.program(), "ip");
    }
}
