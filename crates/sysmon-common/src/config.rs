//! Configuration structures for the monitor daemon.
//!
//! Supports TOML deserialization with sensible defaults for
//! development and explicit values for deployed units.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick period for the sampling loop.
    #[serde(with = "humantime_serde")]
    pub tick_period: Duration,

    /// Watchdog timeout (typically 2-3x tick period).
    #[serde(with = "humantime_serde")]
    pub watchdog_timeout: Duration,

    /// Maximum allowed tick overrun before the fault policy escalates.
    #[serde(with = "humantime_serde")]
    pub max_overrun: Duration,

    /// Counter source configuration.
    pub sampling: SamplingConfig,

    /// External command probe configuration.
    pub probes: ProbeConfig,

    /// Display configuration.
    pub display: DisplayConfig,

    /// Tick metrics configuration.
    pub metrics: MetricsConfig,

    /// Fault handling policy.
    pub fault_policy: FaultPolicyConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            watchdog_timeout: Duration::from_secs(3),
            max_overrun: Duration::from_millis(250),
            sampling: SamplingConfig::default(),
            probes: ProbeConfig::default(),
            display: DisplayConfig::default(),
            metrics: MetricsConfig::default(),
            fault_policy: FaultPolicyConfig::default(),
        }
    }
}

/// Where the raw counters come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Interface reported when the default route cannot be inspected.
    pub fallback_interface: String,

    /// Filesystem whose usage is reported.
    pub disk_path: PathBuf,

    /// Thermal zone file holding the CPU temperature in millidegrees.
    pub thermal_zone: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            fallback_interface: String::from("wlan0"),
            disk_path: PathBuf::from("/"),
            thermal_zone: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
        }
    }
}

/// External command probes (route discovery, firmware throttle query).
///
/// Commands are configurable so tests can substitute scripts and so the
/// daemon can run on boards where the tools live outside `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Command printing the default route (first token after `dev` wins).
    pub route_command: Vec<String>,

    /// Command printing the firmware throttle word (`throttled=0x...`).
    pub throttle_command: Vec<String>,

    /// Deadline for a single probe command; the child is killed on expiry.
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            route_command: vec![
                String::from("ip"),
                String::from("route"),
                String::from("get"),
                String::from("1"),
            ],
            throttle_command: vec![String::from("vcgencmd"), String::from("get_throttled")],
            command_timeout: Duration::from_millis(500),
        }
    }
}

/// Display driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDriver {
    /// Text rendering to stdout.
    #[default]
    Console,
    /// Discard all frames.
    Null,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Renderer backend.
    pub driver: DisplayDriver,

    /// Progress bar width in cells.
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            driver: DisplayDriver::Console,
            bar_width: 20,
        }
    }
}

/// Tick metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable tick latency collection.
    pub enabled: bool,

    /// Size of the latency histogram ring buffer.
    pub histogram_size: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_size: 600,
        }
    }
}

/// Policy for handling tick overruns.
///
/// A 1 s display loop that occasionally runs long should keep going, so
/// the default is `warn`; `fault` retains the strict escalation for
/// deployments that prefer a restart over a degraded cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Log a warning but continue (default).
    #[default]
    Warn,
    /// Enter fault state when the overrun exceeds `max_overrun`.
    Fault,
    /// Silently ignore overruns.
    Ignore,
}

/// Fault handling policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FaultPolicyConfig {
    /// How to handle tick overruns.
    pub on_overrun: OverrunPolicy,
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
