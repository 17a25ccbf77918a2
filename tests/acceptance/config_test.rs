//! Configuration loading from disk.

use std::fs;
use std::time::Duration;
use sysmon_common::config::{DisplayDriver, MonitorConfig, OverrunPolicy};
use tempfile::TempDir;

#[test]
fn config_loads_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
            tick_period = "2s"
            watchdog_timeout = "6s"

            [sampling]
            fallback_interface = "eth0"

            [display]
            driver = "null"

            [fault_policy]
            on_overrun = "ignore"
        "#,
    )
    .unwrap();

    let config = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(config.tick_period, Duration::from_secs(2));
    assert_eq!(config.watchdog_timeout, Duration::from_secs(6));
    assert_eq!(config.sampling.fallback_interface, "eth0");
    assert_eq!(config.display.driver, DisplayDriver::Null);
    assert_eq!(config.fault_policy.on_overrun, OverrunPolicy::Ignore);
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = MonitorConfig::from_file(&dir.path().join("nope.toml"));
    assert!(result.is_err());
}

#[test]
fn default_config_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("default.toml");

    let config = MonitorConfig::default();
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    let reloaded = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(reloaded.tick_period, config.tick_period);
    assert_eq!(reloaded.probes.route_command, config.probes.route_command);
    assert_eq!(reloaded.display.bar_width, config.display.bar_width);
}
