//! End-to-end monitor loop tests against the simulated source.

use super::common::{fast_config, scripted_monitor, seeded_source};
use std::time::Instant;
use sysmon_core::monitor::MonitorBuilder;
use sysmon_core::power::{PowerCondition, PowerStatus};
use sysmon_display::console::ConsoleRenderer;

#[test]
fn first_tick_reports_cold_start_zeros() {
    let mut monitor = scripted_monitor(seeded_source(), 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();

    let snap = &monitor.renderer.snapshots[0];
    assert_eq!(snap.cpu_usage_pct, 0.0);
    assert_eq!(snap.download_kbs, 0.0);
    assert_eq!(snap.upload_kbs, 0.0);
    assert_eq!(snap.power.status, PowerStatus::Checking);
}

#[test]
fn cpu_percentage_matches_hand_computed_value() {
    let mut source = seeded_source();
    // Against the seeded [100, 0, 50, 900] baseline:
    // deltas user +30, idle +90 -> total 120, busy 30 -> 25%
    source.push_cpu_sample(&[130, 0, 50, 990]);
    source.push_network_counters(3072, 2048);

    let mut monitor = scripted_monitor(source, 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();
    monitor.run_tick().unwrap();

    let snap = &monitor.renderer.snapshots[1];
    assert!((snap.cpu_usage_pct - 25.0).abs() < 0.01);
    // 2048 new rx bytes over one tick
    assert!((snap.download_kbs - 2.0).abs() < 0.01);
    assert!((snap.upload_kbs - 0.0).abs() < 0.01);
}

#[test]
fn power_status_settles_after_baseline() {
    let mut source = seeded_source();
    source.set_throttled(0);

    let mut monitor = scripted_monitor(source, 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();
    monitor.run_tick().unwrap();

    // Active undervolt with a since-boot history appears on tick three
    monitor.source.set_throttled(0x0005_0005);
    monitor.run_tick().unwrap();

    let snapshots = &monitor.renderer.snapshots;
    assert_eq!(snapshots[0].power.status, PowerStatus::Checking);
    assert_eq!(
        snapshots[1].power.status,
        PowerStatus::Condition(PowerCondition::Ok)
    );
    assert_eq!(
        snapshots[2].power.status,
        PowerStatus::Condition(PowerCondition::Undervolt)
    );
    // Raw word is exposed alongside the single-label summary
    assert_eq!(snapshots[2].power.raw, Some(0x0005_0005));
}

#[test]
fn disk_failure_is_unavailable_not_zero() {
    let mut source = seeded_source();
    source.fail_disk(true);

    let mut monitor = scripted_monitor(source, 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();
    assert_eq!(monitor.renderer.snapshots[0].disk_usage_pct, None);

    // Recovery next tick
    monitor.source.fail_disk(false);
    monitor.run_tick().unwrap();
    let pct = monitor.renderer.snapshots[1].disk_usage_pct.unwrap();
    assert!((pct - 25.0).abs() < 0.01);
}

#[test]
fn memory_failure_reports_default_path_value() {
    let mut source = seeded_source();
    source.fail_memory(true);

    let mut monitor = scripted_monitor(source, 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();

    // Empty-mapping substitution: total=1, available=0 -> 100%
    let snap = &monitor.renderer.snapshots[0];
    assert!((snap.ram_usage_pct - 100.0).abs() < 1e-9);
}

#[test]
fn temperature_failure_keeps_last_reading() {
    let mut source = seeded_source();
    source.set_temperature(51.5);

    let mut monitor = scripted_monitor(source, 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();
    monitor.source.fail_temperature(true);
    monitor.run_tick().unwrap();

    let snapshots = &monitor.renderer.snapshots;
    assert!((snapshots[0].cpu_temp_c - 51.5).abs() < 1e-9);
    assert!((snapshots[1].cpu_temp_c - 51.5).abs() < 1e-9);
}

#[test]
fn cadence_spans_at_least_the_configured_periods() {
    let mut monitor = scripted_monitor(seeded_source(), 40);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    let start = Instant::now();
    for _ in 0..5 {
        monitor.run_tick().unwrap();
    }
    let elapsed = start.elapsed();

    // Five ticks at 40 ms each; allow slack above, none below
    assert!(elapsed.as_millis() >= 160, "ran too fast: {elapsed:?}");
    assert!(elapsed.as_millis() < 2000, "ran too slow: {elapsed:?}");
    assert_eq!(monitor.tick_count(), 5);
}

#[test]
fn console_frame_renders_through_the_loop() {
    let mut source = seeded_source();
    source.fail_disk(true);

    let mut monitor = MonitorBuilder::new(source, ConsoleRenderer::new(Vec::new(), 10))
        .config(fast_config(10))
        .build();
    monitor.initialize().unwrap();
    monitor.start().unwrap();
    monitor.run_tick().unwrap();
    monitor.stop().unwrap();

    let frame = String::from_utf8(monitor.renderer.into_inner()).unwrap();
    assert!(frame.contains("CPU  ["));
    assert!(frame.contains("Power: Checking status"));

    // Failed disk read never renders as a percentage
    let disk_row = frame.lines().find(|l| l.starts_with("Disk")).unwrap();
    assert!(!disk_row.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn stop_ends_the_run_loop() {
    let mut monitor = scripted_monitor(seeded_source(), 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();

    monitor.run_tick().unwrap();
    monitor.stop().unwrap();

    // A stopped monitor refuses further ticks
    assert!(monitor.run_tick().is_err());
    assert_eq!(monitor.renderer.snapshots.len(), 1);
}
