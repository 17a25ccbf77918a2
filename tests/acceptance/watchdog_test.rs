//! Watchdog behavior under the assembled monitor.

use super::common::{scripted_monitor, seeded_source};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sysmon_core::monitor::MonitorBuilder;
use sysmon_core::watchdog::Watchdog;
use sysmon_probes::simulated::SimulatedStatsSource;

use super::common::RecordingRenderer;

#[test]
fn watchdog_triggers_without_kicks() {
    let fired = Arc::new(AtomicU32::new(0));
    let fired_clone = Arc::clone(&fired);

    let mut wd = Watchdog::new(Duration::from_millis(50));
    wd.start(move || {
        fired_clone.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    thread::sleep(Duration::from_millis(250));

    assert!(wd.has_triggered());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    wd.stop();
}

#[test]
fn ticking_monitor_keeps_watchdog_quiet() {
    let mut monitor = MonitorBuilder::new(seeded_source(), RecordingRenderer::default())
        .tick_period(Duration::from_millis(20))
        .watchdog_timeout(Duration::from_millis(200))
        .build();

    monitor.initialize().unwrap();
    monitor.start().unwrap();

    for _ in 0..5 {
        monitor.run_tick().unwrap();
    }

    assert!(!monitor.watchdog_triggered());
    monitor.stop().unwrap();
}

#[test]
fn stalled_monitor_trips_watchdog() {
    let mut monitor = MonitorBuilder::new(
        SimulatedStatsSource::new(),
        RecordingRenderer::default(),
    )
    .tick_period(Duration::from_millis(10))
    .watchdog_timeout(Duration::from_millis(60))
    .build();

    monitor.initialize().unwrap();
    monitor.start().unwrap();

    // No ticks run: the loop has effectively stalled
    thread::sleep(Duration::from_millis(250));

    assert!(monitor.watchdog_triggered());
    monitor.stop().unwrap();
}

#[test]
fn monitor_without_watchdog_never_reports_trigger() {
    let mut monitor = scripted_monitor(seeded_source(), 10);
    monitor.initialize().unwrap();
    monitor.start().unwrap();
    monitor.run_tick().unwrap();

    assert!(!monitor.watchdog_triggered());
}
