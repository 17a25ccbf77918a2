//! Monitor daemon entry point.
//!
//! Wires the counter probes, the sampling loop, and the display
//! renderer into a long-running daemon with signal handling and
//! diagnostics.

mod diagnostics;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sysmon_common::config::{DisplayDriver, MonitorConfig};
use sysmon_common::state::RuntimeState;
use sysmon_core::monitor::{Monitor, MonitorBuilder};
use sysmon_core::render::DisplayRenderer;
use sysmon_core::source::SystemStatsSource;
use sysmon_display::console::ConsoleRenderer;
use sysmon_display::null::NullRenderer;
use sysmon_probes::linux::LinuxStatsSource;
use sysmon_probes::simulated::SimulatedStatsSource;
use tracing::{error, info, warn};

use crate::diagnostics::{DiagnosticsCollector, DiagnosticsState};
use crate::signals::SignalHandler;

/// Ticks between periodic status lines (once a minute at 1 Hz).
const STATUS_LOG_INTERVAL: u64 = 60;

/// Monitor daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sysmon-daemon",
    about = "OLED system monitor daemon - cyclic sampling of CPU, RAM, disk, network, and power status",
    version,
    long_about = None
)]
struct Args {
    /// Path to a monitor configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tick period override (e.g. "1s", "500ms").
    #[arg(long, short = 't', value_parser = humantime::parse_duration)]
    tick_period: Option<Duration>,

    /// Run against a simulated counter source (no hardware reads).
    #[arg(long, short = 's')]
    simulated: bool,

    /// Maximum ticks to run (0 = infinite).
    #[arg(long, default_value = "0")]
    max_ticks: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Discard frames instead of rendering them.
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting monitor daemon");

    // Load configuration
    let mut config = load_config(&args)?;

    // Override with command-line arguments
    if let Some(period) = args.tick_period {
        config.tick_period = period;
    }
    if args.quiet {
        config.display.driver = DisplayDriver::Null;
    }

    info!(?config.tick_period, ?config.display.driver, "Configuration loaded");

    // Set up signal handling
    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    // Set up diagnostics
    let diag_state = Arc::new(DiagnosticsState::new());
    let diagnostics = DiagnosticsCollector::new(Arc::clone(&diag_state));

    // Run the daemon
    run_daemon(&config, &args, &signal_handler, &diagnostics)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "sysmon_daemon={level},sysmon_core={level},sysmon_probes={level},sysmon_display={level},sysmon_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `SYSMON_CONFIG_PATH` environment variable
/// 3. `/etc/sysmon/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<MonitorConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return MonitorConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("SYSMON_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from SYSMON_CONFIG_PATH");
            return MonitorConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from SYSMON_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "SYSMON_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    // 3. System path
    let system_path = PathBuf::from("/etc/sysmon/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return MonitorConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {system_path:?}"));
    }

    // 4. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return MonitorConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    // 5. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(MonitorConfig::default())
}

/// Pick the counter source and hand off to the renderer dispatch.
fn run_daemon(
    config: &MonitorConfig,
    args: &Args,
    signal_handler: &SignalHandler,
    diagnostics: &DiagnosticsCollector,
) -> Result<()> {
    if args.simulated {
        info!("Using simulated counter source");
        run_with_source(
            simulated_source(),
            config,
            signal_handler,
            diagnostics,
            args.max_ticks,
        )
    } else {
        let source =
            LinuxStatsSource::from_config(config).context("Failed to build counter source")?;
        run_with_source(source, config, signal_handler, diagnostics, args.max_ticks)
    }
}

/// Build a simulated source with a baseline so deltas start defined.
fn simulated_source() -> SimulatedStatsSource {
    let mut source = SimulatedStatsSource::new();
    source.push_cpu_sample(&[1000, 0, 400, 8600, 100, 0, 10, 0]);
    source.push_network_counters(10_240, 4_096);
    source
}

/// Pick the renderer and run the monitor loop.
fn run_with_source<S: SystemStatsSource>(
    source: S,
    config: &MonitorConfig,
    signal_handler: &SignalHandler,
    diagnostics: &DiagnosticsCollector,
    max_ticks: u64,
) -> Result<()> {
    match config.display.driver {
        DisplayDriver::Console => run_monitor_loop(
            build_monitor(source, ConsoleRenderer::stdout(config.display.bar_width), config),
            config,
            signal_handler,
            diagnostics,
            max_ticks,
        ),
        DisplayDriver::Null => run_monitor_loop(
            build_monitor(source, NullRenderer::new(), config),
            config,
            signal_handler,
            diagnostics,
            max_ticks,
        ),
    }
}

/// Create a monitor with the configured watchdog.
fn build_monitor<S: SystemStatsSource, R: DisplayRenderer>(
    source: S,
    renderer: R,
    config: &MonitorConfig,
) -> Monitor<S, R> {
    MonitorBuilder::new(source, renderer)
        .config(config.clone())
        .watchdog_timeout(config.watchdog_timeout)
        .build()
}

/// Run the monitor main loop until a signal, fault, or tick limit.
fn run_monitor_loop<S: SystemStatsSource, R: DisplayRenderer>(
    mut monitor: Monitor<S, R>,
    config: &MonitorConfig,
    signal_handler: &SignalHandler,
    diagnostics: &DiagnosticsCollector,
    max_ticks: u64,
) -> Result<()> {
    monitor.initialize().context("Failed to initialize monitor")?;
    monitor.start().context("Failed to start monitor")?;
    info!(state = %monitor.state(), "Monitor started, entering main loop");

    let mut ticks_run = 0u64;

    while monitor.state() == RuntimeState::Run {
        // Check for shutdown signal
        if signal_handler.shutdown_requested() {
            info!("Shutdown signal received, stopping monitor");
            break;
        }

        // Check for reload signal (config reload)
        if signal_handler.take_reload_request() {
            info!("Reload signal received (config reload not yet implemented)");
        }

        // A stalled loop cannot observe its own stall; the watchdog
        // thread records it and we bail out here on the next tick
        if monitor.watchdog_triggered() {
            error!("Watchdog triggered, stopping monitor");
            break;
        }

        // Run one tick
        match monitor.run_tick() {
            Ok(result) => {
                diagnostics
                    .state()
                    .record_tick(result.execution_time, result.overrun);

                if result.overrun {
                    warn!(
                        tick = result.tick_count,
                        execution_ms = result.execution_time.as_millis(),
                        "Tick overrun detected"
                    );
                }
            }
            Err(e) => {
                error!("Tick execution failed: {}", e);
                break;
            }
        }

        // Check tick limit
        ticks_run += 1;
        if max_ticks > 0 && ticks_run >= max_ticks {
            info!(ticks = ticks_run, "Maximum tick count reached");
            break;
        }

        // Periodic status logging
        if config.metrics.enabled && ticks_run % STATUS_LOG_INTERVAL == 0 {
            let metrics = monitor.metrics();
            info!(
                ticks = ticks_run,
                health = %diagnostics.health_from_state(monitor.state()),
                avg_ms = metrics.mean().map(|d| d.as_millis()).unwrap_or(0),
                max_ms = metrics.max().map(|d| d.as_millis()).unwrap_or(0),
                overruns = diagnostics.state().overrun_count(),
                "Periodic status"
            );
        }
    }

    // Graceful shutdown
    info!("Shutting down...");

    if let Err(e) = monitor.stop() {
        warn!("Monitor stop failed: {}", e);
    }

    // Final statistics
    let snapshot = diagnostics.snapshot(monitor.state(), monitor.metrics());
    info!(
        total_ticks = snapshot.tick_count,
        overruns = snapshot.overrun_count,
        signals = signal_handler.state().signal_count(),
        uptime_secs = snapshot.uptime.as_secs(),
        health = %snapshot.health,
        final_state = %snapshot.state,
        "Daemon shutdown complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["sysmon-daemon", "--simulated"]);
        assert!(args.simulated);
        assert!(args.config.is_none());
        assert_eq!(args.max_ticks, 0);
    }

    #[test]
    fn test_args_with_config_and_period() {
        let args = Args::parse_from(["sysmon-daemon", "-c", "test.toml", "-t", "250ms"]);
        assert_eq!(args.config, Some(PathBuf::from("test.toml")));
        assert_eq!(args.tick_period, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_default_config() {
        // Should succeed with defaults even without a config file
        let config = MonitorConfig::default();
        assert_eq!(config.tick_period.as_secs(), 1);
    }

    #[test]
    fn test_simulated_source_has_baselines() {
        let mut source = simulated_source();
        assert!(source.read_cpu_time_sample().is_ok());
        assert!(source.read_network_counters("sim0").is_ok());
    }
}
