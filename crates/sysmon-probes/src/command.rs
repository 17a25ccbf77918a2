//! Bounded external command probes.
//!
//! Route discovery and the firmware throttle query shell out to system
//! tools. A hung tool must not stall the tick loop, so every run gets a
//! deadline: the child is polled with `try_wait` and killed on expiry.

use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use sysmon_common::error::{MonitorError, MonitorResult};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One external command with a fixed argument list and deadline.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProbe {
    /// Build a probe from a `[program, args...]` command line.
    ///
    /// # Errors
    ///
    /// Returns a config error when the command line is empty.
    pub fn new(command: &[String], timeout: Duration) -> MonitorResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| MonitorError::Config("empty probe command".into()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    /// The program this probe runs.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the command and capture stdout.
    ///
    /// Fails on spawn error, non-zero exit, or deadline expiry; an
    /// expired child is killed and reaped before returning.
    pub fn run(&self) -> MonitorResult<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MonitorError::probe(self.program.clone(), e))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let output = child
                        .wait_with_output()
                        .map_err(|e| MonitorError::probe(self.program.clone(), e))?;
                    if !status.success() {
                        return Err(MonitorError::probe(
                            self.program.clone(),
                            format!("exited with {status}"),
                        ));
                    }
                    return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        debug!(program = %self.program, "Probe deadline expired, killing child");
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(MonitorError::probe(self.program.clone(), "timed out"));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(MonitorError::probe(self.program.clone(), e));
                }
            }
        }
    }
}

/// Extract the interface name from `ip route get` output.
///
/// The kernel prints something like
/// `1.0.0.0 via 192.168.1.1 dev wlan0 src 192.168.1.17 uid 1000`;
/// the token after `dev` is the active interface.
#[must_use]
pub fn parse_route_output(output: &str) -> Option<String> {
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "dev" {
                return tokens.next().map(ToOwned::to_owned);
            }
        }
    }
    None
}

/// Parse `vcgencmd get_throttled` output (`throttled=0x50005`) into the
/// raw 32-bit word. Accepts hex with `0x` prefix or plain decimal.
pub fn parse_throttled_output(output: &str) -> MonitorResult<u32> {
    let value = output
        .trim()
        .split('=')
        .nth(1)
        .ok_or_else(|| MonitorError::probe("throttle", format!("unexpected output: {output:?}")))?;

    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse::<u32>()
    };

    parsed.map_err(|e| MonitorError::probe("throttle", format!("bad value {value:?}: {e}")))
}
