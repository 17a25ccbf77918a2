//! Console renderer.
//!
//! Reproduces the five-row panel layout as text: three labelled
//! progress-bar rows, a throughput/temperature row, and the power
//! status row. Writes to any `io::Write` so tests can capture frames.

use crate::bar::render_bar;
use std::io::{self, Write};
use sysmon_core::render::DisplayRenderer;
use sysmon_core::sample::SystemSnapshot;
use tracing::warn;

/// Text renderer for the snapshot.
pub struct ConsoleRenderer<W: Write + Send> {
    out: W,
    bar_width: usize,
}

impl ConsoleRenderer<io::Stdout> {
    /// Render to stdout.
    #[must_use]
    pub fn stdout(bar_width: usize) -> Self {
        Self::new(io::stdout(), bar_width)
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Render to an arbitrary writer.
    pub fn new(out: W, bar_width: usize) -> Self {
        Self {
            out,
            bar_width: bar_width.max(1),
        }
    }

    /// Consume the renderer and return the writer (for tests).
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, snapshot: &SystemSnapshot) -> io::Result<()> {
        let width = self.bar_width;

        writeln!(
            self.out,
            "CPU  {} {:3.0} %",
            render_bar(width, Some(snapshot.cpu_usage_pct)),
            snapshot.cpu_usage_pct
        )?;
        writeln!(
            self.out,
            "RAM  {} {:3.0} %",
            render_bar(width, Some(snapshot.ram_usage_pct)),
            snapshot.ram_usage_pct
        )?;
        match snapshot.disk_usage_pct {
            Some(pct) => writeln!(self.out, "Disk {} {:3.0} %", render_bar(width, Some(pct)), pct)?,
            // Unavailable: blank bar, no number pretending to be a reading
            None => writeln!(self.out, "Disk {}  --", render_bar(width, None))?,
        }
        writeln!(
            self.out,
            "DL:{:.0} KB/s  UL:{:.0} KB/s  T:{:.1} C",
            snapshot.download_kbs, snapshot.upload_kbs, snapshot.cpu_temp_c
        )?;
        writeln!(self.out, "Power: {}", snapshot.power.status)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> DisplayRenderer for ConsoleRenderer<W> {
    fn render(&mut self, snapshot: &SystemSnapshot) {
        if let Err(e) = self.write_frame(snapshot) {
            // Rendering failures stay here; the loop keeps its cadence
            warn!(error = %e, "Console render failed");
        }
    }
}
