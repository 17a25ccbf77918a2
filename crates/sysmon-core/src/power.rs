//! Decoding of the firmware throttle status word.
//!
//! The firmware reports a 32-bit bitfield: the low 16 bits are
//! currently-active conditions, the high 16 bits mirror them as
//! "has occurred since boot". The analyzer reduces the word to a single
//! prioritized label for the display and tracks the last-seen value so
//! transitions get logged.

use std::fmt;
use sysmon_common::error::MonitorResult;
use tracing::{info, warn};

/// Raw 32-bit throttle status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottledStatus(pub u32);

impl ThrottledStatus {
    /// Undervoltage detected.
    pub const UNDERVOLT: u32 = 1 << 0;
    /// ARM frequency capped.
    pub const FREQ_CAPPED: u32 = 1 << 1;
    /// Currently throttled.
    pub const THROTTLED: u32 = 1 << 2;
    /// Soft temperature limit active.
    pub const TEMP_LIMIT: u32 = 1 << 3;

    /// Currently-active condition bits.
    #[must_use]
    pub fn current_bits(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Since-boot condition bits.
    #[must_use]
    pub fn past_bits(self) -> u32 {
        self.0 >> 16
    }
}

/// Single prioritized power condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCondition {
    /// No condition bits set.
    Ok,
    /// Supply voltage below threshold.
    Undervolt,
    /// ARM frequency capped by firmware.
    FreqCapped,
    /// Actively throttled.
    Throttled,
    /// Soft temperature limit reached.
    TempLimit,
}

impl fmt::Display for PowerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Undervolt => write!(f, "Undervolt"),
            Self::FreqCapped => write!(f, "Freq cap"),
            Self::Throttled => write!(f, "Throttled"),
            Self::TempLimit => write!(f, "Temp limit"),
        }
    }
}

/// Displayable power status, including the pre-baseline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    /// The throttle word could not be read this tick.
    Unavailable,
    /// First successful read; baseline stored, no comparison yet.
    Checking,
    /// Decoded current condition.
    Condition(PowerCondition),
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "Unable to determine power status"),
            Self::Checking => write!(f, "Checking status"),
            Self::Condition(c) => c.fmt(f),
        }
    }
}

/// One tick's power reading: the display label plus the raw word for
/// consumers that need the full multi-bit detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReport {
    /// Prioritized single-label status.
    pub status: PowerStatus,
    /// Raw throttle word, when the read succeeded.
    pub raw: Option<u32>,
}

/// Stateful throttle-word analyzer.
///
/// Tracks the last successfully read value so state transitions are
/// logged exactly once.
#[derive(Debug, Default)]
pub struct PowerStatusAnalyzer {
    last_throttled: Option<u32>,
}

impl PowerStatusAnalyzer {
    /// Create an analyzer with no baseline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce a 16-bit condition half-word to its highest-priority label.
    ///
    /// Strict priority: undervolt > frequency cap > throttled > soft
    /// temperature limit. Only the first matching bit is reported; the
    /// raw word on [`PowerReport`] carries the rest.
    #[must_use]
    pub fn analyze(bits: u32) -> PowerCondition {
        if bits & ThrottledStatus::UNDERVOLT != 0 {
            PowerCondition::Undervolt
        } else if bits & ThrottledStatus::FREQ_CAPPED != 0 {
            PowerCondition::FreqCapped
        } else if bits & ThrottledStatus::THROTTLED != 0 {
            PowerCondition::Throttled
        } else if bits & ThrottledStatus::TEMP_LIMIT != 0 {
            PowerCondition::TempLimit
        } else {
            PowerCondition::Ok
        }
    }

    /// Interpret one tick's throttle read.
    ///
    /// A failed read returns [`PowerStatus::Unavailable`]. The first
    /// successful read stores the baseline and returns
    /// [`PowerStatus::Checking`] regardless of its bits. Afterwards a
    /// changed value is logged and stored, and the returned status is
    /// the current-condition label; since-boot issues are logged but
    /// never displayed.
    pub fn interpret(&mut self, read: MonitorResult<u32>) -> PowerReport {
        let raw = match read {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unable to determine power status");
                return PowerReport {
                    status: PowerStatus::Unavailable,
                    raw: None,
                };
            }
        };

        match self.last_throttled {
            None => {
                self.last_throttled = Some(raw);
                return PowerReport {
                    status: PowerStatus::Checking,
                    raw: Some(raw),
                };
            }
            Some(prev) if prev != raw => {
                let hex = format!("{raw:#010x}");
                info!(value = %hex, "Throttle status changed");
                self.last_throttled = Some(raw);
            }
            Some(_) => {}
        }

        let status = ThrottledStatus(raw);
        let current = Self::analyze(status.current_bits());
        let past = Self::analyze(status.past_bits());

        if past != PowerCondition::Ok {
            info!("Issues detected: {current}; Past Issues: {past}");
        } else if current != PowerCondition::Ok {
            info!("Issues detected: {current}");
        }

        PowerReport {
            status: PowerStatus::Condition(current),
            raw: Some(raw),
        }
    }
}
