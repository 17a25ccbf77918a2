//! Discarding renderer.

use sysmon_core::render::DisplayRenderer;
use sysmon_core::sample::SystemSnapshot;

/// Renderer that drops every frame.
///
/// Used for headless runs where only the log output matters.
#[derive(Debug, Default)]
pub struct NullRenderer {
    frames: u64,
}

impl NullRenderer {
    /// Create a null renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames received (for tests).
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl DisplayRenderer for NullRenderer {
    fn render(&mut self, _snapshot: &SystemSnapshot) {
        self.frames += 1;
    }
}
