//! Acceptance tests for the OLED system monitor workspace.
//!
//! These tests exercise the assembled system end-to-end:
//! - Scripted counter sources driving the full monitor loop
//! - Cadence and watchdog behavior under a fast tick period
//! - Configuration loading from disk

mod acceptance;
