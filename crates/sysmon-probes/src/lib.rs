#![doc = "Counter source implementations for the OLED system monitor."]

pub mod command;
pub mod linux;
pub mod simulated;

pub use command::*;
pub use linux::*;
pub use simulated::*;
