#![doc = "Display renderers for the OLED system monitor."]

pub mod bar;
pub mod console;
pub mod null;

pub use bar::*;
pub use console::*;
pub use null::*;
