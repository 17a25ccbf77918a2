#![doc = "Sampling engine and cyclic monitor loop for the OLED system monitor."]

pub mod monitor;
pub mod power;
pub mod render;
pub mod sample;
pub mod sampler;
pub mod source;
pub mod watchdog;

pub use monitor::*;
pub use power::*;
pub use render::*;
pub use sample::*;
pub use sampler::*;
pub use source::*;
pub use watchdog::*;
