pub mod config;
pub mod dsp;
pub mod effects; // Knob-driven effect wrappers
pub mod io;
pub mod mixer; // Channels, buses and the block driver

pub use config::{ConfigError, EngineConfig};
pub use mixer::AudioGraph;

pub const MAX_BLOCK_SIZE: usize = 2048;
