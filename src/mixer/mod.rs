//! Channels, buses and the per-block driver.
//!
//! `AudioGraph` owns everything the audio callback touches. The control
//! context never reaches into it directly: knob values go through a
//! [`ParamBank`](params::ParamBank) and discrete events through an SPSC
//! queue, both drained by [`AudioGraph::poll`](graph::AudioGraph::poll) at
//! the top of each block.

/// Input strip: gain, distortion, filter, pan, sends.
pub mod channel;
/// Bus summing, send effects and the master chain.
pub mod graph;
/// Control events and the audio-side receiver.
pub mod message;
/// Parameter identifiers and the atomic knob bank.
pub mod params;

pub use channel::{Channel, ChannelFilter, ChannelFilterKind};
pub use graph::{AudioGraph, MasterChain};
#[cfg(feature = "rtrb")]
pub use message::{control_channel, ControlHandle};
pub use message::{ControlEvent, ControlReceiver, EventReceiver};
pub use params::{ChannelParam, ControlError, MasterParam, ParamBank, ParamId};
