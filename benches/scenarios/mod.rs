//! Whole-engine benchmarks.
//!
//! These run complete graphs the way a module firmware would: every
//! channel active, sends into delay and reverb, the master chain engaged.

mod graph;

pub use graph::bench_graph;
