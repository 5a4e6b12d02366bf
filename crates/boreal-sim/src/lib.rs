//! CLI surface for the trace-driven dispatch simulator.

pub mod cli;
