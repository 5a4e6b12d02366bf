//! Logging initialisation and run-level telemetry, shared by the backtest
//! crate and the CLI binary.

pub mod telemetry;

pub use telemetry::{RunTelemetry, init_tracing};
