//! Trait boundary for an external day-ahead advisory (e.g. an LLM-backed
//! planner). This crate ships no concrete network-backed implementation;
//! a caller wanting one implements this trait against whatever HTTP
//! client it prefers and the coordinator treats the result identically to
//! the internal optimiser's output.

use boreal_types::{BatteryContext, DailyPlan, EngineError};

pub trait PlanAdvisor {
    /// Produces a 24-hour plan for the day starting at `context`'s
    /// timestamp, given the same forecast horizon the internal optimiser
    /// would use. Implementations should fail fast — callers fall back to
    /// the internal optimiser on any error, so a slow or wedged advisory
    /// must not be allowed to block a tick beyond its own timeout.
    fn advise(&self, context: &BatteryContext, spot_forecast: &[f64; 24]) -> Result<DailyPlan, EngineError>;
}
