//! Specialist dispatch policies. Each accepts a `BatteryContext` and
//! returns at most one `Recommendation` per tick.

pub mod arbitrage;
pub mod override_policy;
pub mod peak_shaving;

pub use arbitrage::ArbitragePolicy;
pub use override_policy::OverridePolicy;
pub use peak_shaving::PeakShavingPolicy;

use boreal_types::{BatteryContext, Recommendation};

/// The class hierarchy of policies in the source becomes a tagged variant:
/// the coordinator holds a homogeneous sequence and never reaches back
/// into it. PeakShaving and Arbitrage borrow the shared ValueCalculator;
/// the lifetime ties them to the run that constructed the coordinator.
#[derive(Debug, Clone, Copy)]
pub enum Policy<'a> {
    Override(OverridePolicy),
    PeakShaving(PeakShavingPolicy<'a>),
    Arbitrage(ArbitragePolicy<'a>),
}

impl Policy<'_> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Override(_) => "override",
            Policy::PeakShaving(_) => "peak_shaving",
            Policy::Arbitrage(_) => "arbitrage",
        }
    }

    pub fn propose(&self, context: &BatteryContext) -> Option<Recommendation> {
        match self {
            Policy::Override(p) => p.propose(context),
            Policy::PeakShaving(p) => p.propose(context),
            Policy::Arbitrage(p) => p.propose(context),
        }
    }
}
