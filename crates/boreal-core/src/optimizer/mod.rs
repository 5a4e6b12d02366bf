//! 24-hour day-ahead optimiser: LP-first with a heuristic fallback.

pub mod heuristic;
pub mod lp;

use boreal_types::{DailyPlan, TariffParams};
use tracing::warn;

/// Everything the optimiser needs for one simulated day. All arrays are
/// hour-indexed, 0 = the first hour of the planning horizon.
#[derive(Debug, Clone)]
pub struct OptimiserInputs {
    pub date: String,
    pub consumption_forecast_kw: [f64; 24],
    pub solar_forecast_kw: [f64; 24],
    pub spot_forecast: [f64; 24],
    pub is_measurement_hour: [bool; 24],

    pub initial_soc_kwh: f64,
    pub capacity_kwh: f64,
    pub min_soc_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub efficiency: f64,

    pub tariff: TariffParams,
    pub peak_reserve_kwh: f64,
    pub peak_penalty_multiplier: f64,
    pub grid_import_limit_kw: f64,
}

impl OptimiserInputs {
    fn price_h(&self, h: usize) -> f64 {
        (self.spot_forecast[h] + self.tariff.grid_fee + self.tariff.energy_tax) * (1.0 + self.tariff.vat_rate)
    }

    /// No-battery cost: grid import equals consumption minus solar, floored
    /// at zero since this formulation has no export variable.
    fn baseline_cost_sek(&self) -> f64 {
        (0..24)
            .map(|h| (self.consumption_forecast_kw[h] - self.solar_forecast_kw[h]).max(0.0) * self.price_h(h))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DailyOptimiser;

impl DailyOptimiser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Solves the LP; on solver failure or a non-optimal result, falls
    /// back to the greedy heuristic. Both paths yield the same DailyPlan
    /// shape and are scored against the same baseline.
    #[must_use]
    pub fn optimize(&self, inputs: &OptimiserInputs) -> DailyPlan {
        match lp::solve(inputs) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(date = %inputs.date, error = %err, "LP optimiser unavailable, falling back to heuristic");
                heuristic::solve(inputs)
            }
        }
    }
}
