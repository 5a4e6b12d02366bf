use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Optimal,
    Suboptimal,
    Failed,
}

/// A 24-entry hour-by-hour charge/discharge schedule produced by the
/// optimiser (LP or heuristic), consumed by the coordinator one hour at
/// a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: String,

    pub charge_schedule_kwh: [f64; 24],
    pub discharge_schedule_kwh: [f64; 24],
    pub projected_soc_kwh: [f64; 24],
    pub projected_grid_import_kw: [f64; 24],

    pub expected_cost_sek: f64,
    pub expected_peak_kw: f64,
    pub expected_savings_sek: f64,
    pub status: PlanStatus,
    pub reasoning: String,
}

impl DailyPlan {
    #[must_use]
    pub fn failed(date: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            charge_schedule_kwh: [0.0; 24],
            discharge_schedule_kwh: [0.0; 24],
            projected_soc_kwh: [0.0; 24],
            projected_grid_import_kw: [0.0; 24],
            expected_cost_sek: 0.0,
            expected_peak_kw: 0.0,
            expected_savings_sek: 0.0,
            status: PlanStatus::Failed,
            reasoning: reasoning.into(),
        }
    }
}
