use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recommendation::Decision;

/// One hourly row of input data driving the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRow {
    pub timestamp: DateTime<Utc>,
    pub consumption_kwh: f64,
    pub spot_price: f64,
    #[serde(default)]
    pub solar_kwh: f64,
    #[serde(default)]
    pub realised_import_cost: Option<f64>,
    #[serde(default)]
    pub realised_export_revenue: Option<f64>,
}

/// Top-N peak statistics for one calendar month, for the post-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPeakStats {
    pub month: String,
    pub total_measurements: usize,
    pub top_n_peaks: Vec<f64>,
    pub top_n_average_kw: f64,
    pub threshold_kw: f64,
    pub max_peak_kw: f64,
    pub min_peak_kw: f64,
    pub avg_all_kw: f64,
    pub effect_tariff_cost_sek: f64,
}

/// Policy arbitration counters accrued across a run, for reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyCounters {
    pub decisions: u64,
    pub conflicts_resolved: u64,
    pub vetoes_applied: u64,
    pub overrides_triggered: u64,
    pub suppressed_by_true_value: u64,
    pub cumulative_opportunity_cost_sek: f64,
}

/// Full result of running the simulator over a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_baseline_cost_sek: f64,
    pub total_cost_with_battery_sek: f64,
    pub net_savings_sek: f64,
    pub peak_shaving_savings_sek: f64,

    pub soc_series_kwh: Vec<f64>,
    pub grid_import_series_kw: Vec<f64>,
    pub grid_export_series_kw: Vec<f64>,

    pub monthly_peaks: Vec<MonthlyPeakStats>,
    pub counters: PolicyCounters,

    #[serde(default)]
    pub decisions: Vec<Decision>,
}
