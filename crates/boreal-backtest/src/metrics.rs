//! Comparison between two completed runs, typically "battery" vs a
//! no-battery baseline, or two tariff configurations.

use serde::{Deserialize, Serialize};

use boreal_types::RunSummary;

/// Delta of one run's totals against another, plus a savings percentage
/// where the baseline cost is nonzero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonDiff {
    pub baseline_cost_sek: f64,
    pub candidate_cost_sek: f64,
    pub savings_sek: f64,
    pub savings_percent: f64,

    pub peak_shaving_savings_sek: f64,
    pub conflicts_resolved: u64,
    pub vetoes_applied: u64,
    pub suppressed_by_true_value: u64,
}

#[must_use]
pub fn calculate_comparison(baseline: &RunSummary, candidate: &RunSummary) -> ComparisonDiff {
    let baseline_cost_sek = baseline.total_cost_with_battery_sek;
    let candidate_cost_sek = candidate.total_cost_with_battery_sek;
    let savings_sek = baseline_cost_sek - candidate_cost_sek;
    let savings_percent = if baseline_cost_sek > 0.0 {
        savings_sek / baseline_cost_sek * 100.0
    } else {
        0.0
    };

    ComparisonDiff {
        baseline_cost_sek,
        candidate_cost_sek,
        savings_sek,
        savings_percent,
        peak_shaving_savings_sek: candidate.peak_shaving_savings_sek,
        conflicts_resolved: candidate.counters.conflicts_resolved,
        vetoes_applied: candidate.counters.vetoes_applied,
        suppressed_by_true_value: candidate.counters.suppressed_by_true_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::PolicyCounters;

    fn summary(cost: f64) -> RunSummary {
        RunSummary {
            total_baseline_cost_sek: cost,
            total_cost_with_battery_sek: cost,
            net_savings_sek: 0.0,
            peak_shaving_savings_sek: 0.0,
            soc_series_kwh: Vec::new(),
            grid_import_series_kw: Vec::new(),
            grid_export_series_kw: Vec::new(),
            monthly_peaks: Vec::new(),
            counters: PolicyCounters::default(),
            decisions: Vec::new(),
        }
    }

    #[test]
    fn computes_savings_percent_against_baseline() {
        let diff = calculate_comparison(&summary(100.0), &summary(80.0));
        assert_eq!(diff.savings_sek, 20.0);
        assert!((diff.savings_percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_cost_yields_zero_percent() {
        let diff = calculate_comparison(&summary(0.0), &summary(0.0));
        assert_eq!(diff.savings_percent, 0.0);
    }
}
