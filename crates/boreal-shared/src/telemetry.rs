//! Logging setup and a run-level telemetry snapshot, shared between the
//! backtest crate and the CLI binary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Initialises a `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info` when unset. Safe to call once per process; a second call is a
/// no-op (the underlying `try_init` swallows the "already set" error).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Post-run snapshot suitable for a dashboard or a stored batch result,
/// narrower than the full `RunSummary` (no per-tick series).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTelemetry {
    pub label: String,
    pub completed_at: DateTime<Utc>,
    pub ticks: usize,
    pub net_savings_sek: f64,
    pub peak_shaving_savings_sek: f64,
    pub conflicts_resolved: u64,
    pub vetoes_applied: u64,
    pub suppressed_by_true_value: u64,
}

impl RunTelemetry {
    #[must_use]
    pub fn from_summary(label: impl Into<String>, completed_at: DateTime<Utc>, summary: &boreal_types::RunSummary) -> Self {
        Self {
            label: label.into(),
            completed_at,
            ticks: summary.soc_series_kwh.len(),
            net_savings_sek: summary.net_savings_sek,
            peak_shaving_savings_sek: summary.peak_shaving_savings_sek,
            conflicts_resolved: summary.counters.conflicts_resolved,
            vetoes_applied: summary.counters.vetoes_applied,
            suppressed_by_true_value: summary.counters.suppressed_by_true_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::{PolicyCounters, RunSummary};

    #[test]
    fn narrows_a_run_summary_to_its_headline_numbers() {
        let summary = RunSummary {
            total_baseline_cost_sek: 100.0,
            total_cost_with_battery_sek: 70.0,
            net_savings_sek: 30.0,
            peak_shaving_savings_sek: 10.0,
            soc_series_kwh: vec![1.0; 24],
            grid_import_series_kw: vec![0.0; 24],
            grid_export_series_kw: vec![0.0; 24],
            monthly_peaks: Vec::new(),
            counters: PolicyCounters::default(),
            decisions: Vec::new(),
        };

        let telemetry = RunTelemetry::from_summary("test", Utc::now(), &summary);
        assert_eq!(telemetry.ticks, 24);
        assert_eq!(telemetry.net_savings_sek, 30.0);
    }
}
