//! Table rendering of run summaries and comparisons for the CLI.

use comfy_table::{Attribute, Cell, Table, presets::UTF8_FULL};

use boreal_backtest::ComparisonDiff;
use boreal_types::RunSummary;

pub struct TableFormatter;

impl TableFormatter {
    #[must_use]
    pub fn format_summary(summary: &RunSummary) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec!["Baseline cost (SEK)", &format!("{:.2}", summary.total_baseline_cost_sek)]);
        table.add_row(vec!["Cost with battery (SEK)", &format!("{:.2}", summary.total_cost_with_battery_sek)]);
        table.add_row(vec!["Net savings (SEK)", &format!("{:.2}", summary.net_savings_sek)]);
        table.add_row(vec!["Peak-shaving savings (SEK)", &format!("{:.2}", summary.peak_shaving_savings_sek)]);
        table.add_row(vec!["Decisions", &summary.counters.decisions.to_string()]);
        table.add_row(vec!["Conflicts resolved", &summary.counters.conflicts_resolved.to_string()]);
        table.add_row(vec!["Vetoes applied", &summary.counters.vetoes_applied.to_string()]);
        table.add_row(vec![
            "Suppressed by true-value adjustment",
            &summary.counters.suppressed_by_true_value.to_string(),
        ]);

        let mut monthly = Table::new();
        monthly.load_preset(UTF8_FULL);
        monthly.set_header(vec![
            Cell::new("Month").add_attribute(Attribute::Bold),
            Cell::new("Top-N avg (kW)").add_attribute(Attribute::Bold),
            Cell::new("Max peak (kW)").add_attribute(Attribute::Bold),
            Cell::new("Effect tariff cost (SEK)").add_attribute(Attribute::Bold),
        ]);
        for month in &summary.monthly_peaks {
            monthly.add_row(vec![
                month.month.clone(),
                format!("{:.2}", month.top_n_average_kw),
                format!("{:.2}", month.max_peak_kw),
                format!("{:.2}", month.effect_tariff_cost_sek),
            ]);
        }

        format!("{table}\n\n{monthly}")
    }

    #[must_use]
    pub fn format_comparison(diff: &ComparisonDiff) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec!["Baseline cost (SEK)", &format!("{:.2}", diff.baseline_cost_sek)]);
        table.add_row(vec!["Candidate cost (SEK)", &format!("{:.2}", diff.candidate_cost_sek)]);
        table.add_row(vec!["Savings (SEK)", &format!("{:.2}", diff.savings_sek)]);
        table.add_row(vec!["Savings (%)", &format!("{:.1}", diff.savings_percent)]);
        table.add_row(vec!["Peak-shaving savings (SEK)", &format!("{:.2}", diff.peak_shaving_savings_sek)]);
        table.to_string()
    }
}
