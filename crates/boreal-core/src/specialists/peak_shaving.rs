//! Peak shaving: discharges during the measurement window to keep grid
//! import from setting (or worsening) a top-N monthly peak.

use boreal_types::{ActionKind, BatteryContext, Recommendation};

use crate::value_calculator::ValueCalculator;

#[derive(Debug, Clone, Copy)]
pub struct PeakShavingPolicy<'a> {
    pub target_peak_kw: f64,
    pub aggressive_multiplier: f64,
    pub top_n: usize,
    pub battery_charge_cost_sek_per_kwh: f64,
    pub days_in_month: f64,
    pub value_calc: &'a ValueCalculator,
}

impl<'a> PeakShavingPolicy<'a> {
    #[must_use]
    pub fn new(value_calc: &'a ValueCalculator) -> Self {
        Self {
            target_peak_kw: 5.0,
            aggressive_multiplier: 0.9,
            top_n: 3,
            battery_charge_cost_sek_per_kwh: 0.60,
            days_in_month: 30.0,
            value_calc,
        }
    }

    #[must_use]
    pub fn propose(&self, context: &BatteryContext) -> Option<Recommendation> {
        if !context.is_measurement_hour {
            return None;
        }

        let projected_import = context.grid_import_kw;
        let under_n_samples = context.top_n_peaks.len() < self.top_n;
        let exceeds_threshold = projected_import > context.peak_threshold_kw;

        if !exceeds_threshold && !under_n_samples {
            return None;
        }
        if !exceeds_threshold
            && under_n_samples
            && projected_import < context.peak_threshold_kw * self.aggressive_multiplier
        {
            return None;
        }

        let discharge_needed = (projected_import - self.target_peak_kw).max(0.0);
        let magnitude = discharge_needed
            .min(context.available_above_floor_kwh())
            .min(context.max_discharge_kw)
            .min(context.consumption_kw);
        if magnitude <= 0.0 {
            return None;
        }

        let peak_value = self
            .value_calc
            .peak_shaving_value(discharge_needed, true, self.days_in_month);
        let self_consumption_value = self.value_calc.self_consumption_value(
            context.spot_price,
            magnitude,
            self.battery_charge_cost_sek_per_kwh,
            false,
        );
        let value_sek = peak_value + self_consumption_value;

        let priority = if projected_import > context.peak_threshold_kw * 1.1 { 1 } else { 2 };

        Some(Recommendation {
            kind: ActionKind::Discharge,
            magnitude_kwh: magnitude,
            confidence: 0.85,
            value_sek,
            priority,
            rationale: format!(
                "projected import {projected_import:.1} kW vs threshold {:.1} kW, discharging {magnitude:.2} kWh to pull toward target {:.1} kW",
                context.peak_threshold_kw, self.target_peak_kw
            ),
            is_veto: false,
            requires_immediate_action: priority == 1,
            source: "peak_shaving",
            metadata: Default::default(),
        })
    }

    /// How much SoC this policy wants held back from arbitrage, so that
    /// arbitrage's export sizing can stay clear without direct coordination.
    #[must_use]
    pub fn should_reserve_capacity(&self, context: &BatteryContext, _hours_ahead: u32) -> f64 {
        if !context.is_measurement_hour {
            return 0.0;
        }
        let closeness = if context.peak_threshold_kw > 0.0 {
            (context.consumption_kw / context.peak_threshold_kw).clamp(0.0, 1.0)
        } else {
            0.5
        };
        (closeness * self.target_peak_kw).max(2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::TariffParams;
    use chrono::Utc;

    fn context(consumption: f64, threshold: f64, peaks_len: usize) -> BatteryContext {
        BatteryContext {
            timestamp: Utc::now(),
            hour_of_day: 18,
            soc_kwh: 10.0,
            capacity_kwh: 10.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            efficiency: 1.0,
            consumption_kw: consumption,
            solar_kw: 0.0,
            grid_import_kw: consumption,
            spot_price: 1.0,
            spot_forecast: vec![1.0; 24],
            consumption_forecast: vec![4.0; 24],
            month_key: "2026-01".to_string(),
            top_n_peaks: vec![0.0; peaks_len],
            peak_threshold_kw: threshold,
            is_measurement_hour: true,
            avg_consumption_kw: 4.0,
            peak_consumption_kw: consumption,
            floor_soc_kwh: 1.0,
            target_morning_soc_kwh: 9.0,
        }
    }

    #[test]
    fn discharges_when_projected_import_exceeds_threshold() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = PeakShavingPolicy::new(&calc);
        let context = context(12.0, 5.0, 3);
        let rec = policy.propose(&context).expect("expected discharge");
        assert_eq!(rec.kind, ActionKind::Discharge);
        assert_eq!(rec.priority, 1); // 12 > 5 * 1.1
    }

    #[test]
    fn no_action_below_aggressive_threshold_with_full_top_n() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = PeakShavingPolicy::new(&calc);
        let context = context(2.0, 5.0, 3);
        assert!(policy.propose(&context).is_none());
    }

    #[test]
    fn silent_outside_measurement_window() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = PeakShavingPolicy::new(&calc);
        let mut context = context(12.0, 5.0, 3);
        context.is_measurement_hour = false;
        assert!(policy.propose(&context).is_none());
    }
}
