//! Converts consumption statistics into a kWh reserve requirement and a
//! capacity allocation between peak-shaving and arbitrage.

use chrono::{DateTime, Utc};
use boreal_types::{BatteryContext, CapacityAllocation, DayType, ReserveRequirement, RiskLevel};

use crate::consumption_analyser::ConsumptionAnalyser;

#[derive(Debug, Clone, Copy)]
pub struct ReserveCalculator {
    pub grid_import_limit_kw: f64,
    pub max_discharge_kw: f64,
    pub default_percentile: u32,
    pub safety_buffer: f64,
    pub spike_duration_hours: f64,
    pub min_reserve_kwh: f64,
    pub max_reserve_kwh: f64,
}

impl Default for ReserveCalculator {
    fn default() -> Self {
        Self {
            grid_import_limit_kw: 5.0,
            max_discharge_kw: 12.0,
            default_percentile: 95,
            safety_buffer: 1.15,
            spike_duration_hours: 0.5,
            min_reserve_kwh: 2.0,
            max_reserve_kwh: 15.0,
        }
    }
}

fn percentile_weight(percentile: u32) -> f64 {
    match percentile {
        90 => 0.8,
        95 => 0.9,
        99 => 1.0,
        _ => 0.85,
    }
}

impl ReserveCalculator {
    fn fallback_reserve(
        &self,
        timestamp: DateTime<Utc>,
        hour: u32,
        day_type: DayType,
    ) -> ReserveRequirement {
        let expected_peak_kw = 8.0;
        let reduction_kw = (expected_peak_kw - self.grid_import_limit_kw)
            .max(0.0)
            .min(self.max_discharge_kw);
        let raw_reserve_kwh = reduction_kw * self.spike_duration_hours;
        let required_reserve_kwh =
            (raw_reserve_kwh * self.safety_buffer).clamp(self.min_reserve_kwh, self.max_reserve_kwh);

        ReserveRequirement {
            timestamp,
            hour,
            day_type,
            expected_peak_kw,
            grid_import_limit_kw: self.grid_import_limit_kw,
            raw_reserve_kwh,
            safety_buffer: self.safety_buffer,
            required_reserve_kwh,
            percentile_used: 95,
            confidence: 0.5,
            risk_level: RiskLevel::High,
            reasoning: "no consumption statistics for this slot, using conservative fallback"
                .to_string(),
            consumption_stats: None,
        }
    }

    /// Selects stats, picks a percentile (explicit override or the
    /// analyser's recommendation), and derives the reserve requirement.
    #[must_use]
    pub fn calculate_reserve(
        &self,
        analyser: &ConsumptionAnalyser,
        timestamp: DateTime<Utc>,
        hour: u32,
        day_type: DayType,
        percentile_override: Option<u32>,
    ) -> ReserveRequirement {
        let Some(stats) = analyser.get_stats(hour, day_type) else {
            return self.fallback_reserve(timestamp, hour, day_type);
        };

        let percentile =
            percentile_override.unwrap_or_else(|| analyser.recommended_percentile(hour, day_type));
        let expected_peak_kw = stats.percentile(percentile);

        let reduction_kw = (expected_peak_kw - self.grid_import_limit_kw)
            .max(0.0)
            .min(self.max_discharge_kw);
        let raw_reserve_kwh = reduction_kw * self.spike_duration_hours;
        let required_reserve_kwh =
            (raw_reserve_kwh * self.safety_buffer).clamp(self.min_reserve_kwh, self.max_reserve_kwh);

        let sample_factor = (stats.sample_count as f64 / 30.0).min(1.0);
        let cv = stats.coefficient_of_variation();
        let variability_factor = (1.0 - (cv - 0.5) / 2.0).max(0.5);
        let confidence =
            (sample_factor * variability_factor * percentile_weight(percentile)).clamp(0.0, 1.0);

        let risk_level = analyser.risk_level(hour, day_type);

        let reasoning = format!(
            "P{percentile} expected peak {expected_peak_kw:.1} kW, reduction {reduction_kw:.1} kW \
             over {:.1}h -> raw {raw_reserve_kwh:.2} kWh, buffered to {required_reserve_kwh:.2} kWh \
             ({sample_count} samples, risk {risk_level:?})",
            self.spike_duration_hours,
            sample_count = stats.sample_count,
        );

        ReserveRequirement {
            timestamp,
            hour,
            day_type,
            expected_peak_kw,
            grid_import_limit_kw: self.grid_import_limit_kw,
            raw_reserve_kwh,
            safety_buffer: self.safety_buffer,
            required_reserve_kwh,
            percentile_used: percentile,
            confidence,
            risk_level,
            reasoning,
            consumption_stats: Some(stats.clone()),
        }
    }

    /// Splits current SoC into technical floor, peak-shaving reserve, and
    /// arbitrage pool; derives per-hour charge/discharge caps; estimates
    /// opportunity cost when the arbitrage pool is thin.
    #[must_use]
    pub fn allocate_capacity(
        &self,
        context: &BatteryContext,
        reserve: &ReserveRequirement,
        estimated_arbitrage_value_sek: f64,
    ) -> CapacityAllocation {
        let peak_shaving_reserve_kwh = reserve
            .required_reserve_kwh
            .min((context.soc_kwh - context.floor_soc_kwh).max(0.0));

        let available_for_arbitrage_kwh =
            (context.soc_kwh - context.floor_soc_kwh - peak_shaving_reserve_kwh).max(0.0);

        let can_charge = context.soc_kwh < context.capacity_kwh;
        let can_discharge = context.soc_kwh > context.floor_soc_kwh;

        let max_charge_this_hour_kwh = context
            .max_charge_kw
            .min(context.capacity_kwh - context.soc_kwh)
            .max(0.0);
        let max_discharge_this_hour_kwh = context
            .max_discharge_kw
            .min((context.soc_kwh - context.floor_soc_kwh).max(0.0));

        let opportunity_cost_sek =
            if available_for_arbitrage_kwh < context.capacity_kwh * 0.5 {
                estimated_arbitrage_value_sek * 0.5
            } else {
                0.0
            };

        CapacityAllocation {
            total_capacity_kwh: context.capacity_kwh,
            current_soc_kwh: context.soc_kwh,
            peak_shaving_reserve_kwh,
            available_for_arbitrage_kwh,
            minimum_soc_kwh: context.floor_soc_kwh,
            can_charge,
            can_discharge,
            max_charge_this_hour_kwh,
            max_discharge_this_hour_kwh,
            opportunity_cost_sek,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).unwrap()
    }

    #[test]
    fn fallback_used_when_no_stats() {
        let analyser = ConsumptionAnalyser::new(&[]);
        let calc = ReserveCalculator::default();
        let reserve = calc.calculate_reserve(&analyser, ts(), 18, DayType::Weekday, None);
        assert_eq!(reserve.expected_peak_kw, 8.0);
        assert_eq!(reserve.confidence, 0.5);
        assert_eq!(reserve.risk_level, RiskLevel::High);
    }

    #[test]
    fn required_reserve_is_clamped() {
        let calc = ReserveCalculator::default();
        let samples: Vec<_> = (0..10)
            .map(|i| {
                (
                    Utc.with_ymd_and_hms(2026, 1, 5 + i, 18, 0, 0).unwrap(),
                    20.0,
                )
            })
            .collect();
        let analyser = ConsumptionAnalyser::new(&samples);
        let reserve = calc.calculate_reserve(&analyser, ts(), 18, DayType::Weekday, Some(95));
        assert!(reserve.required_reserve_kwh <= calc.max_reserve_kwh);
        assert!(reserve.required_reserve_kwh >= calc.min_reserve_kwh);
    }
}
