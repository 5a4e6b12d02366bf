//! The coordinator ("Boss"): executes a cached day-ahead plan when one is
//! available, otherwise arbitrates between specialists hour by hour.

use boreal_types::{
    ActionKind, BatteryContext, DailyPlan, DayType, Decision, PolicyCounters, Recommendation,
};
use chrono::Datelike;

use crate::consumption_analyser::ConsumptionAnalyser;
use crate::reserve_calculator::ReserveCalculator;
use crate::specialists::{ArbitragePolicy, OverridePolicy, PeakShavingPolicy, Policy};
use crate::value_calculator::ValueCalculator;

fn day_type_of(context: &BatteryContext) -> DayType {
    match context.timestamp.weekday().num_days_from_monday() {
        5 | 6 => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

/// Consumption is considered an emergency deviation from plan when it
/// exceeds the forecast for this hour by this fraction and is itself
/// above a fixed absolute floor.
const EMERGENCY_DEVIATION_FRACTION: f64 = 0.30;
const EMERGENCY_ABSOLUTE_FLOOR_KW: f64 = 10.0;
const PLAN_ACTION_THRESHOLD_KWH: f64 = 0.5;
const TIE_BAND: f64 = 0.10;

#[derive(Debug, Clone, Copy)]
pub struct Boss<'a> {
    override_policy: OverridePolicy,
    peak_shaving: PeakShavingPolicy<'a>,
    arbitrage: ArbitragePolicy<'a>,
    reserve_calculator: ReserveCalculator,
    value_calc: &'a ValueCalculator,
}

impl<'a> Boss<'a> {
    #[must_use]
    pub fn new(
        value_calc: &'a ValueCalculator,
        reserve_calculator: ReserveCalculator,
        measurement_start_hour: u32,
        measurement_end_hour: u32,
    ) -> Self {
        let peak_shaving = PeakShavingPolicy::new(value_calc);
        let arbitrage = ArbitragePolicy {
            measurement_start_hour,
            measurement_end_hour,
            ..ArbitragePolicy::new(value_calc, peak_shaving)
        };
        Self {
            override_policy: OverridePolicy::default(),
            peak_shaving,
            arbitrage,
            reserve_calculator,
            value_calc,
        }
    }

    fn policies(&self) -> [Policy<'a>; 3] {
        [
            Policy::Override(self.override_policy),
            Policy::PeakShaving(self.peak_shaving),
            Policy::Arbitrage(self.arbitrage),
        ]
    }

    fn wrap(recommendation: Recommendation, context: &BatteryContext, contributing: Vec<&'static str>, rejected: Vec<(&'static str, String)>, had_conflict: bool, opportunity_cost_sek: f64) -> Decision {
        Decision {
            timestamp: context.timestamp,
            recommendation,
            contributing_policies: contributing,
            rejected,
            had_conflict,
            opportunity_cost_sek,
            // Physical outcome fields are filled in by the simulator once it
            // translates this recommendation into actual SoC/grid deltas.
            soc_after_kwh: 0.0,
            grid_import_kwh: 0.0,
            grid_export_kwh: 0.0,
            self_consumption_kwh: 0.0,
        }
    }

    /// Mode 1: plan execution, with an emergency-override escape hatch.
    #[must_use]
    pub fn analyze_with_plan(
        &self,
        context: &BatteryContext,
        plan: &DailyPlan,
        counters: &mut PolicyCounters,
    ) -> Decision {
        counters.decisions += 1;

        let forecast_for_hour = context.consumption_forecast.first().copied().unwrap_or(0.0);
        let deviates = forecast_for_hour > 0.0
            && context.consumption_kw > forecast_for_hour * (1.0 + EMERGENCY_DEVIATION_FRACTION)
            && context.consumption_kw > EMERGENCY_ABSOLUTE_FLOOR_KW;

        if deviates {
            counters.overrides_triggered += 1;
            let recommendation = self.peak_shaving.propose(context).unwrap_or_else(|| {
                Recommendation::hold("peak_shaving", "emergency deviation noted but no action required")
            });
            return Self::wrap(recommendation, context, vec!["peak_shaving"], Vec::new(), false, 0.0);
        }

        let hour = context.hour_of_day as usize;
        let planned_charge = plan.charge_schedule_kwh.get(hour).copied().unwrap_or(0.0);
        let planned_discharge = plan.discharge_schedule_kwh.get(hour).copied().unwrap_or(0.0);

        let recommendation = if planned_charge >= PLAN_ACTION_THRESHOLD_KWH {
            let magnitude = planned_charge.min(context.headroom_kwh()).min(context.max_charge_kw);
            Recommendation {
                kind: ActionKind::Charge,
                magnitude_kwh: magnitude,
                confidence: 1.0,
                value_sek: 0.0,
                priority: 3,
                rationale: format!("plan for {}:00 calls for {planned_charge:.2} kWh charge", context.hour_of_day),
                is_veto: false,
                requires_immediate_action: false,
                source: "plan",
                metadata: Default::default(),
            }
        } else if planned_discharge >= PLAN_ACTION_THRESHOLD_KWH {
            let magnitude = planned_discharge
                .min(context.available_above_floor_kwh())
                .min(context.max_discharge_kw);
            Recommendation {
                kind: ActionKind::Discharge,
                magnitude_kwh: magnitude,
                confidence: 1.0,
                value_sek: 0.0,
                priority: 3,
                rationale: format!("plan for {}:00 calls for {planned_discharge:.2} kWh discharge", context.hour_of_day),
                is_veto: false,
                requires_immediate_action: false,
                source: "plan",
                metadata: Default::default(),
            }
        } else {
            Recommendation::hold("plan", format!("plan for {}:00 has no material action", context.hour_of_day))
        };

        Self::wrap(recommendation, context, vec!["plan"], Vec::new(), false, 0.0)
    }

    /// Mode 2: hourly arbitration between the three specialists.
    #[must_use]
    pub fn analyze_hourly(
        &self,
        context: &BatteryContext,
        analyser: &ConsumptionAnalyser,
        counters: &mut PolicyCounters,
    ) -> Decision {
        counters.decisions += 1;

        let reserve = self.reserve_calculator.calculate_reserve(
            analyser,
            context.timestamp,
            context.hour_of_day,
            day_type_of(context),
            None,
        );

        let forecast_hi = context.spot_forecast.iter().copied().fold(f64::MIN, f64::max);
        let forecast_lo = context.spot_forecast.iter().copied().fold(f64::MAX, f64::min);
        let candidate_kwh = context.available_above_floor_kwh().min(context.max_discharge_kw);
        let estimated_arbitrage_value_sek = if forecast_hi.is_finite() && forecast_lo.is_finite() {
            self.value_calc.arbitrage_value(forecast_hi, forecast_lo, candidate_kwh).max(0.0)
        } else {
            0.0
        };

        let allocation = self.reserve_calculator.allocate_capacity(context, &reserve, estimated_arbitrage_value_sek);
        counters.cumulative_opportunity_cost_sek += allocation.opportunity_cost_sek;

        // Isolate-and-continue: a specialist that panics is logged and
        // skipped for this tick rather than taking the whole tick down.
        let mut candidates: Vec<(&'static str, Recommendation)> = Vec::new();
        for policy in self.policies() {
            let name = policy.name();
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| policy.propose(context))) {
                Ok(Some(rec)) => candidates.push((name, rec)),
                Ok(None) => {}
                Err(_) => tracing::error!(policy = name, "specialist panicked, skipping for this tick"),
            }
        }

        if candidates.is_empty() {
            let hold = Recommendation::hold("boss", "no specialist proposed an action");
            return Self::wrap(hold, context, Vec::new(), Vec::new(), false, allocation.opportunity_cost_sek);
        }

        // 1 is most urgent; ties broken by higher value.
        candidates.sort_by(|a, b| {
            a.1.priority
                .cmp(&b.1.priority)
                .then(b.1.value_sek.partial_cmp(&a.1.value_sek).unwrap_or(std::cmp::Ordering::Equal))
        });

        let had_conflict = candidates.len() > 1;
        if had_conflict {
            counters.conflicts_resolved += 1;
        }

        if let Some(veto_index) = candidates.iter().position(|(_, rec)| rec.is_veto) {
            let (source, recommendation) = candidates.remove(veto_index);
            counters.vetoes_applied += 1;
            let rejected = candidates
                .into_iter()
                .map(|(name, rec)| (name, rec.rationale))
                .collect();
            return Self::wrap(
                recommendation,
                context,
                vec![source],
                rejected,
                had_conflict,
                allocation.opportunity_cost_sek,
            );
        }

        // Within 10% of each other, peak-shaving's proposal wins the tie.
        if candidates.len() > 1 {
            let top_value = candidates[0].1.value_sek;
            if let Some(peak_shaving_index) = candidates.iter().position(|(name, rec)| {
                *name == "peak_shaving" && top_value > 0.0 && (top_value - rec.value_sek).abs() / top_value <= TIE_BAND
            }) {
                candidates.swap(0, peak_shaving_index);
            }
        }

        let (source, mut winner) = candidates.remove(0);
        let rejected = candidates.into_iter().map(|(name, rec)| (name, rec.rationale)).collect();

        // Never let a specialist discharge or export past the pool
        // allocate_capacity set aside for it.
        if matches!(winner.kind, ActionKind::Discharge | ActionKind::Export) {
            let cap = match source {
                "peak_shaving" => Some(allocation.available_for("peak_shaving")),
                "arbitrage" => Some(allocation.available_for("arbitrage")),
                _ => None,
            };
            if let Some(cap) = cap {
                winner.magnitude_kwh = winner.magnitude_kwh.min(cap.max(0.0));
            }
        }

        let adjusted_value = self.true_value_adjustment(context, &winner);
        if adjusted_value < 0.0 {
            counters.suppressed_by_true_value += 1;
            let held = Recommendation::hold(
                "boss",
                format!("{source} proposal suppressed after true-value adjustment ({adjusted_value:.2})"),
            );
            return Self::wrap(held, context, vec![source], rejected, had_conflict, allocation.opportunity_cost_sek);
        }

        let mut adjusted = winner;
        adjusted.value_sek = adjusted_value;

        // Attribution breakdown for reporting, not used by the arithmetic above.
        let breakdown = match (source, adjusted.kind) {
            ("peak_shaving", ActionKind::Discharge) => Some(self.value_calc.combined_value(
                context.spot_price,
                adjusted.magnitude_kwh,
                0.0,
                0.0,
                forecast_lo,
                true,
                self.peak_shaving.days_in_month,
                self.peak_shaving.battery_charge_cost_sek_per_kwh,
            )),
            ("arbitrage", ActionKind::Export) => Some(self.value_calc.combined_value(
                context.spot_price,
                0.0,
                0.0,
                adjusted.magnitude_kwh,
                forecast_lo,
                false,
                self.peak_shaving.days_in_month,
                self.arbitrage.battery_charge_cost_sek_per_kwh,
            )),
            _ => None,
        };
        if let Some(breakdown) = breakdown {
            adjusted
                .metadata
                .insert("peak_shaving_value_sek".to_string(), format!("{:.4}", breakdown.peak_shaving_sek));
            adjusted
                .metadata
                .insert("self_consumption_value_sek".to_string(), format!("{:.4}", breakdown.self_consumption_sek));
            adjusted
                .metadata
                .insert("arbitrage_value_sek".to_string(), format!("{:.4}", breakdown.arbitrage_sek));
        }

        Self::wrap(adjusted, context, vec![source], rejected, had_conflict, allocation.opportunity_cost_sek)
    }

    /// Always applied (never branch-dependent): simulates the post-action
    /// grid import and subtracts penalties for constraint violations.
    fn true_value_adjustment(&self, context: &BatteryContext, recommendation: &Recommendation) -> f64 {
        let mut value = recommendation.value_sek;

        let projected_import = match recommendation.kind {
            ActionKind::Charge => context.grid_import_kw + recommendation.magnitude_kwh,
            ActionKind::Discharge => (context.grid_import_kw - recommendation.magnitude_kwh).max(0.0),
            ActionKind::Export | ActionKind::Hold => context.grid_import_kw,
        };

        if context.is_measurement_hour && recommendation.kind == ActionKind::Charge {
            let peak_increase_kw = (projected_import - context.peak_threshold_kw).max(0.0);
            value -= peak_increase_kw * self.value_calc.tariff.effect_tariff / 30.0;
        }

        if recommendation.kind == ActionKind::Discharge {
            let soc_after = context.soc_kwh - recommendation.magnitude_kwh;
            if soc_after < context.floor_soc_kwh + 2.0 {
                value *= 0.7;
            }

            if recommendation.priority >= 3 {
                let lookahead: Vec<f64> = context.spot_forecast.iter().take(6).copied().collect();
                if !lookahead.is_empty() {
                    let avg_next_6h = lookahead.iter().sum::<f64>() / lookahead.len() as f64;
                    if avg_next_6h >= 1.3 * context.spot_price {
                        value *= 0.8;
                    }
                }
            }
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::TariffParams;
    use chrono::Utc;

    fn context(hour: u32, consumption: f64, grid_import: f64, is_measurement_hour: bool) -> BatteryContext {
        BatteryContext {
            timestamp: Utc::now(),
            hour_of_day: hour,
            soc_kwh: 10.0,
            capacity_kwh: 20.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            efficiency: 0.95,
            consumption_kw: consumption,
            solar_kw: 0.0,
            grid_import_kw: grid_import,
            spot_price: 1.0,
            spot_forecast: vec![1.0; 24],
            consumption_forecast: vec![3.0; 24],
            month_key: "2026-01".to_string(),
            top_n_peaks: vec![5.0, 4.0, 3.0],
            peak_threshold_kw: 10.0,
            is_measurement_hour,
            avg_consumption_kw: 3.0,
            peak_consumption_kw: 5.0,
            floor_soc_kwh: 2.0,
            target_morning_soc_kwh: 18.0,
        }
    }

    #[test]
    fn veto_short_circuits_arbitration() {
        let calc = ValueCalculator::new(TariffParams::default());
        let boss = Boss::new(&calc, ReserveCalculator::default(), 6, 23);
        let analyser = ConsumptionAnalyser::new(&[]);
        let mut counters = PolicyCounters::default();

        let mut context = context(18, 13.0, 13.0, true);
        context.peak_threshold_kw = 10.0;

        let decision = boss.analyze_hourly(&context, &analyser, &mut counters);
        assert!(decision.recommendation.is_veto);
        assert_eq!(counters.vetoes_applied, 1);
    }

    #[test]
    fn plan_mode_emergency_overrides_schedule() {
        let calc = ValueCalculator::new(TariffParams::default());
        let boss = Boss::new(&calc, ReserveCalculator::default(), 6, 23);
        let mut counters = PolicyCounters::default();

        let mut context = context(18, 15.0, 15.0, true);
        context.consumption_forecast = vec![3.0; 24];
        let plan = DailyPlan::failed("2026-01-05", "unused in this test");

        let decision = boss.analyze_with_plan(&context, &plan, &mut counters);
        assert_eq!(counters.overrides_triggered, 1);
        assert_eq!(decision.contributing_policies, vec!["peak_shaving"]);
    }

    #[test]
    fn plan_mode_holds_when_no_material_schedule_entry() {
        let calc = ValueCalculator::new(TariffParams::default());
        let boss = Boss::new(&calc, ReserveCalculator::default(), 6, 23);
        let mut counters = PolicyCounters::default();

        let context = context(10, 2.0, 2.0, false);
        let plan = DailyPlan::failed("2026-01-05", "unused in this test");

        let decision = boss.analyze_with_plan(&context, &plan, &mut counters);
        assert_eq!(decision.recommendation.kind, ActionKind::Hold);
    }
}
