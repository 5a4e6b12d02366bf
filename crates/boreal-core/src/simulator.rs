//! Hourly simulator loop: advances SoC, feeds the peak tracker, accrues
//! cost, and drives the coordinator one tick at a time.

use boreal_types::{
    ActionKind, BatteryContext, DailyPlan, EffectTariffMethod, EngineConfig, MonthlyPeakStats,
    PolicyCounters, Recommendation, RunSummary, TariffParams, TraceRow,
};
use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, trace};

use crate::consumption_analyser::ConsumptionAnalyser;
use crate::coordinator::Boss;
use crate::optimizer::{DailyOptimiser, OptimiserInputs};
use crate::peak_tracker::PeakTracker;
use crate::reserve_calculator::ReserveCalculator;
use crate::value_calculator::ValueCalculator;

fn month_key(timestamp: DateTime<Utc>) -> String {
    PeakTracker::month_key(timestamp)
}

/// A no-peek forecast: for each of the next 24 hours, the mean of past
/// rows (index < `tick`) sharing that hour-of-day. Falls back to the
/// current reading when no history exists yet for a given hour.
fn consumption_forecast(trace: &[TraceRow], tick: usize, this_hour: u32) -> Vec<f64> {
    let mut forecast = vec![0.0; 24];
    for (k, slot) in forecast.iter_mut().enumerate() {
        let target_hour = (this_hour + k as u32) % 24;
        let mut sum = 0.0;
        let mut count = 0usize;
        for row in &trace[..tick] {
            if row.timestamp.hour() == target_hour {
                sum += row.consumption_kwh;
                count += 1;
            }
        }
        *slot = if count > 0 {
            sum / count as f64
        } else {
            trace[tick].consumption_kwh
        };
    }
    forecast
}

fn spot_forecast(trace: &[TraceRow], tick: usize) -> Vec<f64> {
    let mut forecast = vec![trace[tick].spot_price; 24];
    for (k, slot) in forecast.iter_mut().enumerate() {
        if let Some(row) = trace.get(tick + k) {
            *slot = row.spot_price;
        }
    }
    forecast
}

/// Per-month effect-tariff cost under the configured billing method.
fn effect_tariff_cost(tracker: &PeakTracker, month: &str, method: EffectTariffMethod, effect_tariff: f64) -> (f64, MonthlyPeakStats) {
    let stats = tracker.statistics(month);
    let billed_kw = match method {
        EffectTariffMethod::SinglePeak => stats.max_peak_kw,
        EffectTariffMethod::TopNAverage => stats.top_n_average_kw,
    };
    let cost = billed_kw * effect_tariff;
    let record = MonthlyPeakStats {
        month: month.to_string(),
        total_measurements: stats.total_measurements,
        top_n_peaks: stats.top_n_peaks,
        top_n_average_kw: stats.top_n_average_kw,
        threshold_kw: stats.threshold_kw,
        max_peak_kw: stats.max_peak_kw,
        min_peak_kw: stats.min_peak_kw,
        avg_all_kw: stats.avg_all_kw,
        effect_tariff_cost_sek: cost,
    };
    (cost, record)
}

pub struct Simulator {
    config: EngineConfig,
}

impl Simulator {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn run(&self, trace: &[TraceRow]) -> RunSummary {
        let tariff = self.config.tariff_params();
        let value_calc = ValueCalculator::new(tariff);
        let reserve_calculator = ReserveCalculator {
            grid_import_limit_kw: self.config.grid_import_limit_kw,
            max_discharge_kw: self.config.battery_max_discharge_kw,
            default_percentile: self.config.default_percentile,
            safety_buffer: self.config.safety_buffer,
            spike_duration_hours: self.config.spike_duration_hours,
            min_reserve_kwh: self.config.min_reserve_kwh,
            max_reserve_kwh: self.config.max_reserve_kwh,
        };
        let boss = Boss::new(
            &value_calc,
            reserve_calculator,
            self.config.measurement_start_hour,
            self.config.measurement_end_hour,
        );

        let peak_tracker = PeakTracker::new(
            self.config.measurement_start_hour,
            self.config.measurement_end_hour,
            self.config.top_n,
        );
        let baseline_peak_tracker = PeakTracker::new(
            self.config.measurement_start_hour,
            self.config.measurement_end_hour,
            self.config.top_n,
        );

        let samples: Vec<(DateTime<Utc>, f64)> =
            trace.iter().map(|row| (row.timestamp, row.consumption_kwh)).collect();
        let analyser = ConsumptionAnalyser::new(&samples);
        let optimiser = DailyOptimiser::new();

        let mut soc_kwh = self.config.battery_capacity_kwh * 0.5;
        let mut counters = PolicyCounters::default();
        let mut decisions = Vec::new();
        let mut soc_series_kwh = Vec::with_capacity(trace.len());
        let mut grid_import_series_kw = Vec::with_capacity(trace.len());
        let mut grid_export_series_kw = Vec::with_capacity(trace.len());

        let mut total_baseline_cost_sek = 0.0;
        let mut total_cost_with_battery_sek = 0.0;
        let mut total_actual_effect_cost_sek = 0.0;
        let mut total_baseline_effect_cost_sek = 0.0;
        let mut monthly_peaks = Vec::new();
        let mut current_month: Option<String> = None;
        let mut cached_plan: Option<DailyPlan> = None;

        for tick in 0..trace.len() {
            let row = &trace[tick];
            let hour = row.timestamp.hour();
            let month = month_key(row.timestamp);
            let is_measurement_hour = peak_tracker.is_measurement_hour(row.timestamp);

            if current_month.as_deref() != Some(month.as_str()) {
                if let Some(closed) = current_month.take() {
                    let (actual_cost, record) =
                        effect_tariff_cost(&peak_tracker, &closed, self.config.effect_tariff_method, tariff.effect_tariff);
                    let (baseline_cost, _) = effect_tariff_cost(
                        &baseline_peak_tracker,
                        &closed,
                        self.config.effect_tariff_method,
                        tariff.effect_tariff,
                    );
                    total_cost_with_battery_sek += actual_cost;
                    total_baseline_cost_sek += baseline_cost;
                    total_actual_effect_cost_sek += actual_cost;
                    total_baseline_effect_cost_sek += baseline_cost;
                    trace!(month = %closed, samples = ?peak_tracker.all_peaks(&closed), "month closed");
                    monthly_peaks.push(record);
                }
                current_month = Some(month.clone());
            }

            let stats = analyser.stats_for_timestamp(row.timestamp);
            let avg_consumption_kw = stats.map(|s| s.mean_kw).unwrap_or(row.consumption_kwh);
            let peak_consumption_kw = stats.map(|s| s.max_kw).unwrap_or(row.consumption_kwh);

            let context = BatteryContext {
                timestamp: row.timestamp,
                hour_of_day: hour,
                soc_kwh,
                capacity_kwh: self.config.battery_capacity_kwh,
                max_charge_kw: self.config.battery_max_charge_kw,
                max_discharge_kw: self.config.battery_max_discharge_kw,
                efficiency: self.config.battery_efficiency,
                consumption_kw: row.consumption_kwh,
                solar_kw: row.solar_kwh,
                grid_import_kw: (row.consumption_kwh - row.solar_kwh).max(0.0),
                spot_price: row.spot_price,
                spot_forecast: spot_forecast(trace, tick),
                consumption_forecast: consumption_forecast(trace, tick, hour),
                month_key: month.clone(),
                top_n_peaks: peak_tracker.top_n_peaks(&month),
                peak_threshold_kw: peak_tracker.threshold(&month),
                is_measurement_hour,
                avg_consumption_kw,
                peak_consumption_kw,
                floor_soc_kwh: self.config.battery_min_soc_kwh,
                target_morning_soc_kwh: self.config.battery_min_soc_kwh
                    + (self.config.battery_capacity_kwh - self.config.battery_min_soc_kwh) * 0.8,
            };

            let date = row.timestamp.format("%Y-%m-%d").to_string();
            if self.config.enable_daily_plan
                && hour == self.config.planning_hour
                && cached_plan.as_ref().map(|p| p.date != date).unwrap_or(true)
                && tick + 24 <= trace.len()
            {
                cached_plan = Some(self.plan_next_day(&optimiser, trace, tick, &context, tariff));
            }

            let decision = match &cached_plan {
                Some(plan) if self.config.enable_daily_plan && plan.date == date => {
                    boss.analyze_with_plan(&context, plan, &mut counters)
                }
                _ => boss.analyze_hourly(&context, &analyser, &mut counters),
            };

            let (new_soc, grid_import_kw, grid_export_kw, self_consumption_kwh) =
                self.apply_decision(&context, &decision.recommendation);

            peak_tracker.update(row.timestamp, grid_import_kw);
            baseline_peak_tracker.update(row.timestamp, (row.consumption_kwh - row.solar_kwh).max(0.0));

            let hourly_cost = value_calc.import_cost(row.spot_price, grid_import_kw, true);
            let hourly_revenue = value_calc.export_revenue(row.spot_price, grid_export_kw);
            total_cost_with_battery_sek += hourly_cost - hourly_revenue;
            total_baseline_cost_sek +=
                value_calc.import_cost(row.spot_price, (row.consumption_kwh - row.solar_kwh).max(0.0), true);

            soc_kwh = new_soc;
            soc_series_kwh.push(soc_kwh);
            grid_import_series_kw.push(grid_import_kw);
            grid_export_series_kw.push(grid_export_kw);

            let mut recorded = decision;
            recorded.soc_after_kwh = soc_kwh;
            recorded.grid_import_kwh = grid_import_kw;
            recorded.grid_export_kwh = grid_export_kw;
            recorded.self_consumption_kwh = self_consumption_kwh;
            debug!(tick, hour, kind = ?recorded.recommendation.kind, "tick decided");
            decisions.push(recorded);
        }

        if let Some(closed) = current_month.take() {
            let (actual_cost, record) =
                effect_tariff_cost(&peak_tracker, &closed, self.config.effect_tariff_method, tariff.effect_tariff);
            let (baseline_cost, _) =
                effect_tariff_cost(&baseline_peak_tracker, &closed, self.config.effect_tariff_method, tariff.effect_tariff);
            total_cost_with_battery_sek += actual_cost;
            total_baseline_cost_sek += baseline_cost;
            total_actual_effect_cost_sek += actual_cost;
            total_baseline_effect_cost_sek += baseline_cost;
            trace!(month = %closed, samples = ?peak_tracker.all_peaks(&closed), "month closed");
            monthly_peaks.push(record);
        }

        let net_savings_sek = total_baseline_cost_sek - total_cost_with_battery_sek;
        let peak_shaving_savings_sek = total_baseline_effect_cost_sek - total_actual_effect_cost_sek;

        RunSummary {
            total_baseline_cost_sek,
            total_cost_with_battery_sek,
            net_savings_sek,
            peak_shaving_savings_sek,
            soc_series_kwh,
            grid_import_series_kw,
            grid_export_series_kw,
            monthly_peaks,
            counters,
            decisions,
        }
    }

    fn plan_next_day(
        &self,
        optimiser: &DailyOptimiser,
        trace: &[TraceRow],
        tick: usize,
        context: &BatteryContext,
        tariff: TariffParams,
    ) -> DailyPlan {
        let mut consumption_forecast_kw = [0.0; 24];
        let mut solar_forecast_kw = [0.0; 24];
        let mut spot_forecast_arr = [0.0; 24];
        let mut is_measurement_hour = [false; 24];

        for h in 0..24 {
            let row = &trace[tick + h];
            consumption_forecast_kw[h] = row.consumption_kwh;
            solar_forecast_kw[h] = row.solar_kwh;
            spot_forecast_arr[h] = row.spot_price;
            is_measurement_hour[h] = h as u32 >= self.config.measurement_start_hour
                && h as u32 <= self.config.measurement_end_hour;
        }

        let inputs = OptimiserInputs {
            date: context.timestamp.format("%Y-%m-%d").to_string(),
            consumption_forecast_kw,
            solar_forecast_kw,
            spot_forecast: spot_forecast_arr,
            is_measurement_hour,
            initial_soc_kwh: context.soc_kwh,
            capacity_kwh: self.config.battery_capacity_kwh,
            min_soc_kwh: self.config.battery_min_soc_kwh,
            max_charge_kw: self.config.battery_max_charge_kw,
            max_discharge_kw: self.config.battery_max_discharge_kw,
            efficiency: self.config.battery_efficiency,
            tariff,
            peak_reserve_kwh: self.config.min_reserve_kwh,
            peak_penalty_multiplier: self.config.peak_penalty_multiplier,
            grid_import_limit_kw: self.config.grid_import_limit_kw,
        };

        optimiser.optimize(&inputs)
    }

    /// Translates a Recommendation into physical deltas, respecting
    /// invariants 1-5: SoC bounds, exclusive charge/discharge, power-rate
    /// caps, the efficiency-on-charge SoC update, and grid export only
    /// when consumption is already fully served.
    fn apply_decision(&self, context: &BatteryContext, recommendation: &Recommendation) -> (f64, f64, f64, f64) {
        let (charge_requested, discharge_requested, export_requested) = match recommendation.kind {
            ActionKind::Charge => (recommendation.magnitude_kwh, 0.0, 0.0),
            ActionKind::Discharge => (0.0, recommendation.magnitude_kwh, 0.0),
            ActionKind::Export => (0.0, 0.0, recommendation.magnitude_kwh),
            ActionKind::Hold => (0.0, 0.0, 0.0),
        };

        let charge = charge_requested
            .clamp(0.0, self.config.battery_max_charge_kw)
            .min(context.headroom_kwh());

        let discharge_budget = context.available_above_floor_kwh();
        let discharge = discharge_requested
            .clamp(0.0, self.config.battery_max_discharge_kw)
            .min(discharge_budget);
        let export_amount = export_requested
            .clamp(0.0, self.config.battery_max_discharge_kw)
            .min((discharge_budget - discharge).max(0.0));

        let consumption_net = context.consumption_kw - context.solar_kw;
        let grid_import_kw = (consumption_net - discharge + charge).max(0.0);
        let grid_export_kw = if consumption_net <= 0.0 { export_amount } else { 0.0 };
        let self_consumption_kwh = discharge.min(context.consumption_kw);

        let new_soc = (context.soc_kwh + charge * context.efficiency - discharge - export_amount)
            .clamp(context.floor_soc_kwh, context.capacity_kwh);

        (new_soc, grid_import_kw, grid_export_kw, self_consumption_kwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trace_row(day: u32, hour: u32, consumption: f64, spot: f64) -> TraceRow {
        TraceRow {
            timestamp: Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap(),
            consumption_kwh: consumption,
            spot_price: spot,
            solar_kwh: 0.0,
            realised_import_cost: None,
            realised_export_revenue: None,
        }
    }

    #[test]
    fn run_produces_one_decision_per_row_and_nonnegative_soc() {
        let mut config = EngineConfig::default();
        config.enable_daily_plan = false;

        let mut trace = Vec::new();
        for day in 1..=2 {
            for hour in 0..24 {
                let spot = if (0..6).contains(&hour) { 0.3 } else { 1.2 };
                trace.push(trace_row(day, hour, 3.0, spot));
            }
        }

        let summary = Simulator::new(config).run(&trace);
        assert_eq!(summary.decisions.len(), trace.len());
        assert!(summary.soc_series_kwh.iter().all(|soc| *soc >= 0.0));
        assert_eq!(summary.counters.decisions as usize, trace.len());
    }

    #[test]
    fn emergency_consumption_spike_triggers_override_vote() {
        let mut config = EngineConfig::default();
        config.enable_daily_plan = false;

        let mut trace = Vec::new();
        for hour in 0..24 {
            trace.push(trace_row(1, hour, 3.0, 1.0));
        }
        trace[18] = trace_row(1, 18, 13.0, 1.0);

        let summary = Simulator::new(config).run(&trace);
        assert!(summary.counters.vetoes_applied >= 1);
    }
}
