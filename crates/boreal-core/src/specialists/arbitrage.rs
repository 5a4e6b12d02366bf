//! Price arbitrage: cheap-hour charging and high-price export. Self
//! consumption shifting lives inside peak shaving's value calculation and
//! is deliberately not a separate branch here: during measurement hours
//! the reserve is worth more per kWh than the self-consumption saving.

use boreal_types::{ActionKind, BatteryContext, Recommendation};

use super::peak_shaving::PeakShavingPolicy;
use crate::value_calculator::ValueCalculator;

#[derive(Debug, Clone, Copy)]
pub struct ArbitragePolicy<'a> {
    pub night_charge_threshold: f64,
    pub min_export_price: f64,
    pub peak_reserve_kwh: f64,
    pub scale_up_forecast_threshold_kw: f64,
    pub scale_up_bonus_kwh: f64,
    pub reserve_for_peaks_outside_window_kwh: f64,
    pub min_arbitrage_profit_sek: f64,
    pub battery_charge_cost_sek_per_kwh: f64,
    pub measurement_start_hour: u32,
    pub measurement_end_hour: u32,
    pub value_calc: &'a ValueCalculator,
    /// Consulted for the in-window peak reserve instead of a fixed constant,
    /// so export sizing stays clear of whatever peak-shaving wants held back.
    pub peak_shaving: PeakShavingPolicy<'a>,
}

impl<'a> ArbitragePolicy<'a> {
    #[must_use]
    pub fn new(value_calc: &'a ValueCalculator, peak_shaving: PeakShavingPolicy<'a>) -> Self {
        Self {
            night_charge_threshold: 0.70,
            min_export_price: 3.0,
            peak_reserve_kwh: 5.0,
            scale_up_forecast_threshold_kw: 7.0,
            scale_up_bonus_kwh: 2.0,
            reserve_for_peaks_outside_window_kwh: 2.0,
            min_arbitrage_profit_sek: 1.0,
            battery_charge_cost_sek_per_kwh: 0.60,
            measurement_start_hour: 6,
            measurement_end_hour: 23,
            value_calc,
            peak_shaving,
        }
    }

    #[must_use]
    pub fn propose(&self, context: &BatteryContext) -> Option<Recommendation> {
        if let Some(rec) = self.night_charge(context) {
            return Some(rec);
        }
        self.export_opportunity(context)
    }

    /// Forbidden during measurement hours even if the price is attractive.
    fn night_charge(&self, context: &BatteryContext) -> Option<Recommendation> {
        if context.is_measurement_hour {
            return None;
        }
        if !(0..=5).contains(&context.hour_of_day) {
            return None;
        }
        if context.spot_price >= self.night_charge_threshold {
            return None;
        }

        // Only a spike landing inside a future measurement hour should pull
        // the charge target up; a daytime spike outside the window doesn't
        // threaten the effect tariff.
        let elevated = context
            .consumption_forecast
            .iter()
            .take(18)
            .enumerate()
            .filter(|(offset, _)| {
                let future_hour = (context.hour_of_day + *offset as u32) % 24;
                future_hour >= self.measurement_start_hour && future_hour <= self.measurement_end_hour
            })
            .map(|(_, kw)| *kw)
            .fold(0.0_f64, f64::max)
            > self.scale_up_forecast_threshold_kw;

        let mut target_soc = context.capacity_kwh - self.peak_reserve_kwh;
        if elevated {
            target_soc += self.scale_up_bonus_kwh;
        }
        target_soc = target_soc.min(context.capacity_kwh);

        let room = target_soc - context.soc_kwh;
        if room < 1.0 {
            return None;
        }
        let magnitude = room.min(context.max_charge_kw).min(context.headroom_kwh());
        if magnitude < 0.5 {
            return None;
        }

        let cost = self.value_calc.import_cost(context.spot_price, magnitude, true);

        Some(Recommendation {
            kind: ActionKind::Charge,
            magnitude_kwh: magnitude,
            confidence: 0.7,
            value_sek: -cost,
            priority: 3,
            rationale: format!(
                "spot {:.2} below night threshold {:.2}, charging {magnitude:.2} kWh toward {target_soc:.1} kWh target",
                context.spot_price, self.night_charge_threshold
            ),
            is_veto: false,
            requires_immediate_action: false,
            source: "arbitrage",
            metadata: Default::default(),
        })
    }

    fn export_opportunity(&self, context: &BatteryContext) -> Option<Recommendation> {
        if context.spot_price < self.min_export_price {
            return None;
        }

        let reserve = if context.is_measurement_hour {
            self.peak_shaving.should_reserve_capacity(context, 0)
        } else {
            self.reserve_for_peaks_outside_window_kwh
        };
        let available = (context.soc_kwh - context.floor_soc_kwh - reserve).max(0.0);
        if available <= 0.0 {
            return None;
        }

        let magnitude = available.min(context.max_discharge_kw);
        let revenue = self.value_calc.export_revenue(context.spot_price, magnitude);
        let cost_basis = self.battery_charge_cost_sek_per_kwh * magnitude;
        if revenue < cost_basis {
            return None;
        }
        let profit = revenue - cost_basis;
        if profit < self.min_arbitrage_profit_sek {
            return None;
        }

        Some(Recommendation {
            kind: ActionKind::Export,
            magnitude_kwh: magnitude,
            confidence: 0.75,
            value_sek: profit,
            priority: 3,
            rationale: format!(
                "spot {:.2} clears export floor {:.2}, exporting {magnitude:.2} kWh for {profit:.2} profit",
                context.spot_price, self.min_export_price
            ),
            is_veto: false,
            requires_immediate_action: false,
            source: "arbitrage",
            metadata: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::TariffParams;
    use chrono::Utc;

    fn context(hour: u32, spot_price: f64, soc: f64, is_measurement_hour: bool) -> BatteryContext {
        BatteryContext {
            timestamp: Utc::now(),
            hour_of_day: hour,
            soc_kwh: soc,
            capacity_kwh: 20.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            efficiency: 0.95,
            consumption_kw: 2.0,
            solar_kw: 0.0,
            grid_import_kw: 2.0,
            spot_price,
            spot_forecast: vec![1.0; 24],
            consumption_forecast: vec![2.0; 24],
            month_key: "2026-01".to_string(),
            top_n_peaks: vec![5.0, 4.0, 3.0],
            peak_threshold_kw: 10.0,
            is_measurement_hour,
            avg_consumption_kw: 2.0,
            peak_consumption_kw: 5.0,
            floor_soc_kwh: 2.0,
            target_morning_soc_kwh: 18.0,
        }
    }

    #[test]
    fn charges_at_night_when_price_is_cheap() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = ArbitragePolicy::new(&calc, PeakShavingPolicy::new(&calc));
        let context = context(2, 0.3, 10.0, false);
        let rec = policy.propose(&context).expect("expected charge");
        assert_eq!(rec.kind, ActionKind::Charge);
    }

    #[test]
    fn never_charges_during_measurement_window() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = ArbitragePolicy::new(&calc, PeakShavingPolicy::new(&calc));
        let context = context(2, 0.1, 10.0, true);
        assert!(policy.night_charge(&context).is_none());
    }

    #[test]
    fn exports_when_price_clears_floor_and_profit_is_sufficient() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = ArbitragePolicy::new(&calc, PeakShavingPolicy::new(&calc));
        let context = context(14, 4.0, 18.0, false);
        let rec = policy.propose(&context).expect("expected export");
        assert_eq!(rec.kind, ActionKind::Export);
    }

    #[test]
    fn no_export_below_reserve_floor() {
        let calc = ValueCalculator::new(TariffParams::default());
        let policy = ArbitragePolicy::new(&calc, PeakShavingPolicy::new(&calc));
        let context = context(14, 4.0, 3.0, false);
        assert!(policy.export_opportunity(&context).is_none());
    }
}
