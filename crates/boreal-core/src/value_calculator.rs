//! Tariff arithmetic: converts physical quantities into monetary outcomes.

use boreal_types::TariffParams;

#[derive(Debug, Clone, Copy)]
pub struct ValueCalculator {
    pub tariff: TariffParams,
}

/// Breakdown of a single discharge into the value it earns under each
/// of the three ways a kWh can be worth something. A discharge that both
/// shaves a peak and covers consumption earns both simultaneously.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedValue {
    pub peak_shaving_sek: f64,
    pub self_consumption_sek: f64,
    pub arbitrage_sek: f64,
}

impl CombinedValue {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.peak_shaving_sek + self.self_consumption_sek + self.arbitrage_sek
    }
}

impl ValueCalculator {
    #[must_use]
    pub fn new(tariff: TariffParams) -> Self {
        Self { tariff }
    }

    /// `(spot + grid_fee + energy_tax) * kwh * (1 + vat if with_vat)`.
    #[must_use]
    pub fn import_cost(&self, spot: f64, kwh: f64, with_vat: bool) -> f64 {
        let unit = spot + self.tariff.grid_fee + self.tariff.energy_tax;
        let vat_factor = if with_vat { 1.0 + self.tariff.vat_rate } else { 1.0 };
        unit * kwh * vat_factor
    }

    /// `max(0, spot - transfer_fee) * kwh`. VAT on exports is the caller's
    /// choice; by default it is not applied.
    #[must_use]
    pub fn export_revenue(&self, spot: f64, kwh: f64) -> f64 {
        (spot - self.tariff.transfer_fee).max(0.0) * kwh
    }

    /// Daily slice of the monthly effect-tariff savings from shaving
    /// `kw_reduction` off a sample that counts toward the top-N.
    #[must_use]
    pub fn peak_shaving_value(&self, kw_reduction: f64, counts_in_top_n: bool, days_in_month: f64) -> f64 {
        if !counts_in_top_n || days_in_month <= 0.0 {
            return 0.0;
        }
        kw_reduction * self.tariff.effect_tariff / days_in_month
    }

    /// `import_cost(spot, kwh) - battery_charge_cost * kwh / efficiency`.
    /// May be negative.
    #[must_use]
    pub fn self_consumption_value(
        &self,
        spot: f64,
        kwh: f64,
        battery_charge_cost: f64,
        with_vat: bool,
    ) -> f64 {
        self.import_cost(spot, kwh, with_vat) - battery_charge_cost * kwh / self.tariff.efficiency
    }

    /// Efficiency is applied on the discharge side only, to avoid
    /// double-counting with the SoC update rule.
    #[must_use]
    pub fn arbitrage_value(&self, discharge_spot: f64, charge_spot: f64, kwh: f64) -> f64 {
        self.export_revenue(discharge_spot, kwh * self.tariff.efficiency)
            - self.import_cost(charge_spot, kwh, true)
    }

    /// Breaks a discharge into its peak-shaving, self-consumption, and
    /// arbitrage components. Used by the Decision's attribution fields,
    /// not by the core arithmetic rules above.
    #[must_use]
    pub fn combined_value(
        &self,
        spot: f64,
        kwh_for_peak_shaving: f64,
        kwh_for_self_consumption: f64,
        kwh_for_arbitrage: f64,
        charge_spot: f64,
        counts_in_top_n: bool,
        days_in_month: f64,
        battery_charge_cost: f64,
    ) -> CombinedValue {
        CombinedValue {
            peak_shaving_sek: self.peak_shaving_value(
                kwh_for_peak_shaving,
                counts_in_top_n,
                days_in_month,
            ),
            self_consumption_sek: self.self_consumption_value(
                spot,
                kwh_for_self_consumption,
                battery_charge_cost,
                false,
            ),
            arbitrage_sek: self.arbitrage_value(spot, charge_spot, kwh_for_arbitrage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> ValueCalculator {
        ValueCalculator::new(TariffParams {
            grid_fee: 0.42,
            energy_tax: 0.40,
            transfer_fee: 0.42,
            vat_rate: 0.25,
            effect_tariff: 60.0,
            efficiency: 0.95,
        })
    }

    #[test]
    fn import_cost_matches_fixture() {
        // From the trivial no-battery fixture: 2 kW * 24h * (1+0.4+0.3) * 1.25 = 102
        let calc = ValueCalculator::new(TariffParams {
            grid_fee: 0.40,
            energy_tax: 0.30,
            transfer_fee: 0.42,
            vat_rate: 0.25,
            effect_tariff: 60.0,
            efficiency: 1.0,
        });
        let cost = calc.import_cost(1.00, 2.0 * 24.0, true);
        assert!((cost - 102.0).abs() < 1e-9);
    }

    #[test]
    fn export_revenue_zero_below_transfer_fee() {
        let calc = calc();
        assert_eq!(calc.export_revenue(0.42, 5.0), 0.0);
        assert_eq!(calc.export_revenue(0.10, 5.0), 0.0);
    }

    #[test]
    fn peak_shaving_value_zero_when_not_counted() {
        let calc = calc();
        assert_eq!(calc.peak_shaving_value(2.0, false, 30.0), 0.0);
        assert!(calc.peak_shaving_value(2.0, true, 30.0) > 0.0);
    }

    #[test]
    fn arbitrage_value_applies_efficiency_on_discharge_side() {
        let calc = calc();
        let value = calc.arbitrage_value(2.0, 0.3, 5.0);
        let expected = calc.export_revenue(2.0, 5.0 * 0.95) - calc.import_cost(0.3, 5.0, true);
        assert!((value - expected).abs() < 1e-9);
    }
}
