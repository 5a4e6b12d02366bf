use serde::{Deserialize, Serialize};

/// Immutable tariff parameters for a single run.
///
/// All monetary quantities share one currency unit; the engine never
/// converts between currencies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TariffParams {
    pub grid_fee: f64,
    pub energy_tax: f64,
    pub transfer_fee: f64,
    pub vat_rate: f64,
    pub effect_tariff: f64,
    pub efficiency: f64,
}

impl Default for TariffParams {
    fn default() -> Self {
        Self {
            grid_fee: 0.42,
            energy_tax: 0.40,
            transfer_fee: 0.42,
            vat_rate: 0.25,
            effect_tariff: 60.0,
            efficiency: 0.95,
        }
    }
}
