use serde::{Deserialize, Serialize};

use crate::tariff::TariffParams;

/// Which samples count toward the monthly effect-tariff charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTariffMethod {
    SinglePeak,
    TopNAverage,
}

impl Default for EffectTariffMethod {
    fn default() -> Self {
        EffectTariffMethod::TopNAverage
    }
}

/// Flat, TOML-deserialisable configuration for a single run.
///
/// Every field carries a default so a minimal file only needs to override
/// what differs from the reference household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_battery_capacity_kwh")]
    pub battery_capacity_kwh: f64,
    #[serde(default = "default_battery_max_charge_kw")]
    pub battery_max_charge_kw: f64,
    #[serde(default = "default_battery_max_discharge_kw")]
    pub battery_max_discharge_kw: f64,
    #[serde(default = "default_battery_efficiency")]
    pub battery_efficiency: f64,
    #[serde(default = "default_battery_min_soc_kwh")]
    pub battery_min_soc_kwh: f64,

    #[serde(default = "default_grid_fee")]
    pub grid_fee: f64,
    #[serde(default = "default_energy_tax")]
    pub energy_tax: f64,
    #[serde(default = "default_transfer_fee")]
    pub transfer_fee: f64,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: f64,
    #[serde(default = "default_effect_tariff")]
    pub effect_tariff_sek_kw_month: f64,

    #[serde(default = "default_measurement_start_hour")]
    pub measurement_start_hour: u32,
    #[serde(default = "default_measurement_end_hour")]
    pub measurement_end_hour: u32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub effect_tariff_method: EffectTariffMethod,

    #[serde(default = "default_grid_import_limit_kw")]
    pub grid_import_limit_kw: f64,

    #[serde(default = "default_percentile")]
    pub default_percentile: u32,
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer: f64,
    #[serde(default = "default_spike_duration_hours")]
    pub spike_duration_hours: f64,
    #[serde(default = "default_min_reserve_kwh")]
    pub min_reserve_kwh: f64,
    #[serde(default = "default_max_reserve_kwh")]
    pub max_reserve_kwh: f64,

    #[serde(default = "default_peak_penalty_multiplier")]
    pub peak_penalty_multiplier: f64,

    #[serde(default = "default_planning_hour")]
    pub planning_hour: u32,
    #[serde(default = "default_true")]
    pub enable_daily_plan: bool,

    #[serde(default)]
    pub date_range_start: Option<String>,
    #[serde(default)]
    pub date_range_end: Option<String>,
}

fn default_true() -> bool {
    true
}
fn default_battery_capacity_kwh() -> f64 {
    20.0
}
fn default_battery_max_charge_kw() -> f64 {
    5.0
}
fn default_battery_max_discharge_kw() -> f64 {
    5.0
}
fn default_battery_efficiency() -> f64 {
    0.95
}
fn default_battery_min_soc_kwh() -> f64 {
    2.0
}
fn default_grid_fee() -> f64 {
    0.42
}
fn default_energy_tax() -> f64 {
    0.40
}
fn default_transfer_fee() -> f64 {
    0.42
}
fn default_vat_rate() -> f64 {
    0.25
}
fn default_effect_tariff() -> f64 {
    60.0
}
fn default_measurement_start_hour() -> u32 {
    6
}
fn default_measurement_end_hour() -> u32 {
    23
}
fn default_top_n() -> usize {
    3
}
fn default_grid_import_limit_kw() -> f64 {
    5.0
}
fn default_percentile() -> u32 {
    95
}
fn default_safety_buffer() -> f64 {
    1.15
}
fn default_spike_duration_hours() -> f64 {
    0.5
}
fn default_min_reserve_kwh() -> f64 {
    2.0
}
fn default_max_reserve_kwh() -> f64 {
    15.0
}
fn default_peak_penalty_multiplier() -> f64 {
    100.0
}
fn default_planning_hour() -> u32 {
    13
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            battery_capacity_kwh: default_battery_capacity_kwh(),
            battery_max_charge_kw: default_battery_max_charge_kw(),
            battery_max_discharge_kw: default_battery_max_discharge_kw(),
            battery_efficiency: default_battery_efficiency(),
            battery_min_soc_kwh: default_battery_min_soc_kwh(),
            grid_fee: default_grid_fee(),
            energy_tax: default_energy_tax(),
            transfer_fee: default_transfer_fee(),
            vat_rate: default_vat_rate(),
            effect_tariff_sek_kw_month: default_effect_tariff(),
            measurement_start_hour: default_measurement_start_hour(),
            measurement_end_hour: default_measurement_end_hour(),
            top_n: default_top_n(),
            effect_tariff_method: EffectTariffMethod::default(),
            grid_import_limit_kw: default_grid_import_limit_kw(),
            default_percentile: default_percentile(),
            safety_buffer: default_safety_buffer(),
            spike_duration_hours: default_spike_duration_hours(),
            min_reserve_kwh: default_min_reserve_kwh(),
            max_reserve_kwh: default_max_reserve_kwh(),
            peak_penalty_multiplier: default_peak_penalty_multiplier(),
            planning_hour: default_planning_hour(),
            enable_daily_plan: true,
            date_range_start: None,
            date_range_end: None,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file on disk.
    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::error::EngineError::InvalidConfig(e.to_string()))?;
        toml::from_str(&text).map_err(|e| crate::error::EngineError::InvalidConfig(e.to_string()))
    }

    pub fn tariff_params(&self) -> TariffParams {
        TariffParams {
            grid_fee: self.grid_fee,
            energy_tax: self.energy_tax,
            transfer_fee: self.transfer_fee,
            vat_rate: self.vat_rate,
            effect_tariff: self.effect_tariff_sek_kw_month,
            efficiency: self.battery_efficiency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_top_n_average() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.effect_tariff_method, EffectTariffMethod::TopNAverage);
        assert_eq!(cfg.top_n, 3);
    }

    #[test]
    fn default_tariff_params_round_trip() {
        let cfg = EngineConfig::default();
        let tariff = cfg.tariff_params();
        assert_eq!(tariff.grid_fee, 0.42);
        assert_eq!(tariff.efficiency, 0.95);
    }
}
