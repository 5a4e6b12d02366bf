use chrono::{DateTime, Utc};

/// Snapshot of everything a specialist or the coordinator needs to decide
/// what the battery should do this hour.
#[derive(Debug, Clone)]
pub struct BatteryContext {
    pub timestamp: DateTime<Utc>,
    pub hour_of_day: u32,

    pub soc_kwh: f64,
    pub capacity_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub efficiency: f64,

    pub consumption_kw: f64,
    pub solar_kw: f64,
    pub grid_import_kw: f64,
    pub spot_price: f64,

    /// Next 24 hours of spot price, index 0 = this hour.
    pub spot_forecast: Vec<f64>,
    /// Next 24 hours of consumption, built from historical-only data (no peek).
    pub consumption_forecast: Vec<f64>,

    pub month_key: String,
    pub top_n_peaks: Vec<f64>,
    pub peak_threshold_kw: f64,
    pub is_measurement_hour: bool,

    pub avg_consumption_kw: f64,
    pub peak_consumption_kw: f64,

    pub floor_soc_kwh: f64,
    pub target_morning_soc_kwh: f64,
}

impl BatteryContext {
    /// SoC above the technical floor, the capacity actually available to act on.
    #[must_use]
    pub fn available_above_floor_kwh(&self) -> f64 {
        (self.soc_kwh - self.floor_soc_kwh).max(0.0)
    }

    /// Room left to charge before hitting capacity.
    #[must_use]
    pub fn headroom_kwh(&self) -> f64 {
        (self.capacity_kwh - self.soc_kwh).max(0.0)
    }
}
