use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consumption::{ConsumptionStats, DayType, RiskLevel};

/// How much SoC must be held aside right now for anticipated peaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequirement {
    pub timestamp: DateTime<Utc>,
    pub hour: u32,
    pub day_type: DayType,

    pub expected_peak_kw: f64,
    pub grid_import_limit_kw: f64,
    pub raw_reserve_kwh: f64,
    pub safety_buffer: f64,
    pub required_reserve_kwh: f64,

    pub percentile_used: u32,
    pub confidence: f64,
    pub risk_level: RiskLevel,

    pub reasoning: String,
    pub consumption_stats: Option<ConsumptionStats>,
}

/// How current SoC is split between competing uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityAllocation {
    pub total_capacity_kwh: f64,
    pub current_soc_kwh: f64,

    pub peak_shaving_reserve_kwh: f64,
    pub available_for_arbitrage_kwh: f64,
    pub minimum_soc_kwh: f64,

    pub can_charge: bool,
    pub can_discharge: bool,
    pub max_charge_this_hour_kwh: f64,
    pub max_discharge_this_hour_kwh: f64,

    pub opportunity_cost_sek: f64,
}

impl CapacityAllocation {
    /// Available capacity for a given purpose, mirroring the reference
    /// system's `get_available_for_agent` lookup.
    #[must_use]
    pub fn available_for(&self, purpose: &str) -> f64 {
        match purpose {
            "peak_shaving" => self.peak_shaving_reserve_kwh,
            "arbitrage" | "self_consumption" => self.available_for_arbitrage_kwh,
            _ => 0.0,
        }
    }
}
