use serde::{Deserialize, Serialize};

/// Weekday vs weekend, derived from a Monday-indexed day of week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Weekend,
}

/// Coarse time-of-day bucket, used only for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeOfDay::Night,
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Statistical summary of consumption for one (hour, day-type) slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionStats {
    pub hour: u32,
    pub day_type: DayType,
    pub time_of_day: TimeOfDay,
    pub sample_count: usize,

    pub mean_kw: f64,
    pub median_kw: f64,
    pub std_kw: f64,
    pub min_kw: f64,
    pub max_kw: f64,

    pub p50_kw: f64,
    pub p75_kw: f64,
    pub p90_kw: f64,
    pub p95_kw: f64,
    pub p99_kw: f64,
}

impl ConsumptionStats {
    /// Look up a specific percentile; unknown percentiles fall back to P95.
    #[must_use]
    pub fn percentile(&self, percentile: u32) -> f64 {
        match percentile {
            50 => self.p50_kw,
            75 => self.p75_kw,
            90 => self.p90_kw,
            95 => self.p95_kw,
            99 => self.p99_kw,
            _ => self.p95_kw,
        }
    }

    /// Coefficient of variation (std/mean), 0 if mean is non-positive.
    #[must_use]
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean_kw > 0.0 {
            self.std_kw / self.mean_kw
        } else {
            0.0
        }
    }
}
