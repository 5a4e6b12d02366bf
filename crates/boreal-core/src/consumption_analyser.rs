//! Percentile statistics per (hour-of-day, day-type), built once from a
//! historical trace and read-only thereafter.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use boreal_types::{ConsumptionStats, DayType, RiskLevel, TimeOfDay};

#[derive(Debug, Clone)]
pub struct ConsumptionAnalyser {
    stats: HashMap<(u32, DayType), ConsumptionStats>,
}

fn day_type(timestamp: DateTime<Utc>) -> DayType {
    // chrono's weekday is Monday-indexed via num_days_from_monday.
    match timestamp.weekday().num_days_from_monday() {
        5 | 6 => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

/// Linear-interpolation percentile over an already-sorted slice.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

impl ConsumptionAnalyser {
    /// Builds the lookup table from (timestamp, kW) samples. Slots with
    /// fewer than three samples are omitted.
    #[must_use]
    pub fn new(samples: &[(DateTime<Utc>, f64)]) -> Self {
        let mut buckets: HashMap<(u32, DayType), Vec<f64>> = HashMap::new();
        for (timestamp, kw) in samples {
            let key = (timestamp.hour(), day_type(*timestamp));
            buckets.entry(key).or_default().push(*kw);
        }

        let mut stats = HashMap::new();
        for ((hour, day_type), mut values) in buckets {
            if values.len() < 3 {
                continue;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            // Sample variance (ddof=1), matching the originating system's
            // use of pandas' default .std().
            let variance = if n > 1.0 {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
            } else {
                0.0
            };
            let std = variance.sqrt();

            stats.insert(
                (hour, day_type),
                ConsumptionStats {
                    hour,
                    day_type,
                    time_of_day: TimeOfDay::from_hour(hour),
                    sample_count: values.len(),
                    mean_kw: mean,
                    median_kw: percentile_of_sorted(&values, 50.0),
                    std_kw: std,
                    min_kw: values[0],
                    max_kw: *values.last().unwrap(),
                    p50_kw: percentile_of_sorted(&values, 50.0),
                    p75_kw: percentile_of_sorted(&values, 75.0),
                    p90_kw: percentile_of_sorted(&values, 90.0),
                    p95_kw: percentile_of_sorted(&values, 95.0),
                    p99_kw: percentile_of_sorted(&values, 99.0),
                },
            );
        }

        Self { stats }
    }

    #[must_use]
    pub fn get_stats(&self, hour: u32, day_type: DayType) -> Option<&ConsumptionStats> {
        self.stats.get(&(hour, day_type))
    }

    #[must_use]
    pub fn stats_for_timestamp(&self, timestamp: DateTime<Utc>) -> Option<&ConsumptionStats> {
        self.get_stats(timestamp.hour(), day_type(timestamp))
    }

    /// Combines coefficient of variation, absolute level (P95), and
    /// evening hours (17..21, bumped up one class) into a risk tag.
    #[must_use]
    pub fn risk_level(&self, hour: u32, day_type: DayType) -> RiskLevel {
        let Some(stats) = self.get_stats(hour, day_type) else {
            return RiskLevel::Low;
        };

        let high_cv = stats.coefficient_of_variation() > 1.0;
        let high_p95 = stats.p95_kw > 5.0;
        let evening = (17..=21).contains(&hour);

        if (high_cv && high_p95) || (evening && high_p95) {
            RiskLevel::High
        } else if high_cv || high_p95 || evening {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// High risk -> P99, medium -> P95, low -> P90.
    #[must_use]
    pub fn recommended_percentile(&self, hour: u32, day_type: DayType) -> u32 {
        match self.risk_level(hour, day_type) {
            RiskLevel::High => 99,
            RiskLevel::Medium => 95,
            RiskLevel::Low => 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        // 2026-01-05 is a Monday.
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn omits_slots_with_fewer_than_three_samples() {
        let samples = vec![(ts(5, 10), 3.0), (ts(6, 10), 4.0)];
        let analyser = ConsumptionAnalyser::new(&samples);
        assert!(analyser.get_stats(10, DayType::Weekday).is_none());
    }

    #[test]
    fn percentile_lookup_and_risk_classification() {
        let samples = vec![
            (ts(5, 18), 2.0),
            (ts(6, 18), 3.0),
            (ts(12, 18), 8.0),
            (ts(13, 18), 9.0),
        ];
        let analyser = ConsumptionAnalyser::new(&samples);
        let stats = analyser.get_stats(18, DayType::Weekday).unwrap();
        assert_eq!(stats.sample_count, 4);
        assert!(stats.p95_kw > 5.0);
        assert_eq!(analyser.risk_level(18, DayType::Weekday), RiskLevel::High);
        assert_eq!(analyser.recommended_percentile(18, DayType::Weekday), 99);
    }

    #[test]
    fn weekend_and_weekday_buckets_are_separate() {
        assert_eq!(day_type(ts(5, 10)), DayType::Weekday); // Monday
        assert_eq!(day_type(ts(10, 10)), DayType::Weekend); // Saturday
    }
}
