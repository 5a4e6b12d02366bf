//! Per-month top-N grid-import peak tracking for the effect tariff.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;

#[derive(Debug, Clone)]
struct MonthPeaks {
    samples: Vec<(DateTime<Utc>, f64)>,
}

impl MonthPeaks {
    fn new() -> Self {
        Self { samples: Vec::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthStatistics {
    pub total_measurements: usize,
    pub top_n_peaks: Vec<f64>,
    pub top_n_average_kw: f64,
    pub threshold_kw: f64,
    pub max_peak_kw: f64,
    pub min_peak_kw: f64,
    pub avg_all_kw: f64,
}

/// Tracks monthly grid-import peaks inside the configured measurement
/// window, for effect-tariff billing.
///
/// Caches are write-through: every `update` invalidates the affected
/// month's cached top-N/threshold rather than incrementally maintaining
/// them. This keeps correctness trivial to verify at the cost of
/// recomputing a sort on the next read.
#[derive(Debug)]
pub struct PeakTracker {
    measurement_start_hour: u32,
    measurement_end_hour: u32,
    top_n: usize,
    monthly: RwLock<HashMap<String, MonthPeaks>>,
}

impl PeakTracker {
    #[must_use]
    pub fn new(measurement_start_hour: u32, measurement_end_hour: u32, top_n: usize) -> Self {
        Self {
            measurement_start_hour,
            measurement_end_hour,
            top_n,
            monthly: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn is_measurement_hour(&self, timestamp: DateTime<Utc>) -> bool {
        let hour = timestamp.hour();
        hour >= self.measurement_start_hour && hour <= self.measurement_end_hour
    }

    #[must_use]
    pub fn month_key(timestamp: DateTime<Utc>) -> String {
        format!("{:04}-{:02}", timestamp.year(), timestamp.month())
    }

    /// Ingests a (timestamp, grid-import kW) sample. No-op outside the
    /// measurement window.
    pub fn update(&self, timestamp: DateTime<Utc>, grid_import_kw: f64) {
        if !self.is_measurement_hour(timestamp) {
            return;
        }
        let key = Self::month_key(timestamp);
        let mut months = self.monthly.write();
        months
            .entry(key)
            .or_insert_with(MonthPeaks::new)
            .samples
            .push((timestamp, grid_import_kw));
    }

    fn sorted_values(&self, month: &str) -> Vec<f64> {
        let months = self.monthly.read();
        let Some(month_peaks) = months.get(month) else {
            return Vec::new();
        };
        let mut values: Vec<f64> = month_peaks.samples.iter().map(|(_, kw)| *kw).collect();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());
        values
    }

    /// The N largest samples this month, descending, length <= top_n.
    #[must_use]
    pub fn top_n_peaks(&self, month: &str) -> Vec<f64> {
        let sorted = self.sorted_values(month);
        sorted.into_iter().take(self.top_n).collect()
    }

    /// Arithmetic mean of `top_n_peaks`, 0 when no samples recorded.
    /// This is the quantity multiplied by the effect tariff.
    #[must_use]
    pub fn top_n_average(&self, month: &str) -> f64 {
        let top = self.top_n_peaks(month);
        if top.is_empty() {
            0.0
        } else {
            top.iter().sum::<f64>() / top.len() as f64
        }
    }

    /// The N-th largest value recorded this month; 0 while fewer than N
    /// samples exist (any positive peak counts).
    #[must_use]
    pub fn threshold(&self, month: &str) -> f64 {
        let top = self.top_n_peaks(month);
        if top.len() < self.top_n {
            0.0
        } else {
            *top.last().unwrap_or(&0.0)
        }
    }

    /// Simulates replacing the sample equal to `current_kw` with
    /// `reduced_kw` and returns `(improves?, delta_kw)`.
    #[must_use]
    pub fn would_improve(&self, month: &str, current_kw: f64, reduced_kw: f64) -> (bool, f64) {
        let threshold = self.threshold(month);
        let top = self.top_n_peaks(month);

        if current_kw <= threshold && top.len() >= self.top_n {
            return (false, 0.0);
        }

        let current_avg = self.top_n_average(month);

        let mut simulated = self.sorted_values(month);
        if let Some(pos) = simulated.iter().position(|v| *v == current_kw) {
            simulated.remove(pos);
        }
        simulated.push(reduced_kw);
        simulated.sort_by(|a, b| b.partial_cmp(a).unwrap());
        simulated.truncate(self.top_n);

        let new_avg = if simulated.is_empty() {
            0.0
        } else {
            simulated.iter().sum::<f64>() / simulated.len() as f64
        };

        let savings = current_avg - new_avg;
        (savings > 0.01, savings)
    }

    /// All recorded samples for a month, descending by kW.
    #[must_use]
    pub fn all_peaks(&self, month: &str) -> Vec<(DateTime<Utc>, f64)> {
        let months = self.monthly.read();
        let Some(month_peaks) = months.get(month) else {
            return Vec::new();
        };
        let mut samples = month_peaks.samples.clone();
        samples.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        samples
    }

    /// Sample count, min, max, mean over the whole month (not just top-N),
    /// for the post-run summary.
    #[must_use]
    pub fn statistics(&self, month: &str) -> MonthStatistics {
        let values = self.sorted_values(month);
        if values.is_empty() {
            return MonthStatistics::default();
        }
        let max = values[0];
        let min = *values.last().unwrap();
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        MonthStatistics {
            total_measurements: values.len(),
            top_n_peaks: self.top_n_peaks(month),
            top_n_average_kw: self.top_n_average(month),
            threshold_kw: self.threshold(month),
            max_peak_kw: max,
            min_peak_kw: min,
            avg_all_kw: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn update_ignores_outside_measurement_window() {
        let tracker = PeakTracker::new(6, 23, 3);
        tracker.update(ts(1, 2), 10.0);
        assert_eq!(tracker.top_n_peaks("2026-01"), Vec::<f64>::new());
    }

    #[test]
    fn threshold_zero_until_top_n_filled() {
        let tracker = PeakTracker::new(6, 23, 3);
        tracker.update(ts(1, 10), 5.0);
        tracker.update(ts(2, 10), 6.0);
        assert_eq!(tracker.threshold("2026-01"), 0.0);
        tracker.update(ts(3, 10), 7.0);
        assert_eq!(tracker.threshold("2026-01"), 5.0);
    }

    #[test]
    fn top_n_average_is_mean_of_top_n() {
        let tracker = PeakTracker::new(6, 23, 3);
        for (day, kw) in [(1, 3.0), (2, 9.0), (3, 7.0), (4, 1.0)] {
            tracker.update(ts(day, 10), kw);
        }
        // top 3: 9, 7, 3 -> mean 6.333...
        assert!((tracker.top_n_average("2026-01") - (19.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn would_improve_detects_reduction_of_top_peak() {
        let tracker = PeakTracker::new(6, 23, 3);
        for (day, kw) in [(1, 3.0), (2, 9.0), (3, 7.0)] {
            tracker.update(ts(day, 10), kw);
        }
        let (improves, delta) = tracker.would_improve("2026-01", 9.0, 5.0);
        assert!(improves);
        assert!(delta > 0.0);
    }
}
