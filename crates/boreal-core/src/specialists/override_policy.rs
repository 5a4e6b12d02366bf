//! Real-time override: the only specialist that can veto everything else.
//! Fires on two emergencies, both priority 1 and veto-flagged.

use boreal_types::{ActionKind, BatteryContext, Recommendation};

#[derive(Debug, Clone, Copy)]
pub struct OverridePolicy {
    pub spike_threshold_kw: f64,
    pub critical_margin_kw: f64,
    pub restoration_trigger_kwh: f64,
    pub restoration_target_kwh: f64,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self {
            spike_threshold_kw: 10.0,
            critical_margin_kw: 1.0,
            restoration_trigger_kwh: 2.0,
            restoration_target_kwh: 5.0,
        }
    }
}

impl OverridePolicy {
    #[must_use]
    pub fn propose(&self, context: &BatteryContext) -> Option<Recommendation> {
        if let Some(rec) = self.peak_about_to_be_set(context) {
            return Some(rec);
        }
        self.safety_reserve_restoration(context)
    }

    fn peak_about_to_be_set(&self, context: &BatteryContext) -> Option<Recommendation> {
        if !context.is_measurement_hour {
            return None;
        }
        if context.consumption_kw <= self.spike_threshold_kw {
            return None;
        }
        let margin_line = context.peak_threshold_kw - self.critical_margin_kw;
        if context.consumption_kw <= margin_line {
            return None;
        }

        let needed = context.consumption_kw - margin_line;
        let magnitude = needed
            .min(context.available_above_floor_kwh())
            .min(context.max_discharge_kw);
        if magnitude <= 0.0 {
            return None;
        }

        Some(Recommendation {
            kind: ActionKind::Discharge,
            magnitude_kwh: magnitude,
            confidence: 0.95,
            value_sek: 0.0,
            priority: 1,
            rationale: format!(
                "consumption {:.1} kW would set a new peak above threshold {:.1} kW; discharging {:.2} kWh",
                context.consumption_kw, context.peak_threshold_kw, magnitude
            ),
            is_veto: true,
            requires_immediate_action: true,
            source: "override",
            metadata: Default::default(),
        })
    }

    fn safety_reserve_restoration(&self, context: &BatteryContext) -> Option<Recommendation> {
        if context.is_measurement_hour {
            return None;
        }
        if context.soc_kwh >= context.floor_soc_kwh + self.restoration_trigger_kwh {
            return None;
        }

        let target = context.floor_soc_kwh + self.restoration_target_kwh;
        let magnitude = (target - context.soc_kwh).min(context.headroom_kwh());
        if magnitude <= 0.0 {
            return None;
        }

        Some(Recommendation {
            kind: ActionKind::Charge,
            magnitude_kwh: magnitude,
            confidence: 0.9,
            value_sek: 0.0,
            priority: 1,
            rationale: format!(
                "SoC {:.2} kWh near floor {:.2} kWh, restoring outside measurement window",
                context.soc_kwh, context.floor_soc_kwh
            ),
            is_veto: true,
            requires_immediate_action: true,
            source: "override",
            metadata: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_context() -> BatteryContext {
        BatteryContext {
            timestamp: Utc::now(),
            hour_of_day: 18,
            soc_kwh: 20.0,
            capacity_kwh: 20.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 12.0,
            efficiency: 0.95,
            consumption_kw: 4.0,
            solar_kw: 0.0,
            grid_import_kw: 4.0,
            spot_price: 1.0,
            spot_forecast: vec![1.0; 24],
            consumption_forecast: vec![4.0; 24],
            month_key: "2026-01".to_string(),
            top_n_peaks: vec![5.0, 4.0, 3.0],
            peak_threshold_kw: 10.0,
            is_measurement_hour: true,
            avg_consumption_kw: 4.0,
            peak_consumption_kw: 10.0,
            floor_soc_kwh: 2.0,
            target_morning_soc_kwh: 18.0,
        }
    }

    #[test]
    fn fires_veto_discharge_when_about_to_set_new_peak() {
        let policy = OverridePolicy::default();
        let mut context = base_context();
        context.consumption_kw = 13.0;
        context.peak_threshold_kw = 10.0;

        let rec = policy.propose(&context).expect("expected override");
        assert_eq!(rec.kind, ActionKind::Discharge);
        assert!(rec.is_veto);
        assert_eq!(rec.priority, 1);
        // threshold - margin = 9.0, needed = 13 - 9 = 4
        assert!((rec.magnitude_kwh - 4.0).abs() < 1e-9);
    }

    #[test]
    fn restores_reserve_outside_measurement_window_only() {
        let policy = OverridePolicy::default();
        let mut context = base_context();
        context.is_measurement_hour = false;
        context.soc_kwh = 2.5;
        context.floor_soc_kwh = 2.0;

        let rec = policy.propose(&context).expect("expected restoration");
        assert_eq!(rec.kind, ActionKind::Charge);
        assert!(rec.is_veto);

        // Does not charge during measurement hours even if critically low.
        context.is_measurement_hour = true;
        assert!(policy.propose(&context).is_none());
    }

    #[test]
    fn quiet_hour_produces_no_recommendation() {
        let policy = OverridePolicy::default();
        let context = base_context();
        assert!(policy.propose(&context).is_none());
    }
}
