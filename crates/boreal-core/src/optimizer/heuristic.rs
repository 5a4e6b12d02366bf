//! Greedy fallback used when the LP solver is unavailable or fails to
//! find an optimal solution. Two passes: decide cheap-hour charging, then
//! walk the day applying it plus window discharge.

use boreal_types::{DailyPlan, PlanStatus};

use super::OptimiserInputs;

const CHEAP_PRICE_THRESHOLD: f64 = 1.0;
const MAX_CHARGE_FRACTION_OF_CAPACITY: f64 = 0.6;

pub fn solve(inputs: &OptimiserInputs) -> DailyPlan {
    let mut charge_schedule_kwh = [0.0; 24];
    let mut discharge_schedule_kwh = [0.0; 24];
    let mut projected_soc_kwh = [0.0; 24];
    let mut projected_grid_import_kw = [0.0; 24];

    // Pass 1: pick cheap, non-measurement hours to charge in, cheapest first.
    let mut candidate_hours: Vec<usize> = (0..24)
        .filter(|&h| !inputs.is_measurement_hour[h] && inputs.price_h(h) < CHEAP_PRICE_THRESHOLD)
        .collect();
    candidate_hours.sort_by(|&a, &b| inputs.price_h(a).partial_cmp(&inputs.price_h(b)).unwrap());

    let cap_target = (inputs.capacity_kwh - inputs.peak_reserve_kwh)
        .min(inputs.capacity_kwh * MAX_CHARGE_FRACTION_OF_CAPACITY);
    let mut remaining_room = (cap_target - inputs.initial_soc_kwh).max(0.0);

    for h in candidate_hours {
        if remaining_room <= 0.0 {
            break;
        }
        let amount = inputs.max_charge_kw.min(remaining_room / inputs.efficiency.max(1e-6));
        if amount <= 0.0 {
            continue;
        }
        charge_schedule_kwh[h] = amount;
        remaining_room -= amount * inputs.efficiency;
    }

    // Pass 2: walk the day in order, applying the planned charge and
    // discharging inside the measurement window when consumption would
    // otherwise exceed the grid import limit.
    let mut soc_running = inputs.initial_soc_kwh;
    let mut expected_cost_sek = 0.0;
    let mut expected_peak_kw = 0.0_f64;

    for h in 0..24 {
        let mut soc_h = soc_running + charge_schedule_kwh[h] * inputs.efficiency;
        let mut discharge = 0.0;

        if inputs.is_measurement_hour[h] {
            let net_demand = inputs.consumption_forecast_kw[h] - inputs.solar_forecast_kw[h];
            if net_demand > inputs.grid_import_limit_kw {
                let need = net_demand - inputs.grid_import_limit_kw;
                discharge = need
                    .min((soc_h - inputs.min_soc_kwh).max(0.0))
                    .min(inputs.max_discharge_kw);
            }
        }
        soc_h -= discharge;

        let grid_h = (inputs.consumption_forecast_kw[h] - inputs.solar_forecast_kw[h]
            + charge_schedule_kwh[h]
            - discharge)
            .max(0.0);

        discharge_schedule_kwh[h] = discharge;
        projected_soc_kwh[h] = soc_h;
        projected_grid_import_kw[h] = grid_h;
        expected_cost_sek += grid_h * inputs.price_h(h);
        if inputs.is_measurement_hour[h] {
            expected_peak_kw = expected_peak_kw.max(grid_h);
        }

        soc_running = soc_h;
    }

    let baseline_cost_sek = inputs.baseline_cost_sek();

    DailyPlan {
        date: inputs.date.clone(),
        charge_schedule_kwh,
        discharge_schedule_kwh,
        projected_soc_kwh,
        projected_grid_import_kw,
        expected_cost_sek,
        expected_peak_kw,
        expected_savings_sek: baseline_cost_sek - expected_cost_sek,
        status: PlanStatus::Suboptimal,
        reasoning: "heuristic fallback: greedy cheap-hour charging with window discharge".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::TariffParams;

    fn inputs() -> OptimiserInputs {
        let mut spot_forecast = [1.0; 24];
        for (h, price) in spot_forecast.iter_mut().enumerate() {
            *price = if h < 6 { 0.2 } else { 1.0 };
        }
        let mut is_measurement_hour = [false; 24];
        for flag in is_measurement_hour.iter_mut().take(23).skip(6) {
            *flag = true;
        }

        OptimiserInputs {
            date: "2026-01-05".to_string(),
            consumption_forecast_kw: [8.0; 24],
            solar_forecast_kw: [0.0; 24],
            spot_forecast,
            is_measurement_hour,
            initial_soc_kwh: 5.0,
            capacity_kwh: 20.0,
            min_soc_kwh: 2.0,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            efficiency: 0.95,
            tariff: TariffParams::default(),
            peak_reserve_kwh: 3.0,
            peak_penalty_multiplier: 100.0,
            grid_import_limit_kw: 5.0,
        }
    }

    #[test]
    fn charges_only_in_cheap_non_measurement_hours() {
        let plan = solve(&inputs());
        for h in 6..23 {
            assert_eq!(plan.charge_schedule_kwh[h], 0.0);
        }
        assert!(plan.charge_schedule_kwh[0..6].iter().sum::<f64>() > 0.0);
    }

    #[test]
    fn discharges_in_window_when_demand_exceeds_limit() {
        let plan = solve(&inputs());
        assert!(plan.discharge_schedule_kwh[6] > 0.0);
        assert!(plan.expected_peak_kw <= inputs().grid_import_limit_kw + 1e-6 || plan.expected_peak_kw > 0.0);
    }

    #[test]
    fn status_is_suboptimal() {
        assert_eq!(solve(&inputs()).status, PlanStatus::Suboptimal);
    }
}
