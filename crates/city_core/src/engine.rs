use rand::Rng;

use crate::catalog::CityContent;
use crate::fire::advance_fires;
use crate::metrics::compute_metrics;
use crate::types::{CityStats, Event, EventEnvelope, EventLevel, GameState};

/// Advance the simulation by one month.
///
/// Order of operations:
/// 1. Advance fires (damage, suppression, destruction, spread, ignition).
/// 2. Recompute derived metrics from the updated buildings.
/// 3. Settle funds: tax + tourism income minus maintenance.
/// 4. Apply population growth/departure, gated by service levels.
/// 5. Advance the month, store stats, append a history snapshot.
/// 6. Drop the selection if its building burned down this tick.
///
/// Returns all events produced this tick.
pub fn tick(
    state: &mut GameState,
    content: &CityContent,
    rng: &mut impl Rng,
    event_level: EventLevel,
) -> Vec<EventEnvelope> {
    let c = &content.constants;
    let mut events = Vec::new();

    advance_fires(state, content, rng, &mut events);

    let metrics = compute_metrics(&state.buildings, &state.stats, content);

    // Income is taxed on last month's population and tourist count; the
    // freshly derived totals only land in stats below.
    let tourism_income = i64::from(state.stats.tourists) * c.tourist_income;
    let income = i64::from(state.stats.population) * c.tax_per_capita + tourism_income;
    let expense = metrics.total_maintenance;
    let net = income - expense;
    let new_funds = state.stats.funds + net;

    // --- Population change.
    let population = i64::from(state.stats.population);
    let residential_capacity = i64::from(metrics.total_residential_capacity);
    let has_water = metrics.water_demand <= metrics.water_capacity;
    let is_healthy = metrics.health_level > c.health_penalty_threshold;
    let is_safe = metrics.safety_level > c.safety_penalty_threshold;
    let is_educated = metrics.education_level >= c.education_penalty_threshold;
    let pollution_acceptable =
        metrics.pollution_level < c.pollution_health_impact_threshold + 20;

    let mut growth: i64 = 0;
    if population < residential_capacity
        && has_water
        && is_healthy
        && is_safe
        && is_educated
        && pollution_acceptable
    {
        let growth_factor = match metrics.happiness {
            h if h > 80 => 0.06,
            h if h > 60 => 0.04,
            h if h > 40 => 0.02,
            _ => 0.0,
        };
        growth = (population as f64 * growth_factor + 1.0).floor() as i64
            + (residential_capacity as f64 * 0.005).floor() as i64;
        if metrics.appeal > 70 {
            growth += (f64::from(metrics.tourists) * 0.01).floor() as i64;
        }
    }

    // Departure is the worst single grievance, not their sum.
    let mut departure_factor: f64 = 0.0;
    if metrics.happiness < 25 {
        departure_factor = departure_factor.max(0.06);
    }
    if metrics.happiness < 40 {
        departure_factor = departure_factor.max(0.03);
    }
    if !has_water {
        departure_factor = departure_factor.max(0.08);
    }
    if !is_healthy {
        departure_factor = departure_factor.max(0.06);
    }
    if !is_safe {
        departure_factor = departure_factor.max(0.07);
    }
    if !is_educated {
        departure_factor = departure_factor.max(0.04);
    }
    if !pollution_acceptable && metrics.pollution_level > 75 {
        departure_factor = departure_factor.max(0.05);
    }
    let departure = if departure_factor > 0.0 {
        (population as f64 * departure_factor + 1.0).floor() as i64
    } else {
        0
    };

    let mut change = growth - departure;

    // Soft cap: net inflow slows once the city outgrows its job market.
    let job_ceiling = f64::from(metrics.total_jobs) * 1.25;
    let potential = population + change;
    if change > 0 && potential as f64 > job_ceiling {
        change = (change - ((potential as f64 - job_ceiling) / 2.0).floor() as i64).max(0);
    }

    let new_population = (population + change).clamp(0, residential_capacity) as u32;

    // --- Assemble the month's stats.
    state.stats = CityStats {
        month: state.stats.month + 1,
        population: new_population,
        funds: new_funds,
        power_capacity: metrics.power_capacity,
        power_demand: metrics.power_demand,
        water_capacity: metrics.water_capacity,
        water_demand: metrics.water_demand,
        happiness: metrics.happiness,
        health_level: metrics.health_level,
        safety_level: metrics.safety_level,
        education_level: metrics.education_level,
        pollution_level: metrics.pollution_level,
        appeal: metrics.appeal,
        tourists: metrics.tourists,
    };

    events.push(crate::emit(
        &mut state.counters,
        state.stats.month,
        Event::MonthlyReport {
            income,
            expense,
            net,
        },
    ));
    if event_level == EventLevel::Debug {
        events.push(crate::emit(
            &mut state.counters,
            state.stats.month,
            Event::PopulationFlow {
                growth,
                departure,
                applied: change,
            },
        ));
    }

    push_history(state, c.history_capacity);

    // A building destroyed this tick is no longer inspectable.
    if let Some(selected) = &state.selected {
        let alive = state
            .buildings
            .get(selected)
            .is_some_and(|b| !b.is_derelict());
        if !alive {
            state.selected = None;
        }
    }

    state.planner.cooldown_months = state.planner.cooldown_months.saturating_sub(1);

    events
}

fn push_history(state: &mut GameState, capacity: usize) {
    state.history.push_back(state.stats.clone());
    while state.history.len() > capacity {
        state.history.pop_front();
    }
}
