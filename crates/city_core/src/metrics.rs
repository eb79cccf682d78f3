//! City-wide metrics derived from the building collection.
//!
//! A single `compute_metrics(&buildings, &prev_stats, &content)` pass produces
//! the full derived record. No state mutation, no IO. Several penalty terms
//! deliberately read the *previous* tick's stats (health, safety, the
//! happiness-driven appeal bonus) while others read values computed earlier
//! in the same pass; the floor/clamp points below are load-bearing and must
//! not be reordered.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{effective_props, BuildingKind, CityContent};
use crate::types::{BuildingId, BuildingState, CityStats, GameState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedMetrics {
    pub power_capacity: u32,
    pub power_demand: u32,
    pub water_capacity: u32,
    pub water_demand: u32,
    /// Already floored and clamped to 0..=100.
    pub happiness: i32,
    pub health_level: i32,
    pub safety_level: i32,
    pub education_level: i32,
    pub pollution_level: i32,
    pub appeal: i32,
    pub tourists: u32,
    pub total_maintenance: i64,
    pub total_residential_capacity: u32,
    pub total_jobs: u32,
    pub total_commercial_jobs: u32,
    pub derelict_count: u32,
}

/// Per-building contribution sums from the single accumulation pass.
#[derive(Default)]
struct ContributionTotals {
    power_capacity: u32,
    power_demand: u32,
    water_capacity: u32,
    water_demand: u32,
    direct_happiness: i32,
    maintenance: i64,
    residential_capacity: u32,
    jobs: u32,
    commercial_jobs: u32,
    patient_capacity: u32,
    student_capacity: u32,
    education_points: u32,
    pollution_output: u32,
    pollution_reduction: u32,
    appeal_points: u32,
    derelict_count: u32,
    industrial_count: u32,
    park_count: u32,
    active_fires: u32,
    any_hospital: bool,
    any_education: bool,
}

fn accumulate(buildings: &HashMap<BuildingId, BuildingState>, content: &CityContent) -> ContributionTotals {
    let mut t = ContributionTotals::default();
    for b in buildings.values() {
        let def = content.building(b.kind);
        let props = effective_props(def, b.level);

        // Rubble costs half its upkeep and contributes nothing else.
        if b.is_derelict() {
            t.derelict_count += 1;
            t.maintenance += props.maintenance_cost / 2;
            continue;
        }

        t.power_capacity += props.power_capacity;
        t.power_demand += props.power_demand;
        t.water_capacity += props.water_capacity;
        t.water_demand += props.water_demand;
        t.maintenance += props.maintenance_cost;
        t.residential_capacity += props.residential_capacity;
        t.jobs += props.jobs;
        if b.kind == BuildingKind::Commercial {
            t.commercial_jobs += props.jobs;
        }
        t.patient_capacity += props.patient_capacity;
        t.student_capacity += props.student_capacity;
        t.education_points += props.education_points;

        // A building actively on fire keeps its capacities but stops
        // pleasing, polluting, or attracting anyone.
        if !b.on_fire {
            t.direct_happiness += props.happiness_effect;
            t.pollution_output += props.pollution_output;
            t.pollution_reduction += props.pollution_reduction;
            t.appeal_points += props.appeal_points;
            match b.kind {
                BuildingKind::Industrial => t.industrial_count += 1,
                BuildingKind::Park => t.park_count += 1,
                BuildingKind::Hospital => t.any_hospital = true,
                BuildingKind::School | BuildingKind::University => t.any_education = true,
                _ => {}
            }
        }
        if b.is_burning() {
            t.active_fires += 1;
        }
    }
    t
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::too_many_lines,
    clippy::cognitive_complexity
)]
pub fn compute_metrics(
    buildings: &HashMap<BuildingId, BuildingState>,
    prev: &CityStats,
    content: &CityContent,
) -> DerivedMetrics {
    let c = &content.constants;
    let t = accumulate(buildings, content);
    let building_count = buildings.len();

    // --- Happiness: baseline plus direct contributions, then ordered
    // penalties. Shortage penalties only apply to a non-empty city.
    let mut happiness = f64::from(c.initial_happiness + t.direct_happiness);
    if t.power_demand > t.power_capacity && building_count > 0 {
        happiness -= 15.0;
    }
    if t.water_demand > t.water_capacity && building_count > 0 {
        happiness += f64::from(c.no_water_happiness_penalty);
    }

    // Industrial pressure unless balanced by parks.
    if f64::from(t.industrial_count) > f64::from(t.park_count) * 1.5 && t.industrial_count > 0 {
        happiness -= f64::from(t.industrial_count) * 2.5;
    }

    if prev.population > 0 && t.jobs < prev.population {
        let unemployment_rate =
            f64::from(prev.population - t.jobs) / f64::from(prev.population);
        if unemployment_rate > c.unemployment_threshold {
            happiness -= (unemployment_rate * 30.0).floor();
        }
    }

    if prev.funds < c.low_funds_threshold {
        happiness -= 10.0;
    }
    if prev.funds < c.deep_debt_threshold {
        happiness -= 15.0;
    }

    // --- Pollution level, needed by the next happiness term.
    let net_pollution_units = t.pollution_output.saturating_sub(t.pollution_reduction);
    let pollution_level = if c.pollution_units_for_max_level > 0 {
        let scaled = f64::from(net_pollution_units)
            / f64::from(c.pollution_units_for_max_level)
            * 100.0;
        (scaled.floor() as i32).min(100)
    } else {
        0
    };
    happiness -= f64::from(pollution_level) * c.pollution_happiness_factor;

    // --- Health: patient capacity against half the population, special-cased
    // for empty cities and cities without a functioning hospital.
    let mut health = if prev.population > 0 && t.any_hospital {
        let scaled =
            f64::from(t.patient_capacity) / (f64::from(prev.population) * 0.5) * 100.0;
        f64::from((scaled.floor() as i32).min(100))
    } else if t.any_hospital {
        100.0
    } else {
        50.0
    };
    if pollution_level > c.pollution_health_impact_threshold {
        health -= f64::from(pollution_level - c.pollution_health_impact_threshold)
            * c.pollution_health_penalty_factor;
    }
    let health_level = (health.floor() as i32).clamp(0, 100);

    // Happiness reads *last* tick's health, not the value just computed.
    if prev.health_level < c.health_penalty_threshold {
        happiness -= f64::from(c.health_penalty_threshold - prev.health_level) / 2.0;
    }

    // --- Safety: each active fire costs 20 points.
    let safety_level = (100 - t.active_fires as i32 * 20).max(0);
    if prev.safety_level < c.safety_penalty_threshold {
        happiness -= f64::from(c.safety_penalty_threshold - prev.safety_level);
    }
    happiness -= f64::from(t.active_fires) * 5.0;

    // --- Education: capacity/quality blend under demand, readiness or decay
    // curves otherwise.
    let education_demand = f64::from(prev.population) * c.education_demand_ratio;
    let education_level = if t.any_education {
        if education_demand > 0.0 {
            let quality_ratio =
                (f64::from(t.education_points) / education_demand.max(1.0)).min(1.0);
            let capacity_ratio =
                (f64::from(t.student_capacity) / education_demand.max(1.0)).min(1.0);
            let mut edu = (capacity_ratio * 70.0 + quality_ratio * 30.0).floor() as i32;
            edu += (f64::from(t.education_points) * 0.05).floor() as i32;
            edu.min(100)
        } else {
            // Schools standing, nobody to teach: high readiness.
            75
        }
    } else if education_demand > 0.0 {
        if prev.population < 15 {
            // Grace period for hamlets.
            c.initial_education_level
        } else if prev.population < 40 {
            (c.initial_education_level
                - ((f64::from(prev.population) - 15.0) / 1.5).floor() as i32)
                .max(30)
        } else {
            25
        }
    } else {
        c.initial_education_level
    };
    let education_level = education_level.clamp(0, 100);

    if education_level < c.education_penalty_threshold {
        happiness -= f64::from(c.education_penalty_threshold - education_level) / 1.5;
    }

    // --- Appeal: a small intrinsic bonus when the city is broadly healthy,
    // building appeal points, sentiment and education bonuses, scaled and
    // then penalized by pollution and rubble.
    let intrinsic_appeal = if prev.happiness >= 50
        && pollution_level < 40
        && health_level >= c.health_penalty_threshold
        && safety_level >= c.safety_penalty_threshold
    {
        5.0
    } else {
        0.0
    };
    let mut raw_appeal_units = f64::from(t.appeal_points) + intrinsic_appeal;
    if prev.happiness > 50 {
        raw_appeal_units += f64::from(prev.happiness - 50) * c.happiness_appeal_bonus_factor;
    }
    if education_level > c.education_penalty_threshold {
        raw_appeal_units += f64::from(education_level - c.education_penalty_threshold)
            * c.education_appeal_bonus_factor;
    }
    raw_appeal_units = raw_appeal_units.max(0.0);

    let mut appeal = if c.appeal_units_for_max_level > 0 {
        (raw_appeal_units / f64::from(c.appeal_units_for_max_level) * 100.0).floor()
    } else {
        0.0
    };
    appeal -= f64::from(pollution_level) * c.pollution_appeal_penalty_factor;
    appeal -= f64::from(t.derelict_count) * f64::from(c.derelict_appeal_penalty);
    let appeal = (appeal.floor() as i32).clamp(0, 100);

    // --- Tourists: appeal-driven, capped by commercial job capacity.
    let tourists = (f64::from(appeal) * 2.5 + f64::from(t.appeal_points) * 0.5).floor() as i64;
    let tourist_ceiling = i64::from(t.commercial_jobs / c.commercial_jobs_per_tourist);
    let tourists = tourists.min(tourist_ceiling).max(0) as u32;

    let happiness = (happiness.floor() as i32).clamp(0, 100);

    DerivedMetrics {
        power_capacity: t.power_capacity,
        power_demand: t.power_demand,
        water_capacity: t.water_capacity,
        water_demand: t.water_demand,
        happiness,
        health_level,
        safety_level,
        education_level,
        pollution_level,
        appeal,
        tourists,
        total_maintenance: t.maintenance,
        total_residential_capacity: t.residential_capacity,
        total_jobs: t.jobs,
        total_commercial_jobs: t.commercial_jobs,
        derelict_count: t.derelict_count,
    }
}

/// Recomputes the derived fields of `state.stats` in place without advancing
/// the month. Used after every placement, demolition, and upgrade, and after
/// loading a snapshot; derived values are never trusted from storage.
pub fn refresh_derived_stats(state: &mut GameState, content: &CityContent) {
    let m = compute_metrics(&state.buildings, &state.stats, content);
    let stats = &mut state.stats;
    stats.power_capacity = m.power_capacity;
    stats.power_demand = m.power_demand;
    stats.water_capacity = m.water_capacity;
    stats.water_demand = m.water_demand;
    stats.happiness = m.happiness;
    stats.health_level = m.health_level;
    stats.safety_level = m.safety_level;
    stats.education_level = m.education_level;
    stats.pollution_level = m.pollution_level;
    stats.appeal = m.appeal;
    stats.tourists = m.tourists;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
