//! Shared test fixtures for `city_core` and downstream crates.
//!
//! `base_content()` is the stock catalog with spontaneous ignition disabled
//! so behavior tests are deterministic; fire tests raise the chances back up
//! explicitly. `base_state()` is an empty city at month 1.

use std::collections::{HashMap, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    default_content, BuildingId, BuildingKind, BuildingState, CityContent, CityStats, Counters,
    GameState, MetaState, PlannerState, BASE_BUILDING_LEVEL, MAX_FIRE_HEALTH,
};

pub fn base_content() -> CityContent {
    let mut content = default_content();
    content.constants.fire_start_chance = 0.0;
    content
}

pub fn base_state(content: &CityContent) -> GameState {
    let c = &content.constants;
    GameState {
        meta: MetaState {
            seed: 42,
            schema_version: 1,
            content_version: content.content_version.clone(),
        },
        buildings: HashMap::new(),
        stats: CityStats {
            month: 1,
            population: 0,
            funds: c.initial_funds,
            power_capacity: 0,
            power_demand: 0,
            water_capacity: 0,
            water_demand: 0,
            happiness: c.initial_happiness,
            health_level: c.initial_health_level,
            safety_level: c.initial_safety_level,
            education_level: c.initial_education_level,
            pollution_level: c.initial_pollution_level,
            appeal: c.initial_appeal,
            tourists: 0,
        },
        history: VecDeque::new(),
        selected: None,
        planner: PlannerState {
            autonomy_enabled: false,
            cooldown_months: c.planner_cooldown_months,
            busy: false,
            focus: None,
        },
        counters: Counters {
            next_event_id: 0,
            next_building_id: 0,
        },
    }
}

/// Inserts a level-1 building directly, bypassing funds and occupancy checks.
pub fn spawn_building(
    state: &mut GameState,
    kind: BuildingKind,
    x: i32,
    z: i32,
) -> BuildingId {
    let id = BuildingId(format!("bld_{:06}", state.counters.next_building_id));
    state.counters.next_building_id += 1;
    state.buildings.insert(
        id.clone(),
        BuildingState {
            id: id.clone(),
            kind,
            x,
            z,
            level: BASE_BUILDING_LEVEL,
            on_fire: false,
            fire_health: MAX_FIRE_HEALTH,
        },
    );
    id
}

/// Deterministic RNG seeded with 42.
pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
