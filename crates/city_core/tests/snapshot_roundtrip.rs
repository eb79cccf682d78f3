//! Serialize → deserialize → recompute must be a no-op for derived state.

use city_core::test_fixtures::{base_content, base_state, make_rng, spawn_building};
use city_core::{compute_metrics, refresh_derived_stats, tick, BuildingKind, EventLevel, GameState};

fn populated_state(content: &city_core::CityContent) -> GameState {
    let mut state = base_state(content);
    spawn_building(&mut state, BuildingKind::PowerPlant, 10, 10);
    spawn_building(&mut state, BuildingKind::WaterTower, 12, 10);
    spawn_building(&mut state, BuildingKind::Road, 11, 10);
    spawn_building(&mut state, BuildingKind::Residential, 10, 11);
    spawn_building(&mut state, BuildingKind::Commercial, 11, 11);
    spawn_building(&mut state, BuildingKind::Landmark, 12, 11);
    state.stats.population = 60;
    state.stats.funds = 12_345;
    refresh_derived_stats(&mut state, content);
    state
}

#[test]
fn recomputed_metrics_survive_the_round_trip() {
    let content = base_content();
    let state = populated_state(&content);

    let json = serde_json::to_string(&state).expect("serialize");
    let restored: GameState = serde_json::from_str(&json).expect("deserialize");

    let original = compute_metrics(&state.buildings, &state.stats, &content);
    let recomputed = compute_metrics(&restored.buildings, &restored.stats, &content);
    assert_eq!(original, recomputed);
    assert_eq!(state.stats, restored.stats);
    assert_eq!(state.history, restored.history);
    assert_eq!(state.planner.cooldown_months, restored.planner.cooldown_months);
}

#[test]
fn restored_state_ticks_identically() {
    let content = base_content();
    let state = populated_state(&content);

    let json = serde_json::to_string(&state).expect("serialize");
    let mut restored: GameState = serde_json::from_str(&json).expect("deserialize");
    let mut original = state;

    let mut rng_a = make_rng();
    let mut rng_b = make_rng();
    for _ in 0..12 {
        tick(&mut original, &content, &mut rng_a, EventLevel::Normal);
        tick(&mut restored, &content, &mut rng_b, EventLevel::Normal);
        assert_eq!(original.stats, restored.stats);
    }
    assert_eq!(original.history, restored.history);
}
