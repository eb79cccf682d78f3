use super::*;
use crate::test_fixtures::{base_content, base_state, make_rng, spawn_building};

mod fire;
mod growth;
mod roads;

// --- Shared test helpers ------------------------------------------------

fn test_content() -> CityContent {
    base_content()
}

fn test_state(content: &CityContent) -> GameState {
    base_state(content)
}

/// Places a supplied starter block: power plant, water tower, and a road
/// between them, far from the cells most tests build on.
fn state_with_utilities(content: &CityContent) -> GameState {
    let mut state = test_state(content);
    spawn_building(&mut state, BuildingKind::PowerPlant, 20, 20);
    spawn_building(&mut state, BuildingKind::WaterTower, 22, 20);
    spawn_building(&mut state, BuildingKind::Road, 21, 20);
    state
}

fn place(
    state: &mut GameState,
    content: &CityContent,
    kind: BuildingKind,
    x: i32,
    z: i32,
) -> Result<BuildingId, ActionError> {
    let mut events = Vec::new();
    place_building(state, content, kind, x, z, Provenance::Player, &mut events)
}
