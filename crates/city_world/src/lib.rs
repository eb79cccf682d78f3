//! Content loading, initial-state construction, and snapshot persistence
//! shared between `city_cli` and `city_daemon`.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use city_core::{
    refresh_derived_stats, BuildingDef, BuildingKind, CityContent, CityStats, Constants, Counters,
    GameState, MetaState, PlannerState,
};

#[derive(Deserialize)]
struct BuildingsFile {
    content_version: String,
    buildings: Vec<BuildingDef>,
}

/// Validates a loaded catalog, panicking on any authoring error.
///
/// Catches mistakes like: a building kind with zero or duplicate catalog
/// entries, a free upgrade tier, or a fire station that covers an area but
/// can service no fires.
pub fn validate_content(content: &CityContent) {
    for kind in BuildingKind::ALL {
        let matching = content
            .buildings
            .iter()
            .filter(|d| d.kind == kind)
            .count();
        assert!(
            matching == 1,
            "building kind {kind:?} has {matching} catalog entries, expected exactly 1",
        );
    }

    for def in &content.buildings {
        assert!(
            !def.name.is_empty(),
            "building {:?} has an empty display name",
            def.kind,
        );
        assert!(
            def.cost >= 0,
            "building {:?} has a negative placement cost",
            def.kind,
        );
        for tier in &def.upgrades {
            assert!(
                !tier.name.is_empty(),
                "building {:?} has an unnamed upgrade tier",
                def.kind,
            );
            assert!(
                tier.cost > 0,
                "building {:?} upgrade '{}' must not be free",
                def.kind,
                tier.name,
            );
        }
        if def.base.fire_coverage_radius > 0.0 {
            assert!(
                def.base.max_active_fires > 0,
                "building {:?} covers fires but services none",
                def.kind,
            );
        }
    }

    let c = &content.constants;
    assert!(c.grid_size > 0, "grid size must be positive");
    assert!(c.history_capacity > 0, "history capacity must be positive");
    assert!(
        c.planner_max_actions_per_turn > 0,
        "planner must be allowed at least one action per turn",
    );
}

/// The stock catalog, validated.
pub fn default_content() -> CityContent {
    let content = city_core::default_content();
    validate_content(&content);
    content
}

/// Loads `constants.json` and `buildings.json` from a content directory.
pub fn load_content(content_dir: &str) -> Result<CityContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let buildings_file: BuildingsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("buildings.json")).context("reading buildings.json")?,
    )
    .context("parsing buildings.json")?;
    let content = CityContent {
        content_version: buildings_file.content_version,
        buildings: buildings_file.buildings,
        constants,
    };
    validate_content(&content);
    Ok(content)
}

/// An empty city on a fresh grid at month 1.
pub fn build_initial_state(content: &CityContent, seed: u64) -> GameState {
    let c = &content.constants;
    GameState {
        meta: MetaState {
            seed,
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

// ---------------------------------------------------------------------------
// Snapshot persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    pub schema_version: u32,
    pub saved_at: String,
    pub state: GameState,
    /// Opaque to the simulation; the renderer round-trips its camera here.
    #[serde(default)]
    pub camera: Option<serde_json::Value>,
}

pub fn save_snapshot(
    path: &Path,
    state: &GameState,
    camera: Option<serde_json::Value>,
) -> Result<()> {
    let saved = SavedGame {
        schema_version: 1,
        saved_at: chrono::Utc::now().to_rfc3339(),
        state: state.clone(),
        camera,
    };
    let json = serde_json::to_string_pretty(&saved).context("serializing snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("writing snapshot: {}", path.display()))?;
    Ok(())
}

/// Loads a snapshot, falling back to a fresh city when the file is absent or
/// malformed; a broken save is recoverable, not fatal. Derived statistics
/// are always recomputed, never trusted from storage.
pub fn load_snapshot(
    path: &Path,
    content: &CityContent,
    seed: u64,
) -> (GameState, Option<serde_json::Value>) {
    let saved = std::fs::read_to_string(path)
        .ok()
        .and_then(|json| serde_json::from_str::<SavedGame>(&json).ok());
    match saved {
        Some(saved) => {
            let mut state = saved.state;
            refresh_derived_stats(&mut state, content);
            (state, saved.camera)
        }
        None => (build_initial_state(content, seed), None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use city_core::test_fixtures::spawn_building;

    #[test]
    fn initial_state_matches_content_constants() {
        let content = default_content();
        let state = build_initial_state(&content, 7);
        assert_eq!(state.meta.seed, 7);
        assert_eq!(state.stats.month, 1);
        assert_eq!(state.stats.funds, 50_000);
        assert_eq!(state.stats.happiness, 65);
        assert_eq!(state.stats.population, 0);
        assert!(state.buildings.is_empty());
        assert!(!state.planner.autonomy_enabled);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let content = default_content();
        let mut state = build_initial_state(&content, 7);
        spawn_building(&mut state, BuildingKind::PowerPlant, 3, 3);
        spawn_building(&mut state, BuildingKind::Residential, 4, 3);
        state.stats.population = 25;
        refresh_derived_stats(&mut state, &content);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let camera = serde_json::json!({"position": [1.0, 2.0, 3.0]});
        save_snapshot(&path, &state, Some(camera.clone())).unwrap();

        // Loading re-derives stats; mirror that on the original for the
        // comparison, since derived values are not a fixpoint of refresh.
        let mut expected = state.clone();
        refresh_derived_stats(&mut expected, &content);

        let (restored, restored_camera) = load_snapshot(&path, &content, 99);
        assert_eq!(restored.meta.seed, 7, "loaded, not regenerated");
        assert_eq!(restored.stats, expected.stats);
        assert_eq!(restored.buildings.len(), 2);
        assert_eq!(restored_camera, Some(camera));
    }

    #[test]
    fn missing_snapshot_falls_back_to_fresh_state() {
        let content = default_content();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");

        let (state, camera) = load_snapshot(&path, &content, 11);
        assert_eq!(state.meta.seed, 11);
        assert!(state.buildings.is_empty());
        assert!(camera.is_none());
    }

    #[test]
    fn malformed_snapshot_falls_back_to_fresh_state() {
        let content = default_content();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (state, _) = load_snapshot(&path, &content, 11);
        assert!(state.buildings.is_empty());
        assert_eq!(state.stats.funds, 50_000);
    }

    #[test]
    fn loaded_snapshot_recomputes_derived_stats() {
        let content = default_content();
        let mut state = build_initial_state(&content, 7);
        spawn_building(&mut state, BuildingKind::Residential, 4, 3);

        // Poison the stored derived fields; load must not trust them.
        state.stats.power_demand = 9999;
        state.stats.happiness = 1;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        save_snapshot(&path, &state, None).unwrap();

        let (restored, _) = load_snapshot(&path, &content, 7);
        assert_eq!(restored.stats.power_demand, 5);
        assert_ne!(restored.stats.happiness, 1);
    }
}
