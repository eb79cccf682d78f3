//! Player- and planner-facing actions: placement, demolition, upgrade,
//! selection, and the planner batch commit.
//!
//! Expected rule violations come back as [`ActionError`] values; a failed
//! action never mutates state.

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingKind, CityContent};
use crate::grid::{completes_road_block, in_bounds};
use crate::metrics::refresh_derived_stats;
use crate::types::{
    BuildingId, BuildingState, Event, EventEnvelope, FocusPoint, GameState, PlannedAction,
    Provenance, BASE_BUILDING_LEVEL, MAX_FIRE_HEALTH,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ActionError {
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },
    #[error("cell ({x}, {z}) is already occupied")]
    CellOccupied { x: i32, z: i32 },
    #[error("coordinate ({x}, {z}) is outside the grid")]
    InvalidCoordinate { x: i32, z: i32 },
    #[error("road would complete a 2x2 road block")]
    RoadBlockRuleViolation,
    #[error("no further upgrade available")]
    NoUpgradeAvailable,
    #[error("target not found")]
    TargetNotFound,
    #[error("target is on fire")]
    TargetOnFire,
    #[error("target has been destroyed")]
    TargetDestroyed,
}

pub fn occupant_at(state: &GameState, x: i32, z: i32) -> Option<&BuildingState> {
    state.buildings.values().find(|b| b.x == x && b.z == z)
}

/// Road rule against the live building set only. The planner layers its own
/// proposed roads on top via [`completes_road_block`] directly.
pub fn can_place_road(state: &GameState, x: i32, z: i32) -> bool {
    !completes_road_block(x, z, |cx, cz| {
        occupant_at(state, cx, cz).is_some_and(|b| b.kind == BuildingKind::Road)
    })
}

pub fn place_building(
    state: &mut GameState,
    content: &CityContent,
    kind: BuildingKind,
    x: i32,
    z: i32,
    origin: Provenance,
    events: &mut Vec<EventEnvelope>,
) -> Result<BuildingId, ActionError> {
    let c = &content.constants;
    if !in_bounds(x, z, c.grid_size) {
        return Err(ActionError::InvalidCoordinate { x, z });
    }
    if occupant_at(state, x, z).is_some() {
        return Err(ActionError::CellOccupied { x, z });
    }
    if kind == BuildingKind::Road && !can_place_road(state, x, z) {
        return Err(ActionError::RoadBlockRuleViolation);
    }
    let def = content.building(kind);
    if state.stats.funds < def.cost {
        if origin == Provenance::Player {
            let month = state.stats.month;
            events.push(crate::emit(
                &mut state.counters,
                month,
                Event::InsufficientFunds {
                    action: format!("build {}", def.name),
                    required: def.cost,
                    available: state.stats.funds,
                },
            ));
        }
        return Err(ActionError::InsufficientFunds {
            required: def.cost,
            available: state.stats.funds,
        });
    }

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
    state.stats.funds -= def.cost;

    let month = state.stats.month;
    events.push(crate::emit(
        &mut state.counters,
        month,
        Event::BuildingPlaced {
            building_id: id.clone(),
            kind,
            x,
            z,
            cost: def.cost,
        },
    ));

    // A player dropping a power plant while autonomy runs re-anchors the
    // planner's development focus there.
    if kind == BuildingKind::PowerPlant
        && origin == Provenance::Player
        && state.planner.autonomy_enabled
    {
        state.planner.focus = Some(FocusPoint {
            x,
            z,
            source: Provenance::Player,
        });
        state.planner.cooldown_months = 1;
        events.push(crate::emit(
            &mut state.counters,
            month,
            Event::FocusPointSet {
                x,
                z,
                source: Provenance::Player,
            },
        ));
    }

    refresh_derived_stats(state, content);
    Ok(id)
}

/// Removes the occupant of `(x, z)` and refunds 30% of its base cost, or
/// nothing if fire damage took it below half health. Rubble resolves here
/// too; demolition is the only way it leaves the collection.
pub fn demolish_building(
    state: &mut GameState,
    content: &CityContent,
    x: i32,
    z: i32,
    events: &mut Vec<EventEnvelope>,
) -> Result<i64, ActionError> {
    let Some(b) = occupant_at(state, x, z) else {
        return Err(ActionError::TargetNotFound);
    };
    let id = b.id.clone();
    let kind = b.kind;
    let fire_damaged = b.on_fire && b.fire_health < MAX_FIRE_HEALTH / 2;

    let def = content.building(kind);
    let refund = if fire_damaged { 0 } else { def.cost * 3 / 10 };

    state.buildings.remove(&id);
    state.stats.funds += refund;
    if state.selected.as_ref() == Some(&id) {
        state.selected = None;
    }

    let month = state.stats.month;
    events.push(crate::emit(
        &mut state.counters,
        month,
        Event::BuildingDemolished {
            building_id: id,
            kind,
            x,
            z,
            refund,
        },
    ));

    // Tearing down the focus anchor sends the planner back to general mode.
    if kind == BuildingKind::PowerPlant
        && state.planner.focus.is_some_and(|f| f.x == x && f.z == z)
    {
        state.planner.focus = None;
        events.push(crate::emit(&mut state.counters, month, Event::FocusPointCleared));
    }

    refresh_derived_stats(state, content);
    Ok(refund)
}

pub fn upgrade_building(
    state: &mut GameState,
    content: &CityContent,
    id: &BuildingId,
    origin: Provenance,
    events: &mut Vec<EventEnvelope>,
) -> Result<u32, ActionError> {
    let Some(b) = state.buildings.get(id) else {
        return Err(ActionError::TargetNotFound);
    };
    if b.is_burning() {
        return Err(ActionError::TargetOnFire);
    }
    if b.is_derelict() {
        return Err(ActionError::TargetDestroyed);
    }

    let def = content.building(b.kind);
    let kind = b.kind;
    let Some(tier) = def.next_upgrade(b.level) else {
        return Err(ActionError::NoUpgradeAvailable);
    };
    let cost = tier.cost;
    if state.stats.funds < cost {
        if origin == Provenance::Player {
            let month = state.stats.month;
            let action = format!("upgrade to {}", tier.name);
            events.push(crate::emit(
                &mut state.counters,
                month,
                Event::InsufficientFunds {
                    action,
                    required: cost,
                    available: state.stats.funds,
                },
            ));
        }
        return Err(ActionError::InsufficientFunds {
            required: cost,
            available: state.stats.funds,
        });
    }

    let mut level = 0;
    if let Some(b) = state.buildings.get_mut(id) {
        b.level += 1;
        level = b.level;
    }
    state.stats.funds -= cost;

    let month = state.stats.month;
    events.push(crate::emit(
        &mut state.counters,
        month,
        Event::BuildingUpgraded {
            building_id: id.clone(),
            kind,
            level,
            cost,
        },
    ));

    refresh_derived_stats(state, content);
    Ok(level)
}

/// Opens a building in the inspector, or clears the selection with `None`.
/// Rubble is not selectable.
pub fn select_building(
    state: &mut GameState,
    id: Option<&BuildingId>,
) -> Result<(), ActionError> {
    match id {
        None => {
            state.selected = None;
            Ok(())
        }
        Some(id) => {
            let Some(b) = state.buildings.get(id) else {
                return Err(ActionError::TargetNotFound);
            };
            if b.is_derelict() {
                return Err(ActionError::TargetDestroyed);
            }
            state.selected = Some(id.clone());
            Ok(())
        }
    }
}

/// Commits a planner batch against live state, one action at a time.
///
/// Funds or occupancy may have moved since planning, so every proposal is
/// re-validated here; a failing proposal is skipped silently rather than
/// aborting the batch. When the batch lands the city's first power plant at
/// `bootstrap_power`, that cell becomes the strategic focus point.
///
/// Returns the number of actions actually applied.
pub fn apply_planner_actions(
    state: &mut GameState,
    content: &CityContent,
    actions: &[PlannedAction],
    bootstrap_power: Option<(i32, i32)>,
    events: &mut Vec<EventEnvelope>,
) -> u32 {
    let mut applied = 0;
    for action in actions {
        match action {
            PlannedAction::Build { kind, x, z, reason } => {
                if place_building(state, content, *kind, *x, *z, Provenance::Planner, events)
                    .is_err()
                {
                    continue;
                }
                applied += 1;
                let month = state.stats.month;
                events.push(crate::emit(
                    &mut state.counters,
                    month,
                    Event::PlannerNote {
                        message: reason.clone(),
                    },
                ));
                if *kind == BuildingKind::PowerPlant && bootstrap_power == Some((*x, *z)) {
                    state.planner.focus = Some(FocusPoint {
                        x: *x,
                        z: *z,
                        source: Provenance::Planner,
                    });
                    events.push(crate::emit(
                        &mut state.counters,
                        month,
                        Event::FocusPointSet {
                            x: *x,
                            z: *z,
                            source: Provenance::Planner,
                        },
                    ));
                }
            }
            PlannedAction::Upgrade {
                building_id,
                reason,
            } => {
                if upgrade_building(state, content, building_id, Provenance::Planner, events)
                    .is_err()
                {
                    continue;
                }
                applied += 1;
                let month = state.stats.month;
                events.push(crate::emit(
                    &mut state.counters,
                    month,
                    Event::PlannerNote {
                        message: reason.clone(),
                    },
                ));
            }
        }
    }
    if actions.is_empty() {
        let month = state.stats.month;
        events.push(crate::emit(
            &mut state.counters,
            month,
            Event::PlannerNote {
                message: "no action required this turn".to_string(),
            },
        ));
    }
    applied
}
