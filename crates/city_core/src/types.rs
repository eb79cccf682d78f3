//! Type definitions for `city_core`.
//!
//! All public state, event, and ID types used by the simulation.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::BuildingKind;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(BuildingId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Core enums and constants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Normal,
    Debug,
}

/// Who initiated an action or designated a focus point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Player,
    Planner,
}

pub const MAX_FIRE_HEALTH: i32 = 100;
pub const BASE_BUILDING_LEVEL: u32 = 1;

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    pub buildings: HashMap<BuildingId, BuildingState>,
    pub stats: CityStats,
    /// Per-month stat snapshots, oldest first. Bounded by
    /// `Constants::history_capacity`; the tick evicts from the front.
    pub history: VecDeque<CityStats>,
    /// Building currently open in the inspector, if any.
    pub selected: Option<BuildingId>,
    pub planner: PlannerState,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    pub seed: u64,
    pub schema_version: u32,
    pub content_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_building_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingState {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub x: i32,
    pub z: i32,
    /// Upgrade level, starting at [`BASE_BUILDING_LEVEL`], capped at
    /// `1 + upgrades.len()` for the kind.
    pub level: u32,
    pub on_fire: bool,
    /// 0..=100. Zero with `on_fire` set means rubble: the instance stays in
    /// the collection until demolished.
    pub fire_health: i32,
}

impl BuildingState {
    pub fn is_burning(&self) -> bool {
        self.on_fire && self.fire_health > 0
    }

    pub fn is_derelict(&self) -> bool {
        self.on_fire && self.fire_health <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityStats {
    /// Simulated month counter, +1 per tick.
    pub month: u64,
    pub population: u32,
    /// May go negative; debt feeds back into happiness.
    pub funds: i64,
    pub power_capacity: u32,
    pub power_demand: u32,
    pub water_capacity: u32,
    pub water_demand: u32,
    pub happiness: i32,
    pub health_level: i32,
    pub safety_level: i32,
    pub education_level: i32,
    pub pollution_level: i32,
    pub appeal: i32,
    pub tourists: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: i32,
    pub z: i32,
    pub source: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerState {
    pub autonomy_enabled: bool,
    /// Simulated months until the planner may act again. Decremented by the
    /// tick, reset after every planner turn.
    pub cooldown_months: u32,
    /// Single-flight guard: a planner turn refuses to start while another is
    /// still marked in-flight.
    pub busy: bool,
    pub focus: Option<FocusPoint>,
}

// ---------------------------------------------------------------------------
// Planner proposal types
// ---------------------------------------------------------------------------

/// A not-yet-committed planner proposal. Validated against simulated funds
/// and occupancy at planning time, and re-validated against live state at
/// commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedAction {
    Build {
        kind: BuildingKind,
        x: i32,
        z: i32,
        reason: String,
    },
    Upgrade {
        building_id: BuildingId,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub month: u64,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BuildingPlaced {
        building_id: BuildingId,
        kind: BuildingKind,
        x: i32,
        z: i32,
        cost: i64,
    },
    BuildingUpgraded {
        building_id: BuildingId,
        kind: BuildingKind,
        level: u32,
        cost: i64,
    },
    BuildingDemolished {
        building_id: BuildingId,
        kind: BuildingKind,
        x: i32,
        z: i32,
        refund: i64,
    },
    FireIgnited {
        building_id: BuildingId,
        kind: BuildingKind,
        x: i32,
        z: i32,
    },
    FireSpread {
        from: BuildingId,
        to: BuildingId,
        kind: BuildingKind,
        x: i32,
        z: i32,
    },
    BuildingDestroyed {
        building_id: BuildingId,
        kind: BuildingKind,
        x: i32,
        z: i32,
    },
    MonthlyReport {
        income: i64,
        expense: i64,
        net: i64,
    },
    InsufficientFunds {
        action: String,
        required: i64,
        available: i64,
    },
    FocusPointSet {
        x: i32,
        z: i32,
        source: Provenance,
    },
    FocusPointCleared,
    PlannerNote {
        message: String,
    },
    /// Only emitted at `EventLevel::Debug`.
    PopulationFlow {
        growth: i64,
        departure: i64,
        applied: i64,
    },
}
