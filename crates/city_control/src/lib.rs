//! Rule-based autonomous planner.
//!
//! `PlannerController` reads the live state and the latest metrics and drafts
//! a bounded batch of build/upgrade proposals through a [`PlanningDraft`]:
//! reserved funds and provisional occupancy are tracked locally, nothing is
//! committed until [`run_planner_turn`] re-validates each proposal against
//! the real state through the same action paths a player uses.

use ahash::AHashSet;

use city_core::{
    apply_planner_actions, completes_road_block, compute_metrics, in_bounds, neighbors4,
    BuildingKind, BuildingState, CityContent, EventEnvelope, GameState, PlannedAction,
};

pub trait ActionSource {
    fn plan(&mut self, state: &GameState, content: &CityContent) -> PlanTurn;
}

/// The outcome of one planning pass: proposals in commit order, plus the
/// cell of the city's first power plant when this batch bootstraps one (the
/// commit path turns that cell into the strategic focus point).
#[derive(Debug, Clone, Default)]
pub struct PlanTurn {
    pub actions: Vec<PlannedAction>,
    pub bootstrap_power: Option<(i32, i32)>,
}

/// Drafts proposals:
/// 1. Bootstrap power, water, and a connecting road if no power source exists.
/// 2. Extend roads (or housing) around the focus point.
/// 3. Connect a road-less building to the network.
/// 4. React to the first unmet need: power, water, housing, jobs, happiness.
/// 5. Upgrade the lowest-level upgradable building.
pub struct PlannerController;

// ---------------------------------------------------------------------------
// Planning draft
// ---------------------------------------------------------------------------

/// Simulated funds, proposed actions, and provisional occupancy for one
/// planning pass. Proposal helpers decline (returning `false`) instead of
/// erroring; the draft is never partially applied.
struct PlanningDraft<'a> {
    state: &'a GameState,
    content: &'a CityContent,
    reserved_funds: i64,
    actions: Vec<PlannedAction>,
    occupied: AHashSet<(i32, i32)>,
    real_roads: AHashSet<(i32, i32)>,
    proposed_roads: AHashSet<(i32, i32)>,
    bootstrap_power: Option<(i32, i32)>,
}

impl<'a> PlanningDraft<'a> {
    fn new(state: &'a GameState, content: &'a CityContent) -> Self {
        let occupied = state.buildings.values().map(|b| (b.x, b.z)).collect();
        let real_roads = state
            .buildings
            .values()
            .filter(|b| b.kind == BuildingKind::Road)
            .map(|b| (b.x, b.z))
            .collect();
        Self {
            state,
            content,
            reserved_funds: state.stats.funds,
            actions: Vec::new(),
            occupied,
            real_roads,
            proposed_roads: AHashSet::new(),
            bootstrap_power: None,
        }
    }

    fn full(&self) -> bool {
        self.actions.len() >= self.content.constants.planner_max_actions_per_turn
    }

    fn is_road(&self, x: i32, z: i32) -> bool {
        self.real_roads.contains(&(x, z)) || self.proposed_roads.contains(&(x, z))
    }

    /// A road candidate that is in bounds, unoccupied by live buildings, and
    /// does not complete a 2x2 block against real or proposed roads.
    fn road_candidate_ok(&self, x: i32, z: i32) -> bool {
        in_bounds(x, z, self.content.constants.grid_size)
            && !self
                .state
                .buildings
                .values()
                .any(|b| b.x == x && b.z == z)
            && !completes_road_block(x, z, |cx, cz| self.is_road(cx, cz))
    }

    fn try_build(&mut self, kind: BuildingKind, x: i32, z: i32, reason: &str) -> bool {
        if self.full() {
            return false;
        }
        if !in_bounds(x, z, self.content.constants.grid_size) {
            return false;
        }
        if self.occupied.contains(&(x, z)) {
            return false;
        }
        let def = self.content.building(kind);
        if self.reserved_funds < def.cost {
            return false;
        }
        if kind == BuildingKind::Road && completes_road_block(x, z, |cx, cz| self.is_road(cx, cz))
        {
            return false;
        }

        self.actions.push(PlannedAction::Build {
            kind,
            x,
            z,
            reason: reason.to_string(),
        });
        self.reserved_funds -= def.cost;
        self.occupied.insert((x, z));
        if kind == BuildingKind::Road {
            self.proposed_roads.insert((x, z));
        }
        if kind == BuildingKind::PowerPlant
            && self.state.planner.focus.is_none()
            && self.bootstrap_power.is_none()
        {
            self.bootstrap_power = Some((x, z));
        }
        true
    }

    fn try_upgrade(&mut self, building: &BuildingState, reason: &str) -> bool {
        if self.full() || building.is_burning() || building.is_derelict() {
            return false;
        }
        let def = self.content.building(building.kind);
        let Some(tier) = def.next_upgrade(building.level) else {
            return false;
        };
        if self.reserved_funds < tier.cost {
            return false;
        }
        self.actions.push(PlannedAction::Upgrade {
            building_id: building.id.clone(),
            reason: reason.to_string(),
        });
        self.reserved_funds -= tier.cost;
        true
    }
}

// ---------------------------------------------------------------------------
// Candidate enumeration
// ---------------------------------------------------------------------------

/// Unoccupied cells ordered nearest-first around `anchor`, row-major on ties.
fn empty_cells(
    state: &GameState,
    grid_size: i32,
    anchor: (i32, i32),
    limit: usize,
) -> Vec<(i32, i32)> {
    let occupied: AHashSet<(i32, i32)> = state.buildings.values().map(|b| (b.x, b.z)).collect();
    let mut cells = Vec::new();
    for x in 0..grid_size {
        for z in 0..grid_size {
            if !occupied.contains(&(x, z)) {
                cells.push((x, z));
            }
        }
    }
    let (ax, az) = anchor;
    cells.sort_by_key(|&(x, z)| {
        let dx = i64::from(x - ax);
        let dz = i64::from(z - az);
        dx * dx + dz * dz
    });
    cells.truncate(limit);
    cells
}

/// Buildings in id order, for deterministic scans.
fn sorted_buildings(state: &GameState) -> Vec<&BuildingState> {
    let mut buildings: Vec<&BuildingState> = state.buildings.values().collect();
    buildings.sort_by(|a, b| a.id.cmp(&b.id));
    buildings
}

/// True when the building touches a road along one axis at distance <= 1.
fn road_connected(building: &BuildingState, roads: &AHashSet<(i32, i32)>) -> bool {
    roads.iter().any(|&(rx, rz)| {
        ((rx - building.x).abs() <= 1 && rz == building.z)
            || ((rz - building.z).abs() <= 1 && rx == building.x)
    })
}

// ---------------------------------------------------------------------------
// PlannerController
// ---------------------------------------------------------------------------

impl ActionSource for PlannerController {
    #[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
    fn plan(&mut self, state: &GameState, content: &CityContent) -> PlanTurn {
        let c = &content.constants;
        if state.stats.funds < c.planner_min_funds_to_act {
            return PlanTurn::default();
        }

        let metrics = compute_metrics(&state.buildings, &state.stats, content);
        let mut draft = PlanningDraft::new(state, content);

        let mid = c.grid_size / 2;
        let focus = state.planner.focus.map(|f| (f.x, f.z));
        let anchor = focus.unwrap_or((mid, mid));
        let empty = empty_cells(state, c.grid_size, anchor, c.planner_candidate_cell_limit * 2);

        // Priority 1: bootstrap. No functioning power source means nothing
        // else matters yet.
        let has_power = state
            .buildings
            .values()
            .any(|b| b.kind == BuildingKind::PowerPlant && !b.is_derelict());
        if !has_power && !draft.full() {
            let target = empty
                .iter()
                .copied()
                .find(|&(x, z)| x > mid - 5 && x < mid + 5 && z > mid - 5 && z < mid + 5)
                .or_else(|| empty.first().copied());
            if let Some((px, pz)) = target {
                if draft.try_build(BuildingKind::PowerPlant, px, pz, "initial power supply") {
                    if let Some(&(wx, wz)) = empty.get(1) {
                        if draft.try_build(BuildingKind::WaterTower, wx, wz, "initial water supply")
                        {
                            for (rx, rz) in neighbors4(px, pz) {
                                if draft.try_build(
                                    BuildingKind::Road,
                                    rx,
                                    rz,
                                    "road link for the power plant",
                                ) {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }

        // Priority 2: develop around the focus point.
        if let Some((fx, fz)) = focus {
            if has_power && !draft.full() {
                let focus_cells = empty_cells(state, c.grid_size, (fx, fz), 10);
                if let Some(&(x0, z0)) = focus_cells.first() {
                    if !draft.try_build(BuildingKind::Road, x0, z0, "road extension near focus")
                    {
                        if let Some(&(x1, z1)) = focus_cells.get(1) {
                            draft.try_build(
                                BuildingKind::Residential,
                                x1,
                                z1,
                                "housing near focus",
                            );
                        }
                    }
                }
            }
        }

        // Priority 3: reconnect one road-less building, first found wins.
        if !draft.full() {
            for building in sorted_buildings(state) {
                if building.kind == BuildingKind::Road || building.is_burning() {
                    continue;
                }
                if road_connected(building, &draft.real_roads) {
                    continue;
                }
                let candidate = neighbors4(building.x, building.z)
                    .into_iter()
                    .find(|&(nx, nz)| draft.road_candidate_ok(nx, nz));
                if let Some((nx, nz)) = candidate {
                    let reason = format!(
                        "road link for {}",
                        content.building(building.kind).name
                    );
                    if draft.try_build(BuildingKind::Road, nx, nz, &reason) {
                        break;
                    }
                }
            }
        }

        // Priority 4: reactive needs, first triggered branch claims the turn.
        if !draft.full() {
            let population = f64::from(state.stats.population);
            let power_short =
                f64::from(metrics.power_capacity) < f64::from(metrics.power_demand) * 1.2;
            let water_short =
                f64::from(metrics.water_capacity) < f64::from(metrics.water_demand) * 1.2;
            if power_short && !empty.is_empty() {
                draft.try_build(
                    BuildingKind::PowerPlant,
                    empty[0].0,
                    empty[0].1,
                    "power shortfall",
                );
            } else if water_short && !empty.is_empty() {
                let (wx, wz) = empty[1.min(empty.len() - 1)];
                draft.try_build(BuildingKind::WaterTower, wx, wz, "water shortfall");
            } else if population >= f64::from(metrics.total_residential_capacity) * 0.85
                && state.stats.happiness > 45
                && !empty.is_empty()
            {
                draft.try_build(
                    BuildingKind::Residential,
                    empty[0].0,
                    empty[0].1,
                    "housing shortage",
                );
            } else if population > f64::from(metrics.total_jobs) * 1.15 && !empty.is_empty() {
                draft.try_build(
                    BuildingKind::Commercial,
                    empty[0].0,
                    empty[0].1,
                    "job shortage",
                );
            } else if state.stats.happiness < 60 && !empty.is_empty() {
                draft.try_build(BuildingKind::Park, empty[0].0, empty[0].1, "raise happiness");
            }
        }

        // Priority 5: upgrade the lowest-level building that still has tiers.
        if !draft.full() {
            let mut upgradable: Vec<&BuildingState> = state
                .buildings
                .values()
                .filter(|b| {
                    !b.is_burning()
                        && !b.is_derelict()
                        && content.building(b.kind).next_upgrade(b.level).is_some()
                })
                .collect();
            upgradable.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.id.cmp(&b.id)));

            if let Some(building) = upgradable.first() {
                let reason = if building.kind == BuildingKind::PowerPlant
                    && f64::from(metrics.power_capacity) < f64::from(metrics.power_demand) * 1.3
                {
                    "expand power production"
                } else if building.kind == BuildingKind::Residential
                    && f64::from(state.stats.population)
                        >= f64::from(metrics.total_residential_capacity) * 0.9
                {
                    "expand housing capacity"
                } else {
                    "general improvement"
                };
                draft.try_upgrade(building, reason);
            }
        }

        PlanTurn {
            actions: draft.actions,
            bootstrap_power: draft.bootstrap_power,
        }
    }
}

// ---------------------------------------------------------------------------
// Turn orchestration
// ---------------------------------------------------------------------------

/// One full planner turn against live state: plan, commit with re-validation
/// (failed proposals are skipped), then reset the cooldown. Rejected outright
/// while a previous turn is still in flight.
///
/// Returns the number of actions actually applied.
pub fn run_planner_turn(
    planner: &mut impl ActionSource,
    state: &mut GameState,
    content: &CityContent,
    events: &mut Vec<EventEnvelope>,
) -> u32 {
    if state.planner.busy {
        return 0;
    }
    state.planner.busy = true;
    let turn = planner.plan(state, content);
    let applied =
        apply_planner_actions(state, content, &turn.actions, turn.bootstrap_power, events);
    state.planner.cooldown_months = content.constants.planner_cooldown_months;
    state.planner.busy = false;
    applied
}

/// Toggles autonomy. Disabling forcibly clears the in-flight guard and the
/// focus point; enabling primes the cooldown so the planner acts on the next
/// cycle.
pub fn set_autonomy(state: &mut GameState, enabled: bool) {
    state.planner.autonomy_enabled = enabled;
    if enabled {
        state.planner.cooldown_months = 1;
    } else {
        state.planner.busy = false;
        state.planner.focus = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
