//! Fire outbreak, spread, and suppression.
//!
//! Per tick: burning buildings take damage and may receive suppression from
//! one covering fire station, damaged burners may ignite a 4-connected
//! neighbor, and standing flammable buildings may catch fire spontaneously.
//! Buildings are visited in sorted-id order so a seeded Rng reproduces the
//! exact same outbreak sequence.

use rand::Rng;

use crate::catalog::{effective_props, BuildingKind, CityContent};
use crate::grid::{neighbors4, service_distance};
use crate::types::{BuildingId, Event, EventEnvelope, GameState, MAX_FIRE_HEALTH};

/// One fire station's suppression budget for the current tick.
struct StationSlot {
    x: i32,
    z: i32,
    radius: f64,
    power: i32,
    capacity: u32,
    assigned: u32,
}

impl StationSlot {
    fn covers(&self, x: i32, z: i32) -> bool {
        self.assigned < self.capacity && service_distance(x, z, self.x, self.z) <= self.radius
    }
}

fn station_roster(
    ids: &[BuildingId],
    state: &GameState,
    content: &CityContent,
) -> Vec<StationSlot> {
    ids.iter()
        .filter_map(|id| {
            let b = &state.buildings[id];
            if b.kind != BuildingKind::FireStation || b.on_fire {
                return None;
            }
            let props = effective_props(content.building(b.kind), b.level);
            Some(StationSlot {
                x: b.x,
                z: b.z,
                radius: f64::from(props.fire_coverage_radius),
                power: props.fire_fighting_power,
                capacity: props.max_active_fires,
                assigned: 0,
            })
        })
        .collect()
}

#[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
pub(crate) fn advance_fires(
    state: &mut GameState,
    content: &CityContent,
    rng: &mut impl Rng,
    events: &mut Vec<EventEnvelope>,
) {
    let c = &content.constants;
    let month = state.stats.month;

    let mut ids: Vec<BuildingId> = state.buildings.keys().cloned().collect();
    ids.sort();

    let mut stations = station_roster(&ids, state, content);

    // --- Damage and suppression. Greedy first-fit: each burning building
    // takes at most one station's help, each station services at most its
    // concurrency limit.
    for id in &ids {
        let Some(b) = state.buildings.get(id) else {
            continue;
        };
        if !b.is_burning() {
            continue;
        }
        let (x, z, kind) = (b.x, b.z, b.kind);

        let mut fire_health = b.fire_health - c.fire_damage_rate;
        for station in &mut stations {
            if station.covers(x, z) {
                fire_health += station.power;
                station.assigned += 1;
                break;
            }
        }
        fire_health = fire_health.min(MAX_FIRE_HEALTH);

        let Some(b) = state.buildings.get_mut(id) else {
            continue;
        };
        if fire_health <= 0 {
            b.fire_health = 0;
            events.push(crate::emit(
                &mut state.counters,
                month,
                Event::BuildingDestroyed {
                    building_id: id.clone(),
                    kind,
                    x,
                    z,
                },
            ));
        } else {
            b.fire_health = fire_health;
        }
    }

    // --- Spread. A fire that has eaten below 70% health tries one roll, then
    // its neighbors in fixed order; the first flammable untouched occupant
    // catches.
    for id in &ids {
        let Some(b) = state.buildings.get(id) else {
            continue;
        };
        let spreads = b.is_burning() && f64::from(b.fire_health) < f64::from(MAX_FIRE_HEALTH) * 0.7;
        if !spreads {
            continue;
        }
        let rolled: f64 = rng.gen();
        if rolled >= c.fire_spread_chance {
            continue;
        }
        let (x, z) = (b.x, b.z);
        let from = id.clone();

        for (nx, nz) in neighbors4(x, z) {
            let target = state
                .buildings
                .values()
                .find(|t| t.x == nx && t.z == nz)
                .map(|t| t.id.clone());
            let Some(target_id) = target else {
                continue;
            };
            let target = &state.buildings[&target_id];
            if target.on_fire || !content.building(target.kind).flammable {
                continue;
            }
            let (tx, tz, tkind) = (target.x, target.z, target.kind);
            let Some(target) = state.buildings.get_mut(&target_id) else {
                continue;
            };
            target.on_fire = true;
            target.fire_health = MAX_FIRE_HEALTH - 1;
            events.push(crate::emit(
                &mut state.counters,
                month,
                Event::FireSpread {
                    from,
                    to: target_id,
                    kind: tkind,
                    x: tx,
                    z: tz,
                },
            ));
            break;
        }
    }

    // --- Fresh ignitions. Station coverage halves the odds, it does not
    // grant immunity. Derelicts keep their on-fire flag and never reignite.
    for id in &ids {
        let Some(b) = state.buildings.get(id) else {
            continue;
        };
        if b.on_fire || !content.building(b.kind).flammable {
            continue;
        }
        let rolled: f64 = rng.gen();
        if rolled >= c.fire_start_chance {
            continue;
        }
        let (x, z, kind) = (b.x, b.z, b.kind);
        let covered = stations.iter().any(|s| s.covers(x, z));
        let ignites = if covered {
            let damped: f64 = rng.gen();
            damped < c.fire_start_chance / 2.0
        } else {
            true
        };
        if !ignites {
            continue;
        }
        let Some(b) = state.buildings.get_mut(id) else {
            continue;
        };
        b.on_fire = true;
        b.fire_health = MAX_FIRE_HEALTH - 1;
        events.push(crate::emit(
            &mut state.counters,
            month,
            Event::FireIgnited {
                building_id: id.clone(),
                kind,
                x,
                z,
            },
        ));
    }
}
