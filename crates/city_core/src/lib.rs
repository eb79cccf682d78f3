//! `city_core` — deterministic city simulation tick.
//!
//! No IO, no network. All randomness via the passed-in Rng.

mod actions;
mod catalog;
mod engine;
mod fire;
mod grid;
pub mod metrics;
mod types;

pub use actions::{
    apply_planner_actions, can_place_road, demolish_building, occupant_at, place_building,
    select_building, upgrade_building, ActionError,
};
pub use catalog::{
    default_content, effective_props, BuildingDef, BuildingKind, BuildingProps, CityContent,
    Constants, PropsPatch, UpgradeTier,
};
pub use engine::tick;
pub use grid::{completes_road_block, in_bounds, neighbors4, service_distance};
pub use metrics::{compute_metrics, refresh_derived_stats, DerivedMetrics};
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, month: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, month, event }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
