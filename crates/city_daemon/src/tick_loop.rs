use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use city_control::run_planner_turn;
use city_core::EventLevel;

use crate::state::{EventTx, SharedSim, SimState};

/// Advances one simulated month per interval while not paused.
pub async fn run_tick_loop(
    sim: SharedSim,
    event_tx: EventTx,
    paused: Arc<AtomicBool>,
    months_per_sec: f64,
    max_months: Option<u64>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / months_per_sec));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let (events, done) = {
            let mut guard = sim.lock();
            let SimState {
                ref mut game_state,
                ref content,
                ref mut rng,
                ..
            } = *guard;
            let events = city_core::tick(game_state, content, rng, EventLevel::Normal);
            let done = max_months.is_some_and(|max| guard.game_state.stats.month >= max);
            (events, done)
        };

        let _ = event_tx.send(events);

        if done {
            tracing::info!("reached max months, stopping tick loop");
            break;
        }
    }
}

/// Checks the planner at twice the tick rate; the month-based cooldown and
/// the single-flight guard decide whether a turn actually runs.
pub async fn run_planner_loop(
    sim: SharedSim,
    event_tx: EventTx,
    paused: Arc<AtomicBool>,
    months_per_sec: f64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(0.5 / months_per_sec));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let events = {
            let mut guard = sim.lock();
            let ready = guard.game_state.planner.autonomy_enabled
                && guard.game_state.planner.cooldown_months == 0
                && !guard.game_state.planner.busy;
            if !ready {
                continue;
            }
            let SimState {
                ref mut game_state,
                ref content,
                ref mut planner,
                ..
            } = *guard;
            let mut events = Vec::new();
            run_planner_turn(planner, game_state, content, &mut events);
            events
        };

        if !events.is_empty() {
            let _ = event_tx.send(events);
        }
    }
}
