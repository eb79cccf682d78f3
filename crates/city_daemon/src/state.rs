use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;

use city_control::PlannerController;
use city_core::{CityContent, EventEnvelope, GameState};

pub struct SimState {
    pub game_state: GameState,
    pub content: CityContent,
    pub rng: ChaCha8Rng,
    pub planner: PlannerController,
}

pub type SharedSim = Arc<Mutex<SimState>>;
pub type EventTx = broadcast::Sender<Vec<EventEnvelope>>;

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSim,
    pub event_tx: EventTx,
    pub paused: Arc<AtomicBool>,
    pub months_per_sec: f64,
    /// Where POST /save writes; None disables saving.
    pub snapshot_path: Option<PathBuf>,
}
