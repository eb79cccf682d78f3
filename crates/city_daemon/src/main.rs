//! Long-running simulation daemon: tick + planner loops behind an HTTP API.

mod routes;
mod state;
mod tick_loop;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use city_control::{set_autonomy, PlannerController};
use city_world::{build_initial_state, default_content, load_content, load_snapshot};

use crate::state::{AppState, SimState};
use crate::tick_loop::{run_planner_loop, run_tick_loop};

#[derive(Parser)]
#[command(name = "city_daemon", about = "Grid City Simulation daemon")]
struct Args {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Seed for the fire subsystem's RNG. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated months advanced per wall-clock second.
    #[arg(long, default_value_t = 0.4)]
    months_per_sec: f64,
    /// Load catalog and constants from a content directory.
    #[arg(long)]
    content_dir: Option<String>,
    /// Snapshot file: loaded at boot when present, target of POST /save.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Start with the planner enabled.
    #[arg(long)]
    autonomy: bool,
    /// Start paused; resume via POST /resume.
    #[arg(long)]
    paused: bool,
    /// Stop ticking after this many simulated months.
    #[arg(long)]
    max_months: Option<u64>,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let content = match &args.content_dir {
        Some(dir) => load_content(dir)?,
        None => default_content(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut game_state = match &args.snapshot {
        Some(path) => load_snapshot(path, &content, seed).0,
        None => build_initial_state(&content, seed),
    };
    if args.autonomy {
        set_autonomy(&mut game_state, true);
    }
    let rng = ChaCha8Rng::seed_from_u64(game_state.meta.seed);

    tracing::info!(
        seed = game_state.meta.seed,
        month = game_state.stats.month,
        autonomy = game_state.planner.autonomy_enabled,
        "starting simulation daemon"
    );

    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let app_state = AppState {
        sim: Arc::new(parking_lot::Mutex::new(SimState {
            game_state,
            content,
            rng,
            planner: PlannerController,
        })),
        event_tx: event_tx.clone(),
        paused: Arc::new(AtomicBool::new(args.paused)),
        months_per_sec: args.months_per_sec,
        snapshot_path: args.snapshot.clone(),
    };

    tokio::spawn(run_tick_loop(
        app_state.sim.clone(),
        event_tx.clone(),
        app_state.paused.clone(),
        args.months_per_sec,
        args.max_months,
    ));
    tokio::spawn(run_planner_loop(
        app_state.sim.clone(),
        event_tx,
        app_state.paused.clone(),
        args.months_per_sec,
    ));

    let app = routes::make_router_with_cors(app_state, &args.cors_origin);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
