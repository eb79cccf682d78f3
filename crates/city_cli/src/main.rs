use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

use city_control::{run_planner_turn, set_autonomy, PlannerController};
use city_core::{tick, Event, EventLevel, GameState};
use city_world::{build_initial_state, default_content, load_content, load_snapshot, save_snapshot};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "city_cli", about = "Grid City Simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation for a fixed number of months.
    Run {
        #[arg(long)]
        months: u64,
        /// Seed for the fire subsystem's RNG. Random if omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Load catalog and constants from a content directory instead of
        /// the built-in defaults.
        #[arg(long)]
        content_dir: Option<String>,
        /// Let the planner develop the city on its own cadence.
        #[arg(long)]
        autonomy: bool,
        #[arg(long, default_value_t = 12)]
        print_every: u64,
        /// Resume from this snapshot if it exists.
        #[arg(long)]
        load: Option<PathBuf>,
        /// Write a snapshot here when the run ends.
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long, default_value = "normal", value_parser = ["normal", "debug"])]
        event_level: String,
    },
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn run(
    months: u64,
    seed: Option<u64>,
    content_dir: Option<&str>,
    autonomy: bool,
    print_every: u64,
    load: Option<&PathBuf>,
    save: Option<&PathBuf>,
    event_level: EventLevel,
) -> Result<()> {
    let content = match content_dir {
        Some(dir) => load_content(dir)?,
        None => default_content(),
    };

    let resolved_seed = seed.unwrap_or_else(rand::random);
    let mut state = match load {
        Some(path) => load_snapshot(path, &content, resolved_seed).0,
        None => build_initial_state(&content, resolved_seed),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(state.meta.seed);

    if autonomy {
        set_autonomy(&mut state, true);
    }
    let mut planner = PlannerController;

    println!(
        "Starting simulation: months={months} seed={} autonomy={} content_version={}",
        state.meta.seed, autonomy, content.content_version,
    );
    println!("{}", "-".repeat(80));

    for _ in 0..months {
        if state.planner.autonomy_enabled && state.planner.cooldown_months == 0 {
            let mut events = Vec::new();
            run_planner_turn(&mut planner, &mut state, &content, &mut events);
            print_notable_events(&events);
        }

        let events = tick(&mut state, &content, &mut rng, event_level);
        print_notable_events(&events);

        if state.stats.month % print_every == 0 {
            print_status(&state);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at month {}:", state.stats.month);
    print_status(&state);

    if let Some(path) = save {
        save_snapshot(path, &state, None)
            .with_context(|| format!("saving snapshot: {}", path.display()))?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn print_notable_events(events: &[city_core::EventEnvelope]) {
    for envelope in events {
        match &envelope.event {
            Event::FireIgnited { kind, x, z, .. } => {
                println!("*** FIRE: {kind:?} at ({x}, {z}) is burning ***");
            }
            Event::FireSpread { kind, x, z, .. } => {
                println!("*** FIRE SPREAD: now burning {kind:?} at ({x}, {z}) ***");
            }
            Event::BuildingDestroyed { kind, x, z, .. } => {
                println!("*** DESTROYED: {kind:?} at ({x}, {z}) burned down ***");
            }
            Event::PlannerNote { message } => {
                println!("planner: {message}");
            }
            Event::FocusPointSet { x, z, source } => {
                println!("planner: focus point set to ({x}, {z}) by {source:?}");
            }
            _ => {}
        }
    }
}

fn print_status(state: &GameState) {
    let s = &state.stats;
    println!(
        "[month={month:04}]  pop={pop:5}  funds={funds:8}  happy={happy:3}  \
         power={pd}/{pc}  water={wd}/{wc}  health={health:3}  safety={safety:3}  \
         edu={edu:3}  pollution={poll:3}  appeal={appeal:3}  tourists={tourists:4}  \
         buildings={buildings}",
        month = s.month,
        pop = s.population,
        funds = s.funds,
        happy = s.happiness,
        pd = s.power_demand,
        pc = s.power_capacity,
        wd = s.water_demand,
        wc = s.water_capacity,
        health = s.health_level,
        safety = s.safety_level,
        edu = s.education_level,
        poll = s.pollution_level,
        appeal = s.appeal,
        tourists = s.tourists,
        buildings = state.buildings.len(),
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            months,
            seed,
            content_dir,
            autonomy,
            print_every,
            load,
            save,
            event_level,
        } => {
            let level = match event_level.as_str() {
                "debug" => EventLevel::Debug,
                _ => EventLevel::Normal,
            };
            run(
                months,
                seed,
                content_dir.as_deref(),
                autonomy,
                print_every,
                load.as_ref(),
                save.as_ref(),
                level,
            )?;
        }
    }
    Ok(())
}
