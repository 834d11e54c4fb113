//! Marble Race Headless Runner
//!
//! Runs a full race natively with Rapier physics and the recording scene,
//! pumping frames by hand, then reports the winner.
//!
//! Example:
//!   cargo run -p marble-headless -- --marbles 8 --seed 42

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use marble_core::{
    FinishCallback, HeadlessScene, HeadlessSurface, ManualFrames, Marble, RaceConfig, RaceState,
    RapierWorld, Roster, SceneEngine,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a marble race without a browser", long_about = None)]
struct Args {
    /// Number of marbles (1-10).
    #[arg(long, default_value_t = 5)]
    marbles: usize,
    /// Seed for obstacle placement.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON race config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Give up after this many frames.
    #[arg(long, default_value_t = 60 * 120)]
    max_frames: u64,
    /// Print the effective config as JSON and exit.
    #[arg(long)]
    dump_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outcome {
    winner: Option<usize>,
    frames: u64,
    lead: Option<usize>,
}

fn run_race(config: RaceConfig, marbles: &[Marble], max_frames: u64) -> Result<Outcome> {
    let frames = ManualFrames::new();
    let mut engine: SceneEngine<RapierWorld, HeadlessScene> =
        SceneEngine::new(config, frames.clone());

    let crossed = Rc::new(Cell::new(None));
    let sink = crossed.clone();
    let on_finish: FinishCallback = Box::new(move |index| sink.set(Some(index)));

    let surface = HeadlessSurface::new();
    engine
        .initialize_scene(&surface, marbles, Some(on_finish))
        .context("initialize scene")?;

    let mut race = RaceState::new();
    race.start();
    engine.start_race();

    while engine.frame_count() < max_frames && crossed.get().is_none() && frames.take() {
        engine.frame();
    }
    if let Some(index) = crossed.get() {
        race.finish(index);
    }

    let outcome = Outcome {
        winner: race.winner_index(),
        frames: engine.frame_count(),
        lead: engine.lead_index(),
    };
    engine.destroy();
    Ok(outcome)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RaceConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => RaceConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut roster = Roster::with_palette();
    roster.fill(args.marbles);
    tracing::info!(marbles = roster.len(), seed = ?config.seed, "starting race");

    let outcome = run_race(config, roster.marbles(), args.max_frames)?;
    match outcome.winner.and_then(|index| roster.get(index).map(|m| (index, m))) {
        Some((index, marble)) => tracing::info!(
            winner = index,
            name = %marble.name,
            color = %marble.color,
            frames = outcome.frames,
            "race finished"
        ),
        None => tracing::warn!(
            frames = outcome.frames,
            lead = ?outcome.lead,
            "no marble reached the finish line"
        ),
    }

    Ok(())
}
