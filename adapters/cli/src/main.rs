#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Hordefall session.
//!
//! The session is driven by a scripted autopilot on a fixed frame clock and
//! ends when the frame budget runs out or the player falls. A short summary
//! is printed to standard output; logs go to standard error.

mod autopilot;
mod config;
mod effects;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use hordefall_core::{GamePhase, TITLE_BANNER};
use hordefall_simulation::Simulation;
use hordefall_world::query;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{autopilot::Autopilot, effects::LogEffects};

const DEFAULT_LOG_FILTER: &str = "hordefall=info";

#[derive(Debug, Parser)]
#[command(name = "hordefall", about = TITLE_BANNER)]
struct Cli {
    /// TOML tuning document; any subset of keys may be given.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Run seed, overriding the one in the tuning document.
    #[arg(long)]
    seed: Option<u64>,
    /// Frames to simulate before stopping.
    #[arg(long, default_value_t = 3600)]
    frames: u32,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,
}

/// Entry point for the Hordefall command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let tuning = config::load_tuning(cli.config.as_deref(), cli.seed)?;
    let seed = tuning.seed;
    let mut simulation = Simulation::new(tuning).context("failed to start simulation")?;
    let mut pilot = Autopilot::default();
    let mut effects = LogEffects::default();
    let frame = Duration::from_secs(1) / cli.fps;
    info!(seed, frames = cli.frames, fps = cli.fps, "starting headless run");

    let mut played = 0;
    for _ in 0..cli.frames {
        let input = pilot.next_input(simulation.phase());
        let outcome = simulation.frame(&input, frame, &mut effects);
        played += 1;
        if outcome.quit_requested || simulation.phase() == GamePhase::GameOver {
            break;
        }
    }

    let world = simulation.world();
    let progress = query::progress(world);
    println!("seed: {seed}");
    println!("frames: {played}");
    println!("simulated: {:.2}s", query::clock(world).as_secs_f32());
    println!("wave: {}", progress.wave);
    println!("kills: {}", progress.kills);
    println!("shots: {}", effects.shots);
    println!("bursts: {}", effects.bursts);
    println!(
        "outcome: {}",
        if progress.is_game_over() {
            "fallen"
        } else {
            "standing"
        }
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
