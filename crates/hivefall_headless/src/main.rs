//! Headless Hivefall runner.
//!
//! Runs a combat scenario without graphics and prints a JSON summary.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in skirmish scenario
//! cargo run -p hivefall_headless
//!
//! # Run a scenario file for 60 simulated seconds
//! cargo run -p hivefall_headless -- --scenario scenarios/skirmish.ron --duration-secs 60
//! ```
//!
//! Logs go to stderr; the run summary goes to stdout as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hivefall_headless::{ScenarioConfig, World};

#[derive(Parser)]
#[command(name = "hivefall_headless")]
#[command(about = "Headless Hivefall combat runner for CI and balance testing")]
#[command(version)]
struct Cli {
    /// Scenario file (RON). Omit to run the built-in skirmish.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Override the scenario's simulated duration, in seconds.
    #[arg(long)]
    duration_secs: Option<f32>,

    /// Override the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(duration) = cli.duration_secs {
        scenario.duration_secs = duration;
    }
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }

    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        duration_secs = scenario.duration_secs,
        "starting run"
    );

    let tick_secs = (scenario.tick_ms / 1000.0) as f32;
    let total_ticks = (f64::from(scenario.duration_secs) / f64::from(tick_secs)).ceil() as u64;

    let mut world = World::from_scenario(scenario)?;
    for _ in 0..total_ticks {
        world.tick(tick_secs);
    }

    println!("{}", serde_json::to_string_pretty(world.summary())?);
    Ok(())
}
