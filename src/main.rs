use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use toroidal_snake::config::SimulationConfig;
use toroidal_snake::error::SimulationError;
use toroidal_snake::input::{Direction, GameInput, InputHandler};
use toroidal_snake::renderer::{self, Overlay};
use toroidal_snake::simulation::Simulation;
use toroidal_snake::terminal_runtime::TerminalSession;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Upper bound on how long one input poll blocks, so the board keeps redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Chance per headless tick that a random direction is requested.
const HEADLESS_TURN_PROBABILITY: f64 = 0.25;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells.
    #[arg(long)]
    width: Option<u16>,

    /// Grid height in cells.
    #[arg(long)]
    height: Option<u16>,

    /// Simulation ticks per second.
    #[arg(long = "tick-rate")]
    tick_rate: Option<u32>,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many ticks with random input and print the final state as JSON.
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Write logs to this file. Interactive runs log nothing otherwise.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref(), cli.headless.is_some())?;

    let config = resolve_config(&cli)?;
    info!(
        width = config.grid.width,
        height = config.grid.height,
        tick_rate = config.tick_rate,
        "configuration resolved"
    );

    match cli.headless {
        Some(ticks) => run_headless(&config, cli.seed, ticks),
        None => run_interactive(&config, cli.seed),
    }
}

fn init_tracing(log_file: Option<&Path>, headless: bool) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("toroidal_snake=info"));

    if let Some(path) = log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SimulationConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load_from_path(path)?,
        None => SimulationConfig::load()?,
    };

    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    if let Some(tick_rate) = cli.tick_rate {
        config.tick_rate = tick_rate;
    }

    config.validate()?;
    Ok(config)
}

fn new_simulation(
    config: &SimulationConfig,
    seed: Option<u64>,
) -> Result<Simulation, SimulationError> {
    match seed {
        Some(seed) => Simulation::new_with_seed(config, seed),
        None => Simulation::new(config),
    }
}

/// Runs one tick, starting a fresh simulation when the board is full.
fn advance(
    sim: &mut Simulation,
    direction: Option<Direction>,
    config: &SimulationConfig,
    seed: Option<u64>,
) -> Result<(), SimulationError> {
    match sim.tick(direction) {
        Ok(outcome) => {
            if outcome.collided() {
                info!(resets = sim.resets(), tick = sim.tick_count(), "snake reset");
            }
            Ok(())
        }
        Err(SimulationError::NoFreeCell { .. }) => {
            warn!(length = sim.snake().len(), "board filled, starting over");
            *sim = new_simulation(config, seed)?;
            Ok(())
        }
        Err(error) => Err(error),
    }
}

fn run_interactive(config: &SimulationConfig, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut session = TerminalSession::start()?;
    let mut input = InputHandler::new();
    let mut sim = new_simulation(config, seed)?;

    let tick_interval = config.tick_interval();
    let mut last_tick = Instant::now();
    let mut pending_direction = None;
    let mut paused = false;

    loop {
        session.draw(|frame| renderer::render(frame, &sim.state(), Overlay { paused }))?;

        let timeout = tick_interval
            .saturating_sub(last_tick.elapsed())
            .min(POLL_INTERVAL);
        match input.poll_input(timeout)? {
            Some(GameInput::Quit) => break,
            Some(GameInput::Pause) => paused = !paused,
            Some(GameInput::Direction(direction)) if !paused => {
                pending_direction = Some(direction);
            }
            _ => {}
        }

        if paused {
            last_tick = Instant::now();
            continue;
        }

        if last_tick.elapsed() >= tick_interval {
            last_tick = Instant::now();
            advance(&mut sim, pending_direction.take(), config, seed)?;
        }
    }

    info!(
        ticks = sim.tick_count(),
        resets = sim.resets(),
        "interactive session ended"
    );
    Ok(())
}

fn run_headless(
    config: &SimulationConfig,
    seed: Option<u64>,
    ticks: u64,
) -> Result<(), Box<dyn Error>> {
    let mut sim = new_simulation(config, seed)?;
    let mut input_rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    for _ in 0..ticks {
        let direction = input_rng
            .gen_bool(HEADLESS_TURN_PROBABILITY)
            .then(|| Direction::random(&mut input_rng));
        advance(&mut sim, direction, config, seed)?;
    }

    let snapshot = sim.state().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    info!(
        ticks = sim.tick_count(),
        resets = sim.resets(),
        length = sim.snake().len(),
        "headless run finished"
    );
    Ok(())
}
