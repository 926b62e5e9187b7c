//! Plinko Planner entry point
//!
//! Native demo: builds a board, solves a payout distribution, throws the
//! batch and ticks until every ball has landed.
//!
//! Usage: `plinko-planner [CONFIG] [--seed N] [--balls N] [--target N]`

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use plinko_planner::{BoardConfig, PlinkoError, SimEvent, Simulation, ThrowHistory, tick};

/// Ticks before the demo gives up waiting for the board to go idle
#[cfg(not(target_arch = "wasm32"))]
const MAX_TICKS: u32 = 100_000;

/// Throw a payout batch on a Plinko board and report where the balls land
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Parser)]
#[command(name = "plinko-planner", version, about)]
struct DemoArgs {
    /// Board config JSON (defaults are used when omitted)
    config: Option<PathBuf>,

    /// Seed for path planning and spawn jitter
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Balls to throw (defaults to the config's max_balls)
    #[arg(long)]
    balls: Option<usize>,

    /// Payout sum to aim for (defaults to the config's target_sum)
    #[arg(long)]
    target: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
fn run(args: DemoArgs) -> Result<(), PlinkoError> {
    let config = match &args.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    let balls = args.balls.unwrap_or(config.max_balls as usize);
    let target = args.target.unwrap_or(config.target_sum);

    let mut sim = Simulation::new(config, args.seed)?;
    println!("Bin values: {:?}", sim.bin_values());

    let (distribution, _) = sim.throw_for_payout(balls, target)?;
    println!(
        "Target {target} with {balls} balls -> {:?} (sum {}, exact {})",
        distribution.bins.iter().map(ToString::to_string).collect::<Vec<_>>(),
        distribution.achieved_sum,
        distribution.exact
    );

    let mut history = ThrowHistory::new();
    for _ in 0..MAX_TICKS {
        tick(&mut sim, 1.0);
        let events = sim.drain_events();
        for event in &events {
            match event {
                SimEvent::BallLanded {
                    ball,
                    bin,
                    multiplier,
                } => println!("{ball} landed in {bin} (x{multiplier})"),
                SimEvent::BallRemoved { ball, reason } => println!("{ball} removed: {reason:?}"),
                _ => {}
            }
        }
        history.record_events(&events, sim.time_ticks());
        if sim.is_idle() {
            break;
        }
    }

    println!(
        "{} balls landed after {} ticks, total multiplier {} (target {target})",
        history.landed,
        sim.time_ticks(),
        history.total
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let args = DemoArgs::parse();
    log::info!("Plinko Planner (native) starting...");

    if let Err(err) = run(args) {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the wasm surface; nothing to run here
}
