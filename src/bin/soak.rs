//! Soak runner - many bots, long runs, telemetry summary
//!
//! Builds a larger maze than the demo, runs every bot to the exit (or
//! until the tick budget runs out) and reports what the error-recovery
//! machinery did along the way. Events can be dumped as JSON lines for
//! offline analysis.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use mazebot::core::config::BotConfig;
use mazebot::core::types::Vec3;
use mazebot::sim::{MazeGrid, MazeWorld, SimEvent, SimRunner};
use mazebot::world::{DoorMask, KeySignature};

#[derive(Parser, Debug)]
#[command(name = "soak", about = "Run a multi-bot maze soak test")]
struct Args {
    /// Number of bots to spawn
    #[arg(long, default_value_t = 4)]
    bots: usize,

    /// Maximum number of ticks to run
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,

    /// Tick length in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// World generation seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Optional bot config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write simulation events as JSON lines
    #[arg(long)]
    events_out: Option<PathBuf>,
}

fn main() -> mazebot::core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mazebot=warn".into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BotConfig::load_from_file(path)?,
        None => BotConfig::default(),
    };

    let mut runner = soak_runner(args.seed, args.bots, config);
    runner.run(args.ticks, args.dt);

    let events = runner.drain_events();
    print_summary(&runner, &events);

    if let Some(path) = &args.events_out {
        let mut out = BufWriter::new(File::create(path)?);
        for event in &events {
            serde_json::to_writer(&mut out, event)?;
            out.write_all(b"\n")?;
        }
        let log = runner.telemetry_log();
        for record in &log.borrow().errors {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// Three chambers separated by walls, a doorway through each, keys
/// scattered in the first chamber and the exit in the last.
fn soak_runner(seed: u64, bots: usize, config: BotConfig) -> SimRunner {
    let mut grid = MazeGrid::new(30, 30, 100.0);
    for x in 1..29 {
        if x != 8 {
            grid.set_wall(x, 10);
        }
        if x != 22 {
            grid.set_wall(x, 20);
        }
    }

    let mut world = MazeWorld::new(grid, seed);
    let first_doorway = world.grid().center_of(8, 10);
    let second_doorway = world.grid().center_of(22, 20);
    world.add_door(DoorMask(0b0001), first_doorway);
    world.add_door(DoorMask(0b0110), second_doorway);
    world.add_key("brass", KeySignature(0b0001), Vec3::new(550.0, 650.0, 0.0));
    world.add_key("iron", KeySignature(0b0010), Vec3::new(2350.0, 350.0, 0.0));
    world.add_key("silver", KeySignature(0b0100), Vec3::new(1450.0, 1550.0, 0.0));
    world.add_exit(Vec3::new(1550.0, 2650.0, 0.0));

    let mut runner = SimRunner::new(world);
    for i in 0..bots {
        let offset = (i as f32) * 150.0;
        runner.spawn_bot(Vec3::new(250.0 + offset, 250.0, 0.0), config.clone());
    }
    runner
}

fn print_summary(runner: &SimRunner, events: &[SimEvent]) {
    let keys = events
        .iter()
        .filter(|e| matches!(e, SimEvent::KeyPickedUp { .. }))
        .count();
    let doors = events
        .iter()
        .filter(|e| matches!(e, SimEvent::DoorOpened { .. }))
        .count();
    let exits = events
        .iter()
        .filter(|e| matches!(e, SimEvent::ExitReached { .. }))
        .count();
    let errors = events
        .iter()
        .filter(|e| matches!(e, SimEvent::ErrorReported { .. }))
        .count();

    println!("ticks run:          {}", runner.tick_count());
    println!("bots escaped:       {}/{}", exits, runner.bots().len());
    println!("keys picked up:     {keys}");
    println!("doors opened:       {doors}");
    println!("errors reported:    {errors}");

    let stats = runner.telemetry_log().borrow().recovery_stats();
    println!(
        "recovery attempts:  {} ({} succeeded, {} failed)",
        stats.attempts, stats.successes, stats.failures
    );
}
