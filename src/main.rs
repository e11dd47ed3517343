//! Mazebot - Entry Point
//!
//! Interactive shell around the demo simulation: advance ticks, watch
//! bot diagnostics, and inspect telemetry while the bots solve the
//! maze.

use std::io::{self, Write};

use mazebot::sim::{demo_runner, SimEvent, SimRunner};

/// Tick length used by the interactive loop, seconds
const DT: f32 = 0.1;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mazebot=info".into()),
        )
        .init();

    tracing::info!("Mazebot starting...");

    let mut runner = demo_runner(42);

    println!("\n=== MAZEBOT ===");
    println!("Headless maze-solving bot simulation");
    println!();
    println!("Commands:");
    println!("  tick / t        - Advance simulation by one tick");
    println!("  run <n>         - Run n simulation ticks");
    println!("  status / s      - Show bot diagnostics");
    println!("  events / e      - Show events since last check");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            break;
        }
        let mut parts = line.trim().split_whitespace();
        let command = parts.next().unwrap_or("");

        match command {
            "tick" | "t" => {
                runner.step(DT);
                print_events(&runner.drain_events());
            }
            "run" => {
                let n: u64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(10);
                runner.run(n, DT);
                print_events(&runner.drain_events());
                if runner.finished() {
                    println!("all bots escaped after {} ticks", runner.tick_count());
                }
            }
            "status" | "s" => print_status(&runner),
            "events" | "e" => print_events(&runner.drain_events()),
            "quit" | "q" => break,
            "" => {}
            other => println!("unknown command: {other}"),
        }
    }

    let stats = runner.telemetry_log().borrow().recovery_stats();
    println!(
        "recovery attempts: {} ({} succeeded, {} failed)",
        stats.attempts, stats.successes, stats.failures
    );
}

fn print_status(runner: &SimRunner) {
    println!("tick {}", runner.tick_count());
    for bot in runner.bots() {
        if runner.world().escaped().contains(&bot) {
            println!("--- bot {bot:?} --- escaped");
            continue;
        }
        if let Some(controller) = runner.controller(bot) {
            println!("--- bot {bot:?} ---");
            print!("{}", controller.diagnostic_text());
        }
    }
}

fn print_events(events: &[SimEvent]) {
    for event in events {
        match event {
            SimEvent::KeyPickedUp { bot, tick, .. } => {
                println!("[{tick}] bot {bot:?} picked up a key")
            }
            SimEvent::DoorOpened { bot, tick, .. } => {
                println!("[{tick}] bot {bot:?} opened a door")
            }
            SimEvent::ExitReached { bot, tick } => {
                println!("[{tick}] bot {bot:?} reached the exit")
            }
            SimEvent::StateChanged { bot, from, to, tick } => {
                println!("[{tick}] bot {bot:?}: {from} -> {to}")
            }
            SimEvent::ErrorReported { bot, kind, tick } => {
                println!("[{tick}] bot {bot:?} ERROR: {kind}")
            }
            SimEvent::Recovered { bot, kind, tick } => {
                println!("[{tick}] bot {bot:?} recovered from {kind}")
            }
        }
    }
}
