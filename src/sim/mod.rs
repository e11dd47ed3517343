//! Stubbed collaborators and the headless simulation bench
//!
//! Everything a controller needs to run outside an engine: an
//! in-memory maze world, recording sensor/decision stubs, and a runner
//! that drives multiple bots to completion.

pub mod maze;
pub mod runner;
pub mod stubs;

pub use maze::{MazeGrid, MazeWorld, BOT_SPEED, INTERACTION_RANGE};
pub use runner::{SimEvent, SimRunner};
pub use stubs::{RecordingSensorRig, ScriptedDecision};

use crate::core::config::BotConfig;
use crate::core::types::Vec3;
use crate::world::{DoorMask, KeySignature};

/// A small demo scenario: one key, one matching door across a dividing
/// wall, and an exit behind it.
///
/// Layout (20x20 cells of 100 units): a wall splits the maze at row 10
/// with a single doorway; the key lies on the near side, the exit on
/// the far side.
pub fn demo_runner(seed: u64) -> SimRunner {
    let mut grid = MazeGrid::new(20, 20, 100.0);
    for x in 1..19 {
        if x != 10 {
            grid.set_wall(x, 10);
        }
    }

    let mut world = MazeWorld::new(grid, seed);
    let doorway = world.grid().center_of(10, 10);
    world.add_door(DoorMask(0b0001), doorway);
    world.add_key("brass", KeySignature(0b0001), Vec3::new(450.0, 450.0, 0.0));
    world.add_exit(Vec3::new(1050.0, 1750.0, 0.0));

    let mut runner = SimRunner::new(world);
    runner.spawn_bot(Vec3::new(250.0, 250.0, 0.0), BotConfig::default());
    runner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AiState;

    #[test]
    fn test_demo_bot_escapes_the_maze() {
        let mut runner = demo_runner(42);
        runner.run(4000, 0.1);
        assert!(runner.finished(), "bot should escape within the tick budget");
        assert!(runner
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::KeyPickedUp { .. })));
        assert!(runner
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::DoorOpened { .. })));
        assert!(runner
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::ExitReached { .. })));
    }

    #[test]
    fn test_key_carrier_with_open_path_still_escapes() {
        use crate::world::WorldQuery;

        // a carrier dropped back into Exploring (as the stuck handler
        // and watchdog do) with every matching door already open must
        // head for the exit, not wander forever
        let grid = MazeGrid::new(20, 20, 100.0);
        let mut world = MazeWorld::new(grid, 11);
        let spawn = Vec3::new(250.0, 250.0, 0.0);
        let key = world.add_key("brass", KeySignature(0b0001), spawn);
        world.add_exit(Vec3::new(1450.0, 1450.0, 0.0));

        let mut runner = SimRunner::new(world);
        let bot = runner.spawn_bot(spawn, BotConfig::default());
        runner.world_mut().interact(key, bot);

        runner.run(600, 0.1);
        assert!(runner.finished(), "carrier should walk straight out");
        assert!(runner
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::ExitReached { .. })));
    }

    #[test]
    fn test_demo_bot_seeks_key_first() {
        let mut runner = demo_runner(7);
        // first perception sweep fires on the first tick
        runner.step(0.1);
        let bot = runner.world().escaped().first().copied();
        assert!(bot.is_none());
        let slot_state = runner
            .events()
            .iter()
            .find_map(|e| match e {
                SimEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            });
        assert_eq!(slot_state, Some(AiState::SeekingKey));
    }
}
