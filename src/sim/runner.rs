//! Multi-bot simulation runner
//!
//! Drives a set of controllers against one maze world. The runner also
//! plays the part of the black-box decision process executor: it reads
//! targets from each controller's fact store and turns them into move
//! requests and interactions, the way the engine's behavior tree tasks
//! would.

use serde::Serialize;

use crate::controller::{AiState, BotController, ErrorKind};
use crate::core::config::BotConfig;
use crate::core::types::{EntityId, Seconds, Tick, Vec3};
use crate::facts::FactKey;
use crate::sim::maze::MazeWorld;
use crate::sim::stubs::{RecordingSensorRig, ScriptedDecision};
use crate::telemetry::{CollectingSink, TelemetryLog};
use crate::world::{DecisionAsset, MoveStatus, Navigator, WorldQuery};

/// Arrival radius for scripted task moves (world units)
const TASK_ACCEPTANCE_RADIUS: f32 = 120.0;

/// How far wander targets are picked from the bot (world units)
const WANDER_RADIUS: f32 = 800.0;

/// Events generated while the simulation runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    KeyPickedUp { bot: EntityId, key: EntityId, tick: Tick },
    DoorOpened { bot: EntityId, door: EntityId, tick: Tick },
    ExitReached { bot: EntityId, tick: Tick },
    StateChanged { bot: EntityId, from: AiState, to: AiState, tick: Tick },
    ErrorReported { bot: EntityId, kind: ErrorKind, tick: Tick },
    Recovered { bot: EntityId, kind: ErrorKind, tick: Tick },
}

struct BotSlot {
    id: EntityId,
    controller: BotController,
    sensors: RecordingSensorRig,
    decision: ScriptedDecision,
    last_state: AiState,
    last_error: ErrorKind,
    last_move_target: Option<Vec3>,
    finished: bool,
}

/// Owns the world and all bot controllers
pub struct SimRunner {
    world: MazeWorld,
    slots: Vec<BotSlot>,
    tick: Tick,
    events: Vec<SimEvent>,
    telemetry: CollectingSink,
}

impl SimRunner {
    pub fn new(world: MazeWorld) -> Self {
        Self {
            world,
            slots: Vec::new(),
            tick: 0,
            events: Vec::new(),
            telemetry: CollectingSink::new(),
        }
    }

    /// Spawn a bot at `position` and possess it with a fresh controller
    pub fn spawn_bot(&mut self, position: Vec3, config: BotConfig) -> EntityId {
        let id = self.world.add_bot(position);
        let mut controller = BotController::new(
            config,
            Some(DecisionAsset("maze-bot".into())),
            Box::new(self.telemetry.clone()),
        );
        let mut sensors = RecordingSensorRig::default();
        let mut decision = ScriptedDecision::default();
        controller.possess(id, &mut self.world, &mut sensors, &mut decision);
        let last_state = controller.state();
        let last_error = controller.current_error_kind();
        self.slots.push(BotSlot {
            id,
            controller,
            sensors,
            decision,
            last_state,
            last_error,
            last_move_target: None,
            finished: false,
        });
        id
    }

    pub fn world(&self) -> &MazeWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut MazeWorld {
        &mut self.world
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shared telemetry log across all bots
    pub fn telemetry_log(&self) -> std::rc::Rc<std::cell::RefCell<TelemetryLog>> {
        self.telemetry.log()
    }

    /// Ids of all spawned bots, in spawn order
    pub fn bots(&self) -> Vec<EntityId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub fn controller(&self, bot: EntityId) -> Option<&BotController> {
        self.slots
            .iter()
            .find(|slot| slot.id == bot)
            .map(|slot| &slot.controller)
    }

    /// All bots have escaped
    pub fn finished(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|slot| slot.finished)
    }

    /// Advance the whole simulation one tick
    pub fn step(&mut self, dt: Seconds) {
        self.tick += 1;

        for slot in &mut self.slots {
            if slot.finished {
                continue;
            }

            slot.controller
                .tick(dt, &mut self.world, &mut slot.sensors, &mut slot.decision);

            let state = slot.controller.state();
            if state != slot.last_state {
                self.events.push(SimEvent::StateChanged {
                    bot: slot.id,
                    from: slot.last_state,
                    to: state,
                    tick: self.tick,
                });
                slot.last_state = state;
            }

            let error = slot.controller.current_error_kind();
            if error != slot.last_error {
                if error != ErrorKind::None {
                    self.events.push(SimEvent::ErrorReported {
                        bot: slot.id,
                        kind: error,
                        tick: self.tick,
                    });
                } else {
                    self.events.push(SimEvent::Recovered {
                        bot: slot.id,
                        kind: slot.last_error,
                        tick: self.tick,
                    });
                }
                slot.last_error = error;
            }

            if !slot.controller.is_in_error_state() {
                Self::execute_tasks(&mut self.world, slot, &mut self.events, self.tick);
            }
        }

        self.world.step_moves(dt);

        // pick up exits triggered this tick
        for slot in &mut self.slots {
            if !slot.finished && self.world.escaped().contains(&slot.id) {
                slot.finished = true;
                slot.controller.unpossess(&mut slot.decision);
            }
        }
    }

    /// Run up to `ticks` ticks, stopping early when every bot escaped
    pub fn run(&mut self, ticks: Tick, dt: Seconds) {
        for _ in 0..ticks {
            if self.finished() {
                break;
            }
            self.step(dt);
        }
    }

    /// The scripted stand-in for behavior-tree task execution
    fn execute_tasks(
        world: &mut MazeWorld,
        slot: &mut BotSlot,
        events: &mut Vec<SimEvent>,
        tick: Tick,
    ) {
        let bot = slot.id;
        let facts = slot.controller.facts();
        let state = slot.controller.state();
        let carrying = facts.entity(FactKey::CurrentKey).is_some();
        let visible_door = facts.entity(FactKey::VisibleDoor);
        let exit_known = facts.point(FactKey::ExitLocation);

        match state {
            AiState::SeekingKey => {
                if let Some(key) = facts.entity(FactKey::VisibleKey) {
                    if world.can_interact(key, bot) {
                        if let crate::world::InteractionOutcome::PickedUpKey { .. } =
                            slot.controller.interact_with(key, world)
                        {
                            events.push(SimEvent::KeyPickedUp { bot, key, tick });
                        }
                    } else if let Some(target) = world.position_of(key) {
                        Self::ensure_moving(world, slot, target);
                    }
                }
            }
            AiState::SeekingDoor => {
                if let Some(door) = visible_door {
                    if world.can_interact(door, bot) {
                        if let crate::world::InteractionOutcome::OpenedDoor { .. } =
                            slot.controller.interact_with(door, world)
                        {
                            events.push(SimEvent::DoorOpened { bot, door, tick });
                        }
                    } else if let Some(target) = world.position_of(door) {
                        Self::ensure_moving(world, slot, target);
                    }
                } else if carrying && exit_known.is_some() {
                    // every matching door is open: carry the key out
                    Self::head_for_exit(world, slot, events, tick);
                }
            }
            AiState::GoingToExit => {
                Self::head_for_exit(world, slot, events, tick);
            }
            AiState::Exploring => {
                // a key carrier with no closed matching door left has an
                // open path: head out instead of wandering
                if carrying && visible_door.is_none() && exit_known.is_some() {
                    Self::head_for_exit(world, slot, events, tick);
                } else if world.current_status(bot) != MoveStatus::Moving {
                    let origin = world
                        .position_of(bot)
                        .unwrap_or_default();
                    if let Some(target) = world.find_random_reachable_point(origin, WANDER_RADIUS)
                    {
                        if world.project_to_navigable(target, TASK_ACCEPTANCE_RADIUS) {
                            Self::ensure_moving(world, slot, target);
                        }
                    }
                }
            }
        }
    }

    fn head_for_exit(
        world: &mut MazeWorld,
        slot: &mut BotSlot,
        events: &mut Vec<SimEvent>,
        tick: Tick,
    ) {
        let bot = slot.id;
        let Some(exit) = world.exits().first().copied() else {
            return;
        };
        if world.can_interact(exit.id, bot) {
            if slot.controller.interact_with(exit.id, world)
                == crate::world::InteractionOutcome::ReachedExit
            {
                events.push(SimEvent::ExitReached { bot, tick });
            }
        } else {
            Self::ensure_moving(world, slot, exit.position);
        }
    }

    /// Issue a move request unless one toward the same target is
    /// already running
    fn ensure_moving(world: &mut MazeWorld, slot: &mut BotSlot, target: Vec3) {
        let moving = world.current_status(slot.id) == MoveStatus::Moving;
        let same_target = slot
            .last_move_target
            .is_some_and(|t| t.distance(&target) < 1.0);
        if moving && same_target {
            return;
        }
        if world
            .request_move_to(slot.id, target, TASK_ACCEPTANCE_RADIUS)
            .is_some()
        {
            slot.last_move_target = Some(target);
        }
    }
}
