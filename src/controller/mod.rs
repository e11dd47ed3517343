//! Bot controller - possession lifecycle, tick orchestration and
//! diagnostics
//!
//! One controller drives one bot. Each tick runs, in order: due timer
//! events (perception sweeps on their cadence, gated recovery attempts),
//! then the stuck check, then the state watchdog. Everything is
//! synchronous; long-running moves are polled through the navigator on
//! later ticks.

pub mod perception;
pub mod recovery;
pub mod state;
pub mod stuck;

pub use recovery::{ErrorKind, ErrorState};
pub use state::{AiState, StateTracker};
pub use stuck::StuckDetector;

use crate::core::config::BotConfig;
use crate::core::scheduler::Scheduler;
use crate::core::types::{EntityId, Seconds, Vec3};
use crate::facts::{FactKey, FactStore};
use crate::telemetry::{ErrorRecord, TelemetrySink};
use crate::world::{
    DecisionAsset, DecisionProcess, InteractionOutcome, MoveHandle, MoveStatus, Navigator,
    SensorRig, SightConfig, WorldQuery,
};

/// Deadline tokens the controller schedules for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    PerceptionSweep,
    RecoveryAttempt,
}

/// AI controller for one maze bot
pub struct BotController {
    pub(crate) config: BotConfig,
    pub(crate) asset: Option<DecisionAsset>,
    pub(crate) telemetry: Box<dyn TelemetrySink>,

    pub(crate) bot: Option<EntityId>,
    pub(crate) facts: FactStore,
    pub(crate) state: StateTracker,
    pub(crate) stuck: StuckDetector,
    pub(crate) error: ErrorState,

    pub(crate) last_valid_location: Option<Vec3>,
    pub(crate) last_known_position: Vec3,
    pub(crate) active_move: Option<MoveHandle>,
    pub(crate) scheduler: Scheduler<TimerEvent>,
}

impl BotController {
    /// Build a controller. `asset` is the decision process to run on
    /// possession; a missing asset surfaces as AssetMissing at possess
    /// time, mirroring a design-time configuration hole.
    pub fn new(
        config: BotConfig,
        asset: Option<DecisionAsset>,
        telemetry: Box<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            asset,
            telemetry,
            bot: None,
            facts: FactStore::new(),
            state: StateTracker::new(),
            stuck: StuckDetector::new(),
            error: ErrorState::default(),
            last_valid_location: None,
            last_known_position: Vec3::default(),
            active_move: None,
            scheduler: Scheduler::new(),
        }
    }

    /// Take control of a bot, resetting all per-possession state.
    /// Returns false when startup failed (an error is then active).
    pub fn possess<E>(
        &mut self,
        bot: EntityId,
        env: &mut E,
        sensors: &mut dyn SensorRig,
        decision: &mut dyn DecisionProcess,
    ) -> bool
    where
        E: WorldQuery + ?Sized,
    {
        self.bot = Some(bot);
        self.error.clear();
        self.scheduler.clear();
        self.state.reset();
        self.facts.reinitialize();
        self.active_move = None;

        let position = env.position_of(bot);
        self.stuck.reset(position);
        if let Some(pos) = position {
            self.last_known_position = pos;
            self.last_valid_location = Some(pos);
        } else {
            self.last_valid_location = None;
        }

        sensors.configure_sight(self.sight_config());

        let Some(asset) = self.asset.clone() else {
            self.report_error(ErrorKind::AssetMissing, "decision process asset not set");
            return false;
        };

        let _ = self.facts.set_entity(FactKey::SelfActor, bot);
        self.set_state(AiState::Exploring);

        // arm the sweep before the start attempt so perception resumes
        // if a failed start is later recovered
        self.scheduler.schedule_in(0.0, TimerEvent::PerceptionSweep);

        if !decision.start(&asset, bot) {
            self.report_error(
                ErrorKind::BehaviorTreeStartFailed,
                "failed to start decision process",
            );
            return false;
        }

        tracing::info!(bot = ?bot, "controller possessed bot");
        true
    }

    /// Release the bot and stop the decision process
    pub fn unpossess(&mut self, decision: &mut dyn DecisionProcess) {
        if let Some(bot) = self.bot.take() {
            tracing::info!(bot = ?bot, "controller released bot");
        }
        decision.stop();
        self.scheduler.clear();
        self.active_move = None;
    }

    /// Advance the controller by one tick
    pub fn tick<E>(
        &mut self,
        dt: Seconds,
        env: &mut E,
        sensors: &mut dyn SensorRig,
        decision: &mut dyn DecisionProcess,
    ) where
        E: WorldQuery + Navigator + ?Sized,
    {
        let Some(bot) = self.bot else { return };

        self.scheduler.advance(dt);
        if let Some(pos) = env.position_of(bot) {
            self.last_known_position = pos;
        }

        // due timers: perception on its cadence, gated recovery attempts
        let mut due = Vec::new();
        while let Some(event) = self.scheduler.pop_due() {
            due.push(event);
        }
        for event in due {
            match event {
                TimerEvent::PerceptionSweep => {
                    if !self.is_in_error_state() {
                        self.run_perception(env);
                    }
                    self.scheduler
                        .schedule_in(self.config.perception_interval, TimerEvent::PerceptionSweep);
                }
                TimerEvent::RecoveryAttempt => {
                    if self.is_in_error_state() {
                        self.try_recover(env, sensors, decision);
                        if self.is_in_error_state() {
                            self.scheduler.schedule_in(
                                self.config.recovery_attempt_interval,
                                TimerEvent::RecoveryAttempt,
                            );
                        }
                    }
                }
            }
        }

        // while an error is active the corrective loop above owns the bot
        if self.is_in_error_state() {
            return;
        }

        // stuck check
        let moving = env.current_status(bot) == MoveStatus::Moving;
        let stuck_time = self.stuck.update(
            self.last_known_position,
            moving,
            self.config.stuck_threshold,
            dt,
        );
        if stuck_time > self.config.max_stuck_time {
            self.report_error(ErrorKind::NavigationMissing, "bot appears to be stuck");
            self.reset_ai_state(env, decision);
            self.stuck.reset_timer();
        } else if stuck_time == 0.0 {
            // moving normally, remember this spot for recovery
            self.last_valid_location = Some(self.last_known_position);
        }

        // state watchdog
        if !self.is_in_error_state() {
            self.state.accumulate(dt);
            if self.state.time_in_state() > self.config.max_time_in_state {
                let message = format!("stuck in state {} for too long", self.state.state());
                self.report_error(ErrorKind::TaskExecutionFailed, message);
                self.reset_ai_state(env, decision);
            }
        }
    }

    /// Interact with a world entity through its capability interface,
    /// then refresh perception so facts reflect the new world.
    pub fn interact_with<E>(&mut self, target: EntityId, env: &mut E) -> InteractionOutcome
    where
        E: WorldQuery + ?Sized,
    {
        let Some(bot) = self.bot else {
            return InteractionOutcome::Refused;
        };
        if !env.can_interact(target, bot) {
            return InteractionOutcome::Refused;
        }
        let outcome = env.interact(target, bot);
        self.run_perception(env);
        outcome
    }

    /// Record an error; last write wins, no stacking. Never fails.
    pub fn report_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%kind, %message, "bot error reported");

        let was_in_error = self.is_in_error_state();
        self.error.kind = kind;
        self.error.message = message.clone();

        self.telemetry.record_error(ErrorRecord {
            bot: self.bot,
            kind,
            message,
            location: self.last_known_position,
            timestamp: self.scheduler.now(),
        });

        // a fresh error arms the recovery cadence; an overwrite keeps
        // the existing deadline so attempts stay rate-limited
        if !was_in_error && kind != ErrorKind::None {
            self.scheduler.schedule_in(
                self.config.recovery_attempt_interval,
                TimerEvent::RecoveryAttempt,
            );
        }
    }

    pub fn is_in_error_state(&self) -> bool {
        self.error.kind != ErrorKind::None
    }

    pub fn current_error_kind(&self) -> ErrorKind {
        self.error.kind
    }

    pub fn last_error_message(&self) -> &str {
        &self.error.message
    }

    pub fn state(&self) -> AiState {
        self.state.state()
    }

    /// Switch behavioral state, writing through to the fact store
    pub fn set_state(&mut self, state: AiState) {
        self.state.set_state(state);
        let _ = self.facts.set_state(FactKey::CurrentState, state);
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    pub fn possessed_bot(&self) -> Option<EntityId> {
        self.bot
    }

    pub fn stuck_time(&self) -> Seconds {
        self.stuck.stuck_time()
    }

    pub fn time_in_state(&self) -> Seconds {
        self.state.time_in_state()
    }

    pub(crate) fn sight_config(&self) -> SightConfig {
        SightConfig {
            radius: self.config.sight_radius,
            lose_radius: self.config.lose_sight_radius,
            fov_degrees: self.config.peripheral_vision_degrees,
            max_age: self.config.sight_max_age,
        }
    }

    /// Human-readable status line block, the headless debug overlay
    pub fn diagnostic_text(&self) -> String {
        let mut text = format!(
            "State: {} ({:.1}s)\n",
            self.state.state(),
            self.state.time_in_state()
        );

        if let Some(target) = self.facts.point(FactKey::CurrentTarget) {
            text.push_str(&format!(
                "Target: ({:.0}, {:.0}, {:.0})\n",
                target.x, target.y, target.z
            ));
        }

        let has_key = self.facts.entity(FactKey::CurrentKey).is_some();
        text.push_str(&format!("Has Key: {}\n", if has_key { "Yes" } else { "No" }));

        if self.stuck.stuck_time() > 0.0 {
            text.push_str(&format!(
                "Stuck: {:.1}s / {:.1}s\n",
                self.stuck.stuck_time(),
                self.config.max_stuck_time
            ));
        }

        if self.is_in_error_state() {
            text.push_str(&format!(
                "ERROR: {}\n{}",
                self.error.kind, self.error.message
            ));
        }

        text
    }
}
