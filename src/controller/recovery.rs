//! Error taxonomy and kind-specific recovery strategies
//!
//! Errors are captured locally and never propagated as hard failures:
//! reporting stores the kind and message, and a recovery attempt runs
//! later on the controller's cadence. At most one error is active at a
//! time; a new report overwrites the old one regardless of kind.

use serde::{Deserialize, Serialize};

use super::state::AiState;
use super::BotController;
use crate::facts::FactKey;
use crate::telemetry::RecoveryRecord;
use crate::world::{DecisionProcess, Navigator, SensorRig, WorldQuery};

/// What went wrong, at most one active per controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No active error
    #[default]
    None,
    /// Decision process asset not configured; unrecoverable at runtime
    AssetMissing,
    /// Fact store could not be initialized from its schema
    BlackboardInitFailed,
    /// Decision process refused to start
    BehaviorTreeStartFailed,
    /// Bot cannot make navigation progress (stuck, no path)
    NavigationMissing,
    /// A perception sweep failed partway
    PerceptionError,
    /// A task ran without progress for too long
    TaskExecutionFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::None => "None",
            ErrorKind::AssetMissing => "AssetMissing",
            ErrorKind::BlackboardInitFailed => "BlackboardInitFailed",
            ErrorKind::BehaviorTreeStartFailed => "BehaviorTreeStartFailed",
            ErrorKind::NavigationMissing => "NavigationMissing",
            ErrorKind::PerceptionError => "PerceptionError",
            ErrorKind::TaskExecutionFailed => "TaskExecutionFailed",
        };
        write!(f, "{name}")
    }
}

/// Active error kind plus its message, last-write-wins
#[derive(Debug, Clone, Default)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorState {
    pub fn clear(&mut self) {
        self.kind = ErrorKind::None;
        self.message.clear();
    }
}

impl BotController {
    /// Run the recovery strategy for the active error kind.
    ///
    /// On success the error is cleared; on failure it stays active for
    /// inspection and a later retry. Never panics, never returns an
    /// error of its own.
    pub fn try_recover<E>(
        &mut self,
        env: &mut E,
        sensors: &mut dyn SensorRig,
        decision: &mut dyn DecisionProcess,
    ) -> bool
    where
        E: WorldQuery + Navigator + ?Sized,
    {
        let kind = self.error.kind;
        tracing::warn!(%kind, message = %self.error.message, "attempting error recovery");

        // stale timers must not re-trigger the moment recovery ends
        self.stuck.reset_timer();
        self.state.reset_timer();

        let recovered = match kind {
            ErrorKind::None => true,
            ErrorKind::AssetMissing => {
                tracing::warn!("cannot recover from missing assets at runtime");
                false
            }
            ErrorKind::BlackboardInitFailed => self.recover_fact_store(),
            ErrorKind::BehaviorTreeStartFailed => self.recover_decision_process(decision),
            ErrorKind::NavigationMissing => self.recover_navigation(env),
            ErrorKind::PerceptionError => self.recover_perception(env, sensors),
            ErrorKind::TaskExecutionFailed => {
                self.reset_ai_state(env, decision);
                true
            }
        };

        self.telemetry.record_recovery(RecoveryRecord {
            bot: self.bot,
            kind,
            succeeded: recovered,
            timestamp: self.scheduler.now(),
        });

        if recovered {
            tracing::info!(%kind, "recovered from error");
            self.error.clear();
        } else {
            tracing::error!(%kind, "failed to recover from error");
        }
        recovered
    }

    /// Rebuild the fact store from its schema and reseed the self/state
    /// slots.
    fn recover_fact_store(&mut self) -> bool {
        if self.asset.is_none() {
            return false;
        }
        self.facts.reinitialize();
        if let Some(bot) = self.bot {
            let _ = self.facts.set_entity(FactKey::SelfActor, bot);
        }
        self.set_state(AiState::Exploring);
        true
    }

    fn recover_decision_process(&mut self, decision: &mut dyn DecisionProcess) -> bool {
        match (&self.asset, self.bot) {
            (Some(asset), Some(bot)) => decision.start(asset, bot),
            _ => false,
        }
    }

    /// Two-tier navigation recovery: first retreat to the last valid
    /// location with an enlarged acceptance radius, then probe for a
    /// random reachable point, doubling the radius on each failure.
    fn recover_navigation<E>(&mut self, env: &mut E) -> bool
    where
        E: WorldQuery + Navigator + ?Sized,
    {
        let Some(bot) = self.bot else { return false };

        let mut recovered = false;
        if let Some(valid) = self.last_valid_location {
            env.stop_movement(bot);
            let _ = self.facts.set_point(FactKey::CurrentTarget, valid);
            self.active_move =
                env.request_move_to(bot, valid, self.config.recovery_acceptance_radius);
            recovered = self.active_move.is_some();
            tracing::warn!(success = recovered, "recovery: moving to last valid location");
        }

        if !recovered {
            let origin = self.last_known_position;
            let mut radius = self.config.recovery_probe_radius;
            while radius <= self.config.recovery_probe_radius_max {
                if let Some(point) = env.find_random_reachable_point(origin, radius) {
                    let _ = self.facts.set_point(FactKey::CurrentTarget, point);
                    self.set_state(AiState::Exploring);
                    self.active_move =
                        env.request_move_to(bot, point, self.config.recovery_acceptance_radius);
                    if self.active_move.is_some() {
                        tracing::warn!(radius, "recovery: moving to random reachable point");
                        recovered = true;
                        break;
                    }
                }
                radius *= 2.0;
            }
        }
        recovered
    }

    /// Clear sensor memory, re-register sight and force one perception
    /// sweep.
    fn recover_perception<E>(&mut self, env: &mut E, sensors: &mut dyn SensorRig) -> bool
    where
        E: WorldQuery + ?Sized,
    {
        sensors.forget_all();
        sensors.configure_sight(self.sight_config());
        self.run_perception(env)
    }

    /// Full reset: stop moving, zero timers, return to Exploring, seek a
    /// navigable point and restart the decision process.
    pub(crate) fn reset_ai_state<E>(&mut self, env: &mut E, decision: &mut dyn DecisionProcess)
    where
        E: WorldQuery + Navigator + ?Sized,
    {
        let Some(bot) = self.bot else { return };

        env.stop_movement(bot);
        self.stuck.reset_timer();
        self.state.reset_timer();
        self.set_state(AiState::Exploring);

        if let Some(valid) = self.last_valid_location {
            let _ = self.facts.set_point(FactKey::CurrentTarget, valid);
            self.active_move =
                env.request_move_to(bot, valid, self.config.recovery_acceptance_radius);
        } else if let Some(point) =
            env.find_random_reachable_point(self.last_known_position, self.config.reset_probe_radius)
        {
            let _ = self.facts.set_point(FactKey::CurrentTarget, point);
            self.active_move =
                env.request_move_to(bot, point, self.config.recovery_acceptance_radius);
        }

        decision.restart();
    }
}
