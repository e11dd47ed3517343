//! Perception sweep - world queries into fact-store updates
//!
//! Runs on a fixed cadence from the controller tick. The sweep is
//! idempotent: with an unchanged world it rewrites identical facts and
//! triggers no further state transitions, so re-running it is always
//! safe (recovery relies on this).

use super::recovery::ErrorKind;
use super::state::AiState;
use super::BotController;
use crate::core::error::Result;
use crate::core::types::{EntityId, Vec3};
use crate::facts::FactKey;
use crate::world::{DoorInfo, EntityKind, EntityRef, KeyInfo, KeySignature, WorldQuery};

impl BotController {
    /// Run one perception sweep. Returns false when the sweep reported
    /// an error; a clean sweep clears a previously active
    /// PerceptionError.
    pub(crate) fn run_perception<E>(&mut self, env: &mut E) -> bool
    where
        E: WorldQuery + ?Sized,
    {
        let Some(bot) = self.bot else {
            self.report_error(ErrorKind::TaskExecutionFailed, "no possessed bot during perception");
            return false;
        };
        let Some(origin) = env.position_of(bot) else {
            self.report_error(
                ErrorKind::TaskExecutionFailed,
                "possessed bot has no world position",
            );
            return false;
        };

        match self.perceive(bot, origin, env) {
            Ok(()) => {
                if self.error.kind == ErrorKind::PerceptionError {
                    self.error.clear();
                }
                true
            }
            Err(err) => {
                self.report_error(ErrorKind::PerceptionError, format!("perception sweep failed: {err}"));
                false
            }
        }
    }

    fn perceive<E>(&mut self, bot: EntityId, origin: Vec3, env: &mut E) -> Result<()>
    where
        E: WorldQuery + ?Sized,
    {
        let carried = env.carried_key(bot);

        match &carried {
            None => {
                self.facts.clear(FactKey::CurrentKey);
                match Self::find_nearest_key(env, origin) {
                    Some(key) => {
                        self.facts.set_entity(FactKey::VisibleKey, key.id)?;
                        // a sighted key only redirects a bot that is
                        // still wandering
                        if self.state.state() == AiState::Exploring {
                            self.set_state(AiState::SeekingKey);
                            self.facts.set_point(FactKey::CurrentTarget, key.position)?;
                        }
                    }
                    None => self.facts.clear(FactKey::VisibleKey),
                }
            }
            Some(key) => {
                self.facts.set_entity(FactKey::CurrentKey, key.id)?;
                match Self::find_matching_door(env, origin, key.signature) {
                    Some(door) => {
                        self.facts.set_entity(FactKey::VisibleDoor, door.id)?;
                        self.set_state(AiState::SeekingDoor);
                        self.facts.set_point(FactKey::CurrentTarget, door.position)?;
                    }
                    None => self.facts.clear(FactKey::VisibleDoor),
                }
            }
        }

        if let Some(exit) = Self::find_exit(env) {
            self.facts.set_point(FactKey::ExitLocation, exit.position)?;
            // empty-handed with no key in sight: head for the exit
            if carried.is_none() && self.facts.entity(FactKey::VisibleKey).is_none() {
                self.set_state(AiState::GoingToExit);
                self.facts.set_point(FactKey::CurrentTarget, exit.position)?;
            }
        }

        Ok(())
    }

    /// Nearest key still on the ground, by Euclidean distance
    fn find_nearest_key<E>(env: &E, origin: Vec3) -> Option<KeyInfo>
    where
        E: WorldQuery + ?Sized,
    {
        env.keys()
            .into_iter()
            .filter(|key| key.on_ground)
            .min_by(|a, b| {
                origin
                    .distance_squared(&a.position)
                    .total_cmp(&origin.distance_squared(&b.position))
            })
    }

    /// Nearest closed door the carried key can open
    fn find_matching_door<E>(env: &E, origin: Vec3, signature: KeySignature) -> Option<DoorInfo>
    where
        E: WorldQuery + ?Sized,
    {
        env.doors()
            .into_iter()
            .filter(|door| !door.is_open && door.can_be_opened_by(signature))
            .min_by(|a, b| {
                origin
                    .distance_squared(&a.position)
                    .total_cmp(&origin.distance_squared(&b.position))
            })
    }

    /// First exit found; exits are interchangeable so nearest-selection
    /// is not worth the scan
    fn find_exit<E>(env: &E) -> Option<EntityRef>
    where
        E: WorldQuery + ?Sized,
    {
        env.find_first_of_kind(EntityKind::Exit)
    }
}
