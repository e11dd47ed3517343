//! Collaborator interfaces the bot controller calls out to
//!
//! The controller never touches engine-style globals: everything it
//! needs from its surroundings comes through these traits, injected per
//! call. The `sim` module provides in-memory implementations; unit tests
//! use hand-rolled stubs.

pub mod entities;

pub use entities::{
    BotBody, DoorInfo, DoorMask, EntityKind, EntityRef, ExitInfo, Interactable,
    InteractionOutcome, KeyInfo, KeySignature,
};

use crate::core::types::{EntityId, Vec3};

/// Read/interact access to world entities
pub trait WorldQuery {
    /// All keys currently in the world, carried or not
    fn keys(&self) -> Vec<KeyInfo>;

    /// All doors, open or closed
    fn doors(&self) -> Vec<DoorInfo>;

    /// All exits
    fn exits(&self) -> Vec<ExitInfo>;

    /// Position of any entity, or None if it no longer exists
    fn position_of(&self, id: EntityId) -> Option<Vec3>;

    /// The key `bot` is carrying, if any
    fn carried_key(&self, bot: EntityId) -> Option<KeyInfo>;

    /// Whether `actor` may interact with `target` right now
    fn can_interact(&self, target: EntityId, actor: EntityId) -> bool;

    /// Perform the interaction, routed through the target's
    /// `Interactable` capability
    fn interact(&mut self, target: EntityId, actor: EntityId) -> InteractionOutcome;

    /// Nearest entity of a kind by Euclidean distance
    fn find_nearest_of_kind(&self, kind: EntityKind, origin: Vec3) -> Option<EntityRef> {
        let mut best: Option<EntityRef> = None;
        let mut best_dist = f32::MAX;
        for entity in self.refs_of_kind(kind) {
            let dist = origin.distance_squared(&entity.position);
            if dist < best_dist {
                best_dist = dist;
                best = Some(entity);
            }
        }
        best
    }

    /// First entity of a kind, in world iteration order
    fn find_first_of_kind(&self, kind: EntityKind) -> Option<EntityRef> {
        self.refs_of_kind(kind).into_iter().next()
    }

    /// Entity references of one kind, used by the kind-based queries
    fn refs_of_kind(&self, kind: EntityKind) -> Vec<EntityRef> {
        match kind {
            EntityKind::Key => self
                .keys()
                .into_iter()
                .map(|k| EntityRef { id: k.id, kind, position: k.position })
                .collect(),
            EntityKind::Door => self
                .doors()
                .into_iter()
                .map(|d| EntityRef { id: d.id, kind, position: d.position })
                .collect(),
            EntityKind::Exit => self
                .exits()
                .into_iter()
                .map(|e| EntityRef { id: e.id, kind, position: e.position })
                .collect(),
            EntityKind::Bot => Vec::new(),
        }
    }
}

/// Handle for an in-flight move request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveHandle(pub u64);

/// Status of a bot's current move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Idle,
    Moving,
    Succeeded,
    Failed,
}

/// Navigation collaborator
///
/// Moves are non-blocking: a request returns a handle immediately and
/// progress is observed by polling on later ticks. A new request for the
/// same bot supersedes its pending one.
pub trait Navigator {
    /// Whether `point` lies on (or within `tolerance` of) navigable space
    fn project_to_navigable(&self, point: Vec3, tolerance: f32) -> bool;

    /// A random navigable point reachable from `origin` within `radius`
    fn find_random_reachable_point(&mut self, origin: Vec3, radius: f32) -> Option<Vec3>;

    /// Ask the bot to move to `point`, arriving within
    /// `acceptance_radius`. Returns None when the request is rejected
    /// outright (no path, no navigation data).
    fn request_move_to(
        &mut self,
        bot: EntityId,
        point: Vec3,
        acceptance_radius: f32,
    ) -> Option<MoveHandle>;

    /// Status of a previously issued request
    fn move_status(&self, handle: MoveHandle) -> MoveStatus;

    /// Status of the bot's current move, whatever requested it
    fn current_status(&self, bot: EntityId) -> MoveStatus;

    /// Abort the bot's current move
    fn stop_movement(&mut self, bot: EntityId);
}

/// Sight sensor parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightConfig {
    pub radius: f32,
    pub lose_radius: f32,
    pub fov_degrees: f32,
    pub max_age: f32,
}

/// Perception sensor collaborator
pub trait SensorRig {
    /// (Re)register the sight sense with the given parameters
    fn configure_sight(&mut self, config: SightConfig);

    /// Drop all remembered stimuli
    fn forget_all(&mut self);
}

/// Opaque reference to a decision process asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionAsset(pub String);

/// Black-box decision process (behavior tree analog)
///
/// The controller only starts, restarts and stops it; what it decides
/// is not this crate's concern.
pub trait DecisionProcess {
    /// Begin running the process for `bot`. False on startup failure.
    fn start(&mut self, asset: &DecisionAsset, bot: EntityId) -> bool;

    /// Restart from the root, discarding in-flight decisions
    fn restart(&mut self);

    /// Stop entirely
    fn stop(&mut self);
}
