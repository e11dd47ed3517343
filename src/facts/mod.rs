//! Fact store - typed slots shared between perception and decision logic
//!
//! The blackboard analog. Perception writes what it saw, the decision
//! process reads targets from it, and recovery resets it. Every slot is
//! explicitly optional: an unset slot reads as `None` rather than a
//! zero-vector sentinel, so a legitimately-zero world coordinate can
//! never be confused with "no value".

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::controller::state::AiState;
use crate::core::error::{BotError, Result};
use crate::core::types::{EntityId, Vec3};

/// Named fact slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactKey {
    /// Where the bot is currently headed
    CurrentTarget,
    /// Current behavioral state, mirrored from the state controller
    CurrentState,
    /// Nearest key on the ground, when not carrying one
    VisibleKey,
    /// Nearest closed door matching the carried key
    VisibleDoor,
    /// The key the bot is carrying
    CurrentKey,
    /// Location of the maze exit
    ExitLocation,
    /// The bot's own entity
    SelfActor,
}

impl FactKey {
    /// Every slot in the schema
    pub const ALL: [FactKey; 7] = [
        FactKey::CurrentTarget,
        FactKey::CurrentState,
        FactKey::VisibleKey,
        FactKey::VisibleDoor,
        FactKey::CurrentKey,
        FactKey::ExitLocation,
        FactKey::SelfActor,
    ];

    /// The value kind this slot accepts
    pub fn kind(&self) -> FactKind {
        match self {
            FactKey::CurrentTarget | FactKey::ExitLocation => FactKind::Point,
            FactKey::CurrentState => FactKind::State,
            FactKey::VisibleKey
            | FactKey::VisibleDoor
            | FactKey::CurrentKey
            | FactKey::SelfActor => FactKind::Entity,
        }
    }
}

/// Value kinds a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Entity,
    Point,
    State,
}

/// A typed fact value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactValue {
    Entity(EntityId),
    Point(Vec3),
    State(AiState),
}

impl FactValue {
    fn kind(&self) -> FactKind {
        match self {
            FactValue::Entity(_) => FactKind::Entity,
            FactValue::Point(_) => FactKind::Point,
            FactValue::State(_) => FactKind::State,
        }
    }
}

/// Keyed store of typed, optional facts
///
/// Owned exclusively by one controller. Slots are validated against the
/// schema on write, so a getter never observes a mismatched type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactStore {
    slots: AHashMap<FactKey, FactValue>,
}

impl FactStore {
    /// Create an empty store with every schema slot unset
    pub fn new() -> Self {
        Self {
            slots: AHashMap::new(),
        }
    }

    /// Drop all values, returning every slot to unset
    ///
    /// Used by recovery when the store must be rebuilt from scratch.
    pub fn reinitialize(&mut self) {
        self.slots.clear();
    }

    fn set(&mut self, key: FactKey, value: FactValue) -> Result<()> {
        if key.kind() != value.kind() {
            return Err(BotError::FactTypeMismatch(match key.kind() {
                FactKind::Entity => "expected entity slot",
                FactKind::Point => "expected point slot",
                FactKind::State => "expected state slot",
            }));
        }
        self.slots.insert(key, value);
        Ok(())
    }

    pub fn set_entity(&mut self, key: FactKey, id: EntityId) -> Result<()> {
        self.set(key, FactValue::Entity(id))
    }

    pub fn set_point(&mut self, key: FactKey, point: Vec3) -> Result<()> {
        self.set(key, FactValue::Point(point))
    }

    pub fn set_state(&mut self, key: FactKey, state: AiState) -> Result<()> {
        self.set(key, FactValue::State(state))
    }

    /// Unset a slot
    pub fn clear(&mut self, key: FactKey) {
        self.slots.remove(&key);
    }

    pub fn entity(&self, key: FactKey) -> Option<EntityId> {
        match self.slots.get(&key) {
            Some(FactValue::Entity(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn point(&self, key: FactKey) -> Option<Vec3> {
        match self.slots.get(&key) {
            Some(FactValue::Point(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn state(&self, key: FactKey) -> Option<AiState> {
        match self.slots.get(&key) {
            Some(FactValue::State(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn is_set(&self, key: FactKey) -> bool {
        self.slots.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_slot_reads_none() {
        let store = FactStore::new();
        assert_eq!(store.point(FactKey::CurrentTarget), None);
        assert!(!store.is_set(FactKey::CurrentTarget));
    }

    #[test]
    fn test_zero_point_is_distinct_from_unset() {
        let mut store = FactStore::new();
        store
            .set_point(FactKey::CurrentTarget, Vec3::default())
            .unwrap();
        assert_eq!(store.point(FactKey::CurrentTarget), Some(Vec3::default()));
        assert!(store.is_set(FactKey::CurrentTarget));
    }

    #[test]
    fn test_schema_rejects_mismatched_kind() {
        let mut store = FactStore::new();
        assert!(store.set_point(FactKey::VisibleKey, Vec3::default()).is_err());
        assert!(store
            .set_entity(FactKey::ExitLocation, EntityId::new())
            .is_err());
    }

    #[test]
    fn test_clear_unsets() {
        let mut store = FactStore::new();
        store.set_entity(FactKey::VisibleKey, EntityId::new()).unwrap();
        store.clear(FactKey::VisibleKey);
        assert_eq!(store.entity(FactKey::VisibleKey), None);
    }

    #[test]
    fn test_reinitialize_drops_everything() {
        let mut store = FactStore::new();
        store.set_state(FactKey::CurrentState, AiState::SeekingKey).unwrap();
        store.set_point(FactKey::ExitLocation, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        store.reinitialize();
        assert_eq!(store, FactStore::new());
    }
}
