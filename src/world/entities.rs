//! Maze entity model - keys, doors, exits and the signature/mask scheme
//!
//! Which keys open which doors is decided by bit overlap: a key opens a
//! door when `signature & mask != 0`. Doors open one way; there is no
//! re-closing.

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec3};

/// Bit flags identifying a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature(pub u32);

/// Bit mask of signatures a door accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorMask(pub u32);

impl KeySignature {
    /// True when this key opens a door carrying `mask`
    pub fn opens(&self, mask: DoorMask) -> bool {
        self.0 & mask.0 != 0
    }
}

/// The kinds of entity the world can be queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Bot,
    Key,
    Door,
    Exit,
}

/// Lightweight reference returned by kind-based world queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
}

/// Snapshot of a key as seen by perception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub id: EntityId,
    pub name: String,
    pub position: Vec3,
    pub signature: KeySignature,
    /// False while some bot is carrying it
    pub on_ground: bool,
}

/// Snapshot of a door as seen by perception
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorInfo {
    pub id: EntityId,
    pub position: Vec3,
    pub mask: DoorMask,
    pub is_open: bool,
}

impl DoorInfo {
    pub fn can_be_opened_by(&self, signature: KeySignature) -> bool {
        signature.opens(self.mask)
    }
}

/// Snapshot of an exit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitInfo {
    pub id: EntityId,
    pub position: Vec3,
}

/// Mutable view of a bot used during interactions
#[derive(Debug, Clone, PartialEq)]
pub struct BotBody {
    pub id: EntityId,
    pub position: Vec3,
    pub carried_key: Option<EntityId>,
}

/// Capability interface for things a bot can interact with
///
/// Replaces type-identity checks: keys, doors and exits each expose the
/// same three operations, and callers never need to know which concrete
/// kind they are talking to.
pub trait Interactable {
    /// Whether `actor` may interact right now (e.g. a door requires a
    /// matching carried key)
    fn can_interact_with(&self, actor: &BotBody, carried_signature: Option<KeySignature>) -> bool;

    /// Apply the interaction to this entity and the acting bot.
    ///
    /// A key moves into the actor's hands (the previously carried key
    /// id, if any, is returned so the world can re-ground it); a door
    /// opens; an exit reports the actor as finished.
    fn interact_with(&mut self, actor: &mut BotBody) -> InteractionOutcome;

    /// Points from which the interaction can be performed
    fn interaction_points(&self) -> Vec<Vec3>;
}

/// What an interaction did, for world-level bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    /// Key picked up; carries the id of the key the actor dropped, if any
    PickedUpKey { dropped: Option<EntityId> },
    /// Door opened; the key stays in the actor's hands
    OpenedDoor { used_key: EntityId },
    /// Actor reached the exit
    ReachedExit,
    /// Interaction was refused
    Refused,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_signature_mask_overlap() {
        assert!(KeySignature(0b0101).opens(DoorMask(0b0100)));
        assert!(KeySignature(0b0101).opens(DoorMask(0b0001)));
        assert!(!KeySignature(0b0101).opens(DoorMask(0b1010)));
        assert!(!KeySignature(0).opens(DoorMask(0b1111)));
        assert!(!KeySignature(0b1111).opens(DoorMask(0)));
    }

    proptest! {
        #[test]
        fn prop_open_iff_bit_overlap(signature: u32, mask: u32) {
            let opens = KeySignature(signature).opens(DoorMask(mask));
            prop_assert_eq!(opens, signature & mask != 0);
        }

        #[test]
        fn prop_zero_signature_never_opens(mask: u32) {
            prop_assert!(!KeySignature(0).opens(DoorMask(mask)));
        }
    }
}
