//! In-memory maze world - stub implementation of the world and
//! navigation collaborators
//!
//! A coarse cell grid with walls, plus keys, doors and exits placed on
//! it. Movement is a straight-line walk that simply stops against
//! walls, which is exactly what the stuck detector and navigation
//! recovery need to be exercised against. Closed doors block their
//! cell; opening one clears the way.

use ahash::AHashMap;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::types::{EntityId, Seconds, Vec3};
use crate::world::{
    BotBody, DoorInfo, DoorMask, ExitInfo, Interactable, InteractionOutcome, KeyInfo,
    KeySignature, MoveHandle, MoveStatus, Navigator, WorldQuery,
};

/// How close a bot must be to an interaction point
pub const INTERACTION_RANGE: f32 = 150.0;

/// Bot walking speed, world units per second
pub const BOT_SPEED: f32 = 300.0;

/// Cell grid with walls
#[derive(Debug, Clone)]
pub struct MazeGrid {
    pub width: i32,
    pub height: i32,
    pub cell_size: f32,
    walls: Vec<bool>,
}

impl MazeGrid {
    /// An open field with walled borders
    pub fn new(width: i32, height: i32, cell_size: f32) -> Self {
        let mut grid = Self {
            width,
            height,
            cell_size,
            walls: vec![false; (width * height) as usize],
        };
        for x in 0..width {
            grid.set_wall(x, 0);
            grid.set_wall(x, height - 1);
        }
        for y in 0..height {
            grid.set_wall(0, y);
            grid.set_wall(width - 1, y);
        }
        grid
    }

    pub fn set_wall(&mut self, x: i32, y: i32) {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            self.walls[(y * self.width + x) as usize] = true;
        }
    }

    pub fn cell_of(&self, point: Vec3) -> (i32, i32) {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    pub fn center_of(&self, x: i32, y: i32) -> Vec3 {
        Vec3::new(
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
            0.0,
        )
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return true;
        }
        self.walls[(y * self.width + x) as usize]
    }
}

/// Key entity and its interaction behavior
#[derive(Debug, Clone)]
pub struct KeyEntity {
    pub info: KeyInfo,
}

impl Interactable for KeyEntity {
    fn can_interact_with(&self, actor: &BotBody, _carried: Option<KeySignature>) -> bool {
        self.info.on_ground
            && actor.position.distance(&self.info.position) <= INTERACTION_RANGE
    }

    fn interact_with(&mut self, actor: &mut BotBody) -> InteractionOutcome {
        let dropped = actor.carried_key.replace(self.info.id);
        self.info.on_ground = false;
        InteractionOutcome::PickedUpKey { dropped }
    }

    fn interaction_points(&self) -> Vec<Vec3> {
        vec![self.info.position]
    }
}

/// Door entity; opening is one-way and the key stays carried
#[derive(Debug, Clone)]
pub struct DoorEntity {
    pub info: DoorInfo,
}

impl Interactable for DoorEntity {
    fn can_interact_with(&self, actor: &BotBody, carried: Option<KeySignature>) -> bool {
        !self.info.is_open
            && carried.is_some_and(|signature| signature.opens(self.info.mask))
            && self
                .interaction_points()
                .iter()
                .any(|p| actor.position.distance(p) <= INTERACTION_RANGE)
    }

    fn interact_with(&mut self, actor: &mut BotBody) -> InteractionOutcome {
        let Some(used_key) = actor.carried_key else {
            return InteractionOutcome::Refused;
        };
        self.info.is_open = true;
        InteractionOutcome::OpenedDoor { used_key }
    }

    fn interaction_points(&self) -> Vec<Vec3> {
        // either side of the doorway
        vec![
            self.info.position + Vec3::new(-INTERACTION_RANGE * 0.5, 0.0, 0.0),
            self.info.position + Vec3::new(INTERACTION_RANGE * 0.5, 0.0, 0.0),
        ]
    }
}

/// Exit entity
#[derive(Debug, Clone)]
pub struct ExitEntity {
    pub info: ExitInfo,
}

impl Interactable for ExitEntity {
    fn can_interact_with(&self, actor: &BotBody, _carried: Option<KeySignature>) -> bool {
        actor.position.distance(&self.info.position) <= INTERACTION_RANGE
    }

    fn interact_with(&mut self, _actor: &mut BotBody) -> InteractionOutcome {
        InteractionOutcome::ReachedExit
    }

    fn interaction_points(&self) -> Vec<Vec3> {
        vec![self.info.position]
    }
}

#[derive(Debug, Clone)]
struct ActiveMove {
    handle: MoveHandle,
    target: Vec3,
    acceptance_radius: f32,
    status: MoveStatus,
}

/// The stub world: entities, grid and in-flight moves
pub struct MazeWorld {
    grid: MazeGrid,
    bots: AHashMap<EntityId, BotBody>,
    keys: AHashMap<EntityId, KeyEntity>,
    doors: AHashMap<EntityId, DoorEntity>,
    exits: AHashMap<EntityId, ExitEntity>,
    // stable iteration order for "first exit" queries
    exit_order: Vec<EntityId>,
    moves: AHashMap<EntityId, ActiveMove>,
    next_handle: u64,
    rng: ChaCha8Rng,
    escaped: Vec<EntityId>,
}

impl MazeWorld {
    pub fn new(grid: MazeGrid, seed: u64) -> Self {
        Self {
            grid,
            bots: AHashMap::new(),
            keys: AHashMap::new(),
            doors: AHashMap::new(),
            exits: AHashMap::new(),
            exit_order: Vec::new(),
            moves: AHashMap::new(),
            next_handle: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            escaped: Vec::new(),
        }
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn add_bot(&mut self, position: Vec3) -> EntityId {
        let id = EntityId::new();
        self.bots.insert(
            id,
            BotBody {
                id,
                position,
                carried_key: None,
            },
        );
        id
    }

    pub fn add_key(&mut self, name: &str, signature: KeySignature, position: Vec3) -> EntityId {
        let id = EntityId::new();
        self.keys.insert(
            id,
            KeyEntity {
                info: KeyInfo {
                    id,
                    name: name.to_string(),
                    position,
                    signature,
                    on_ground: true,
                },
            },
        );
        id
    }

    pub fn add_door(&mut self, mask: DoorMask, position: Vec3) -> EntityId {
        let id = EntityId::new();
        self.doors.insert(
            id,
            DoorEntity {
                info: DoorInfo {
                    id,
                    position,
                    mask,
                    is_open: false,
                },
            },
        );
        id
    }

    pub fn add_exit(&mut self, position: Vec3) -> EntityId {
        let id = EntityId::new();
        self.exits.insert(id, ExitEntity { info: ExitInfo { id, position } });
        self.exit_order.push(id);
        id
    }

    /// Bots that have triggered an exit
    pub fn escaped(&self) -> &[EntityId] {
        &self.escaped
    }

    pub fn bot(&self, id: EntityId) -> Option<&BotBody> {
        self.bots.get(&id)
    }

    /// True when `point` is in open space: inside the grid, off walls,
    /// and not blocked by a closed door
    pub fn walkable_at(&self, point: Vec3) -> bool {
        let (x, y) = self.grid.cell_of(point);
        if self.grid.is_wall(x, y) {
            return false;
        }
        !self.doors.values().any(|door| {
            !door.info.is_open && self.grid.cell_of(door.info.position) == (x, y)
        })
    }

    /// Advance every in-flight move by one tick
    pub fn step_moves(&mut self, dt: Seconds) {
        for (bot_id, mv) in self.moves.iter_mut() {
            if mv.status != MoveStatus::Moving {
                continue;
            }
            let Some(body) = self.bots.get_mut(bot_id) else {
                mv.status = MoveStatus::Failed;
                continue;
            };

            let to_target = mv.target - body.position;
            let distance = to_target.length();
            if distance <= mv.acceptance_radius {
                mv.status = MoveStatus::Succeeded;
                continue;
            }

            let step = (BOT_SPEED * dt).min(distance);
            let next = body.position + to_target.normalize() * step;
            let (x, y) = self.grid.cell_of(next);
            let blocked_by_wall = self.grid.is_wall(x, y);
            let blocked_by_door = self.doors.values().any(|door| {
                !door.info.is_open && self.grid.cell_of(door.info.position) == (x, y)
            });
            if !blocked_by_wall && !blocked_by_door {
                body.position = next;
            }
            // blocked: the bot pushes against the obstacle and stays put

            if body.position.distance(&mv.target) <= mv.acceptance_radius {
                mv.status = MoveStatus::Succeeded;
            }
        }

        // carried keys travel with their bots
        for body in self.bots.values() {
            if let Some(key_id) = body.carried_key {
                if let Some(key) = self.keys.get_mut(&key_id) {
                    key.info.position = body.position;
                }
            }
        }
    }
}

impl WorldQuery for MazeWorld {
    fn keys(&self) -> Vec<KeyInfo> {
        self.keys.values().map(|k| k.info.clone()).collect()
    }

    fn doors(&self) -> Vec<DoorInfo> {
        self.doors.values().map(|d| d.info).collect()
    }

    fn exits(&self) -> Vec<ExitInfo> {
        self.exit_order
            .iter()
            .filter_map(|id| self.exits.get(id).map(|e| e.info))
            .collect()
    }

    fn position_of(&self, id: EntityId) -> Option<Vec3> {
        if let Some(bot) = self.bots.get(&id) {
            return Some(bot.position);
        }
        if let Some(key) = self.keys.get(&id) {
            return Some(key.info.position);
        }
        if let Some(door) = self.doors.get(&id) {
            return Some(door.info.position);
        }
        self.exits.get(&id).map(|exit| exit.info.position)
    }

    fn carried_key(&self, bot: EntityId) -> Option<KeyInfo> {
        let body = self.bots.get(&bot)?;
        let key_id = body.carried_key?;
        self.keys.get(&key_id).map(|k| k.info.clone())
    }

    fn can_interact(&self, target: EntityId, actor: EntityId) -> bool {
        let Some(body) = self.bots.get(&actor) else {
            return false;
        };
        let carried = body
            .carried_key
            .and_then(|id| self.keys.get(&id))
            .map(|k| k.info.signature);

        if let Some(key) = self.keys.get(&target) {
            return key.can_interact_with(body, carried);
        }
        if let Some(door) = self.doors.get(&target) {
            return door.can_interact_with(body, carried);
        }
        if let Some(exit) = self.exits.get(&target) {
            return exit.can_interact_with(body, carried);
        }
        false
    }

    fn interact(&mut self, target: EntityId, actor: EntityId) -> InteractionOutcome {
        if !self.can_interact(target, actor) {
            return InteractionOutcome::Refused;
        }
        let Some(mut body) = self.bots.get(&actor).cloned() else {
            return InteractionOutcome::Refused;
        };

        let outcome = if let Some(key) = self.keys.get_mut(&target) {
            let spot = key.info.position;
            let outcome = key.interact_with(&mut body);
            if let InteractionOutcome::PickedUpKey { dropped: Some(old) } = outcome {
                // the previous key lands where the new one was
                if let Some(old_key) = self.keys.get_mut(&old) {
                    old_key.info.on_ground = true;
                    old_key.info.position = spot;
                }
            }
            outcome
        } else if let Some(door) = self.doors.get_mut(&target) {
            door.interact_with(&mut body)
        } else if let Some(exit) = self.exits.get_mut(&target) {
            let outcome = exit.interact_with(&mut body);
            if outcome == InteractionOutcome::ReachedExit {
                self.escaped.push(actor);
            }
            outcome
        } else {
            InteractionOutcome::Refused
        };

        self.bots.insert(actor, body);
        outcome
    }
}

impl Navigator for MazeWorld {
    fn project_to_navigable(&self, point: Vec3, tolerance: f32) -> bool {
        if self.walkable_at(point) {
            return true;
        }
        // probe the four neighboring cell centers within tolerance
        let (x, y) = self.grid.cell_of(point);
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .iter()
            .any(|&(nx, ny)| {
                let center = self.grid.center_of(nx, ny);
                center.distance(&point) <= tolerance && self.walkable_at(center)
            })
    }

    fn find_random_reachable_point(&mut self, origin: Vec3, radius: f32) -> Option<Vec3> {
        for _ in 0..32 {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let dist = self.rng.gen_range(0.0..radius);
            let candidate = origin + Vec3::new(angle.cos() * dist, angle.sin() * dist, 0.0);
            let (x, y) = self.grid.cell_of(candidate);
            let center = self.grid.center_of(x, y);
            if self.walkable_at(center) {
                return Some(center);
            }
        }
        None
    }

    fn request_move_to(
        &mut self,
        bot: EntityId,
        point: Vec3,
        acceptance_radius: f32,
    ) -> Option<MoveHandle> {
        if !self.bots.contains_key(&bot) {
            return None;
        }
        // reject targets in solid space outright, like a failed path query
        if !self.walkable_at(point) && !self.project_to_navigable(point, acceptance_radius) {
            return None;
        }
        let handle = MoveHandle(self.next_handle);
        self.next_handle += 1;
        self.moves.insert(
            bot,
            ActiveMove {
                handle,
                target: point,
                acceptance_radius,
                status: MoveStatus::Moving,
            },
        );
        Some(handle)
    }

    fn move_status(&self, handle: MoveHandle) -> MoveStatus {
        self.moves
            .values()
            .find(|mv| mv.handle == handle)
            .map(|mv| mv.status)
            .unwrap_or(MoveStatus::Idle)
    }

    fn current_status(&self, bot: EntityId) -> MoveStatus {
        self.moves
            .get(&bot)
            .map(|mv| mv.status)
            .unwrap_or(MoveStatus::Idle)
    }

    fn stop_movement(&mut self, bot: EntityId) {
        self.moves.remove(&bot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_world() -> MazeWorld {
        MazeWorld::new(MazeGrid::new(20, 20, 100.0), 7)
    }

    #[test]
    fn test_walls_are_not_walkable() {
        let world = open_world();
        assert!(!world.walkable_at(Vec3::new(50.0, 50.0, 0.0))); // border cell
        assert!(world.walkable_at(Vec3::new(550.0, 550.0, 0.0)));
    }

    #[test]
    fn test_closed_door_blocks_cell_until_opened() {
        let mut world = open_world();
        let spot = Vec3::new(550.0, 550.0, 0.0);
        let door = world.add_door(DoorMask(0b1), spot);
        assert!(!world.walkable_at(spot));

        world.doors.get_mut(&door).unwrap().info.is_open = true;
        assert!(world.walkable_at(spot));
    }

    #[test]
    fn test_move_completes_in_open_space() {
        let mut world = open_world();
        let bot = world.add_bot(Vec3::new(250.0, 250.0, 0.0));
        let target = Vec3::new(850.0, 250.0, 0.0);
        let handle = world.request_move_to(bot, target, 50.0).unwrap();

        for _ in 0..100 {
            world.step_moves(0.1);
        }
        assert_eq!(world.move_status(handle), MoveStatus::Succeeded);
        assert!(world.bot(bot).unwrap().position.distance(&target) <= 50.0);
    }

    #[test]
    fn test_move_against_wall_stalls() {
        let mut world = open_world();
        let bot = world.add_bot(Vec3::new(250.0, 250.0, 0.0));
        // target inside the border wall is rejected outright
        assert!(world
            .request_move_to(bot, Vec3::new(50.0, 250.0, 0.0), 10.0)
            .is_none());

        // a reachable-looking target behind a wall line stalls the bot
        for x in 0..20 {
            world.grid.set_wall(x, 5);
        }
        let handle = world
            .request_move_to(bot, Vec3::new(250.0, 850.0, 0.0), 10.0)
            .unwrap();
        for _ in 0..50 {
            world.step_moves(0.1);
        }
        assert_eq!(world.move_status(handle), MoveStatus::Moving);
        assert!(world.bot(bot).unwrap().position.y < 500.0);
    }

    #[test]
    fn test_pickup_swaps_carried_key() {
        let mut world = open_world();
        let spot_a = Vec3::new(250.0, 250.0, 0.0);
        let spot_b = Vec3::new(300.0, 250.0, 0.0);
        let bot = world.add_bot(spot_a);
        let first = world.add_key("first", KeySignature(0b01), spot_a);
        let second = world.add_key("second", KeySignature(0b10), spot_b);

        assert_eq!(
            world.interact(first, bot),
            InteractionOutcome::PickedUpKey { dropped: None }
        );
        assert_eq!(
            world.interact(second, bot),
            InteractionOutcome::PickedUpKey { dropped: Some(first) }
        );

        // the first key is back on the ground where the second one was
        let dropped = world.keys.get(&first).unwrap();
        assert!(dropped.info.on_ground);
        assert_eq!(dropped.info.position, spot_b);
        assert_eq!(world.carried_key(bot).unwrap().id, second);
    }

    #[test]
    fn test_door_requires_matching_key_and_keeps_it() {
        let mut world = open_world();
        let spot = Vec3::new(550.0, 550.0, 0.0);
        let bot = world.add_bot(spot + Vec3::new(-60.0, 0.0, 0.0));
        let door = world.add_door(DoorMask(0b10), spot);

        // empty-handed: refused
        assert_eq!(world.interact(door, bot), InteractionOutcome::Refused);

        let key = world.add_key("k", KeySignature(0b10), world.bot(bot).unwrap().position);
        world.interact(key, bot);
        assert_eq!(
            world.interact(door, bot),
            InteractionOutcome::OpenedDoor { used_key: key }
        );
        assert!(world.doors.get(&door).unwrap().info.is_open);
        // opening does not consume the key
        assert_eq!(world.carried_key(bot).unwrap().id, key);
    }

    #[test]
    fn test_exit_marks_bot_escaped() {
        let mut world = open_world();
        let spot = Vec3::new(550.0, 550.0, 0.0);
        let bot = world.add_bot(spot);
        let exit = world.add_exit(spot);
        assert_eq!(world.interact(exit, bot), InteractionOutcome::ReachedExit);
        assert_eq!(world.escaped(), &[bot]);
    }

    #[test]
    fn test_kind_queries_pick_nearest_and_first() {
        use crate::world::EntityKind;

        let mut world = open_world();
        let origin = Vec3::new(250.0, 250.0, 0.0);
        let near = world.add_key("near", KeySignature(0b01), Vec3::new(450.0, 250.0, 0.0));
        world.add_key("far", KeySignature(0b10), Vec3::new(1450.0, 1450.0, 0.0));
        let first_exit = world.add_exit(Vec3::new(1050.0, 1050.0, 0.0));
        world.add_exit(Vec3::new(250.0, 350.0, 0.0));

        let nearest = world.find_nearest_of_kind(EntityKind::Key, origin).unwrap();
        assert_eq!(nearest.id, near);

        // first in insertion order, not nearest
        let exit = world.find_first_of_kind(EntityKind::Exit).unwrap();
        assert_eq!(exit.id, first_exit);

        assert!(world.find_nearest_of_kind(EntityKind::Bot, origin).is_none());
    }

    #[test]
    fn test_random_reachable_point_is_walkable() {
        let mut world = open_world();
        let origin = Vec3::new(1000.0, 1000.0, 0.0);
        for _ in 0..10 {
            let point = world.find_random_reachable_point(origin, 500.0).unwrap();
            assert!(world.walkable_at(point));
        }
    }
}
