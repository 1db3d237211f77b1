//! # Entity State
//!
//! Transient per-entity records read by viewport extraction and written by
//! whatever gameplay systems own the entity.
//!
//! Entities are keyed by a 128-bit [`EntityId`]. Each also carries a 32-bit
//! wire id that goes into viewport frames; wire ids are recycled on removal.

use dashmap::DashMap;
use uuid::Uuid;

use crate::coords::WorldPos;
use crate::error::WorldResult;
use crate::ids::IdPool;

/// Unique entity identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What an entity is currently doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityAction {
    /// Standing still.
    #[default]
    Idle = 0,
    /// Walking between tiles.
    Moving = 1,
    /// Attacking.
    Attacking = 2,
}

/// Direction an entity faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Facing {
    /// Towards negative Y.
    Up = 0,
    /// Towards positive X.
    Right = 1,
    /// Towards positive Y.
    Down = 2,
    /// Towards negative X.
    Left = 3,
    /// No facing.
    #[default]
    None = 4,
}

impl Facing {
    /// Facing from `from` towards `to`; the dominant axis wins, X on ties.
    #[must_use]
    pub fn towards(from: WorldPos, to: WorldPos) -> Self {
        let dx = to.x.saturating_sub(from.x);
        let dy = to.y.saturating_sub(from.y);
        if dx == 0 && dy == 0 {
            Self::None
        } else if dx.unsigned_abs() >= dy.unsigned_abs() {
            if dx > 0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if dy > 0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// Live state of one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityState {
    /// Tile the entity stands on.
    pub position: WorldPos,
    /// Current action.
    pub action: EntityAction,
    /// Facing direction.
    pub facing: Facing,
    /// Entity type byte, opaque to the core.
    pub kind: u8,
    /// Compact id used on the wire.
    pub wire_id: i32,
}

/// Concurrent registry of live entities.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Entity records.
    entities: DashMap<EntityId, EntityState>,
    /// Wire id allocator.
    wire_ids: IdPool,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new idle entity.
    ///
    /// # Errors
    ///
    /// `IdPoolExhausted` if no wire id is left.
    pub fn register(&self, position: WorldPos, kind: u8) -> WorldResult<EntityId> {
        let wire_id = self.wire_ids.acquire()?;
        let id = EntityId::new_v4();
        self.entities.insert(
            id,
            EntityState {
                position,
                action: EntityAction::Idle,
                facing: Facing::None,
                kind,
                wire_id,
            },
        );
        tracing::debug!(entity = %id, wire_id, "entity registered");
        Ok(id)
    }

    /// Removes an entity, returning its last state.
    pub fn remove(&self, id: EntityId) -> Option<EntityState> {
        let (_, state) = self.entities.remove(&id)?;
        self.wire_ids.release(state.wire_id);
        Some(state)
    }

    /// Copies an entity's state.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<EntityState> {
        self.entities.get(&id).map(|entry| *entry.value())
    }

    /// Mutates an entity in place. Returns false if it does not exist.
    pub fn update(&self, id: EntityId, f: impl FnOnce(&mut EntityState)) -> bool {
        match self.entities.get_mut(&id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Moves an entity and turns it towards the new position.
    pub fn set_position(&self, id: EntityId, position: WorldPos) -> bool {
        self.update(id, |state| {
            let facing = Facing::towards(state.position, position);
            if facing != Facing::None {
                state.facing = facing;
            }
            state.position = position;
        })
    }

    /// Sets an entity's action.
    pub fn set_action(&self, id: EntityId, action: EntityAction) -> bool {
        self.update(id, |state| state.action = action)
    }

    /// Sets an entity's facing.
    pub fn set_facing(&self, id: EntityId, facing: Facing) -> bool {
        self.update(id, |state| state.facing = facing)
    }

    /// Snapshot of entities standing inside the rectangle
    /// `[min.x, min.x + width) x [min.y, min.y + height)`.
    ///
    /// Each entity appears at most once; order is unspecified.
    #[must_use]
    pub fn entities_in_rect(&self, min: WorldPos, width: u32, height: u32) -> Vec<(EntityId, EntityState)> {
        let max_x = i64::from(min.x) + i64::from(width);
        let max_y = i64::from(min.y) + i64::from(height);
        self.entities
            .iter()
            .filter(|entry| {
                let pos = entry.value().position;
                pos.x >= min.x && pos.y >= min.y && i64::from(pos.x) < max_x && i64::from(pos.y) < max_y
            })
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_remove_recycles_wire_id() {
        let registry = EntityRegistry::new();
        let a = registry.register(WorldPos::new(1, 1), 3).unwrap();
        let b = registry.register(WorldPos::new(2, 2), 3).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(a).unwrap();
        assert_eq!(removed.wire_id, 1);
        assert!(registry.get(a).is_none());

        let c = registry.register(WorldPos::new(0, 0), 1).unwrap();
        assert_eq!(registry.get(c).map(|s| s.wire_id), Some(1));
        assert!(registry.remove(a).is_none());
    }

    #[test]
    fn test_mutators() {
        let registry = EntityRegistry::new();
        let id = registry.register(WorldPos::new(5, 5), 0).unwrap();

        assert!(registry.set_position(id, WorldPos::new(6, 5)));
        assert!(registry.set_action(id, EntityAction::Moving));
        let state = registry.get(id).unwrap();
        assert_eq!(state.position, WorldPos::new(6, 5));
        assert_eq!(state.facing, Facing::Right);
        assert_eq!(state.action, EntityAction::Moving);

        assert!(registry.set_facing(id, Facing::Up));
        assert_eq!(registry.get(id).unwrap().facing, Facing::Up);

        assert!(!registry.set_action(EntityId::new_v4(), EntityAction::Idle));
    }

    #[test]
    fn test_entities_in_rect() {
        let registry = EntityRegistry::new();
        let inside = registry.register(WorldPos::new(10, 10), 0).unwrap();
        let _edge = registry.register(WorldPos::new(20, 10), 0).unwrap();
        let corner = registry.register(WorldPos::new(19, 19), 0).unwrap();

        let mut found: Vec<EntityId> = registry
            .entities_in_rect(WorldPos::new(10, 10), 10, 10)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        found.sort();
        let mut expected = vec![inside, corner];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_facing_towards() {
        let origin = WorldPos::new(0, 0);
        assert_eq!(Facing::towards(origin, WorldPos::new(0, -3)), Facing::Up);
        assert_eq!(Facing::towards(origin, WorldPos::new(-3, 1)), Facing::Left);
        assert_eq!(Facing::towards(origin, WorldPos::new(0, 2)), Facing::Down);
        assert_eq!(Facing::towards(origin, origin), Facing::None);
    }
}
