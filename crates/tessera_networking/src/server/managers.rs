//! # World Managers
//!
//! Tick components answering bus requests against shared world state.
//! Each drains its subscription once per tick and resolves results through
//! a correlation bridge.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use tessera_core::{Tile, World, WorldResult};

use super::tick::{Lifecycle, LifecycleError};
use crate::bridge::CorrelationBridge;
use crate::events::{EventBus, EventKind, WorldEvent};
use crate::protocol::ViewportData;
use crate::viewport::ViewportExtractor;

/// Answers viewport requests.
pub struct ViewportManager {
    events: Option<Receiver<WorldEvent>>,
    extractor: ViewportExtractor,
    bridge: Arc<CorrelationBridge<ViewportData>>,
    served: u64,
}

impl ViewportManager {
    /// Subscribes to viewport requests on `bus`.
    #[must_use]
    pub fn new(
        bus: &EventBus,
        extractor: ViewportExtractor,
        bridge: Arc<CorrelationBridge<ViewportData>>,
    ) -> Self {
        Self {
            events: Some(bus.subscribe(EventKind::ViewportRequest)),
            extractor,
            bridge,
            served: 0,
        }
    }

    /// Requests answered so far.
    #[must_use]
    pub const fn served(&self) -> u64 {
        self.served
    }
}

impl Lifecycle for ViewportManager {
    fn name(&self) -> &str {
        "viewport_manager"
    }

    fn update(&mut self, _delta_seconds: f32) {
        let Some(events) = &self.events else {
            return;
        };
        for event in events.try_iter() {
            if let WorldEvent::ViewportRequest(query) = event {
                let data = self.extractor.extract(&query.request);
                if !self.bridge.resolve(query.callback_id, data) {
                    tracing::debug!(callback_id = %query.callback_id, "viewport result discarded");
                }
                self.served += 1;
            }
        }
    }

    fn destroy(&mut self) -> Result<(), LifecycleError> {
        // Dropping the receiver unsubscribes on the next emit.
        self.events = None;
        tracing::debug!(served = self.served, "viewport manager stopped");
        Ok(())
    }
}

/// Answers tile reads and applies tile edits.
pub struct MapManager {
    events: Option<Receiver<WorldEvent>>,
    world: Arc<World>,
    bridge: Arc<CorrelationBridge<WorldResult<Tile>>>,
}

impl MapManager {
    /// Subscribes to tile queries and edits on `bus`.
    #[must_use]
    pub fn new(bus: &EventBus, world: Arc<World>, bridge: Arc<CorrelationBridge<WorldResult<Tile>>>) -> Self {
        Self {
            events: Some(bus.subscribe_all(&[EventKind::TileQuery, EventKind::ModifyTile])),
            world,
            bridge,
        }
    }

    fn handle(&self, event: WorldEvent) {
        match event {
            WorldEvent::TileQuery {
                position,
                callback_id,
            } => {
                self.bridge.resolve(callback_id, self.world.get_tile(position));
            }
            WorldEvent::ModifyTile { position, edit } => {
                if let Err(e) = self.world.modify_tile(position, edit) {
                    tracing::warn!(x = position.x, y = position.y, error = %e, "tile edit rejected");
                }
            }
            WorldEvent::ViewportRequest(_) => {}
        }
    }
}

impl Lifecycle for MapManager {
    fn name(&self) -> &str {
        "map_manager"
    }

    fn init(&mut self) -> Result<(), LifecycleError> {
        if self.world.is_generated() {
            Ok(())
        } else {
            Err(LifecycleError::new(self.name(), "world has not been generated"))
        }
    }

    fn update(&mut self, _delta_seconds: f32) {
        let Some(events) = &self.events else {
            return;
        };
        for event in events.try_iter() {
            self.handle(event);
        }
    }

    fn destroy(&mut self) -> Result<(), LifecycleError> {
        self.events = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::CallbackId;
    use crate::events::ViewportQuery;
    use crate::protocol::ViewportRequest;
    use tessera_core::{EntityRegistry, TileEdit, TileSurface, WorldError, WorldPos};
    use tessera_procedural::{GeneratorMode, WorldGenerator};

    fn flat_world() -> Arc<World> {
        let world = World::new(2);
        WorldGenerator::new()
            .with_mode(GeneratorMode::Flat)
            .generate(&world)
            .unwrap();
        Arc::new(world)
    }

    #[test]
    fn test_viewport_manager_resolves_on_tick() {
        let bus = EventBus::new();
        let bridge = Arc::new(CorrelationBridge::new());
        let extractor = ViewportExtractor::new(flat_world(), Arc::new(EntityRegistry::new()));
        let mut manager = ViewportManager::new(&bus, extractor, Arc::clone(&bridge));

        let (callback_id, mut rx) = bridge.register_future();
        bus.emit(WorldEvent::ViewportRequest(ViewportQuery {
            request: ViewportRequest::new(8.0, 8.0, 4.0, 3.0),
            callback_id,
        }));
        assert!(rx.try_recv().is_err());

        manager.update(0.016);
        let data = rx.try_recv().unwrap();
        assert_eq!((data.width, data.height), (4, 3));
        assert_eq!(manager.served(), 1);
        assert_eq!(bridge.pending(), 0);
    }

    #[test]
    fn test_viewport_manager_unsubscribes_on_destroy() {
        let bus = EventBus::new();
        let extractor = ViewportExtractor::new(flat_world(), Arc::new(EntityRegistry::new()));
        let mut manager = ViewportManager::new(&bus, extractor, Arc::new(CorrelationBridge::new()));
        manager.destroy().unwrap();

        let delivered = bus.emit(WorldEvent::ViewportRequest(ViewportQuery {
            request: ViewportRequest::new(0.0, 0.0, 1.0, 1.0),
            callback_id: CallbackId::new_v4(),
        }));
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_map_manager_query_and_edit() {
        let bus = EventBus::new();
        let world = flat_world();
        let bridge = Arc::new(CorrelationBridge::new());
        let mut manager = MapManager::new(&bus, Arc::clone(&world), Arc::clone(&bridge));
        manager.init().unwrap();

        let target = WorldPos::new(3, 4);
        bus.emit(WorldEvent::ModifyTile {
            position: target,
            edit: TileEdit::surface(TileSurface::SNOW),
        });
        let (inside, mut inside_rx) = bridge.register_future();
        let (outside, mut outside_rx) = bridge.register_future();
        bus.emit(WorldEvent::TileQuery {
            position: target,
            callback_id: inside,
        });
        bus.emit(WorldEvent::TileQuery {
            position: WorldPos::new(-1, 0),
            callback_id: outside,
        });

        manager.update(0.016);

        assert_eq!(world.get_tile(target).unwrap().surface, TileSurface::SNOW.bits());
        assert_eq!(inside_rx.try_recv().unwrap().unwrap().surface, TileSurface::SNOW.bits());
        assert_eq!(
            outside_rx.try_recv().unwrap(),
            Err(WorldError::OutOfBounds { x: -1, y: 0 })
        );
    }

    #[test]
    fn test_map_manager_requires_generated_world() {
        let bus = EventBus::new();
        let mut manager = MapManager::new(&bus, Arc::new(World::new(2)), Arc::new(CorrelationBridge::new()));
        assert!(manager.init().is_err());
    }
}
