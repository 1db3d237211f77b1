//! # Viewport Extraction
//!
//! Turns a camera rectangle into a tile grid plus the entities inside it.
//!
//! ## Windowing
//!
//! ```text
//! width  = clamp(floor(viewport_width),  1, 255)
//! height = clamp(floor(viewport_height), 1, 255), then capped so the grid fits a frame
//! origin = floor(camera) - size / 2            per axis
//! origin = clamp(origin, 0, min(hint, world) - size)   when a hint is present and the rect fits
//! ```
//!
//! Cells off the world or in ungenerated chunks come back as the sentinel
//! tile. Entity coordinates are relative to the window origin.

use std::sync::Arc;

use tessera_core::{EntityRegistry, EntityState, World, WorldPos};

use crate::protocol::{
    EntityRecord, ViewportData, ViewportRequest, MAX_PAYLOAD_LEN, TILE_RECORD_LEN,
    VIEWPORT_DATA_HEADER_LEN,
};

/// Largest grid dimension on the wire.
pub const MAX_VIEWPORT_DIMENSION: u8 = u8::MAX;

/// Most tiles a single frame can carry.
pub const MAX_VIEWPORT_CELLS: usize = (MAX_PAYLOAD_LEN - VIEWPORT_DATA_HEADER_LEN) / TILE_RECORD_LEN;

/// Resolved rectangle in world tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportWindow {
    /// Top-left world tile.
    pub origin: WorldPos,
    /// Columns.
    pub width: u8,
    /// Rows.
    pub height: u8,
}

impl ViewportWindow {
    /// Resolves a request against a world `world_tiles` wide and high.
    #[must_use]
    pub fn resolve(request: &ViewportRequest, world_tiles: i32) -> Self {
        let width = tile_count(request.viewport_width);
        let mut height = tile_count(request.viewport_height);

        let max_height = MAX_VIEWPORT_CELLS / usize::from(width);
        if usize::from(height) > max_height {
            height = u8::try_from(max_height).unwrap_or(MAX_VIEWPORT_DIMENSION);
        }

        let x = axis_origin(request.camera_x, width, request.world_width, world_tiles);
        let y = axis_origin(request.camera_y, height, request.world_height, world_tiles);

        Self {
            origin: WorldPos::new(x, y),
            width,
            height,
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn cells(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Returns true if `pos` lies inside the window.
    #[must_use]
    pub fn contains(&self, pos: WorldPos) -> bool {
        self.relative(pos).is_some()
    }

    fn relative(&self, pos: WorldPos) -> Option<(u8, u8)> {
        let dx = u8::try_from(pos.x.checked_sub(self.origin.x)?).ok()?;
        let dy = u8::try_from(pos.y.checked_sub(self.origin.y)?).ok()?;
        (dx < self.width && dy < self.height).then_some((dx, dy))
    }

    fn record(&self, state: &EntityState) -> Option<EntityRecord> {
        let (x, y) = self.relative(state.position)?;
        Some(EntityRecord {
            x,
            y,
            id: state.wire_id,
            action: state.action as u8,
            kind: state.kind,
            direction: state.facing as u8,
        })
    }
}

/// Floors a requested dimension and clamps it to `[1, 255]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tile_count(requested: f32) -> u8 {
    if requested.is_nan() {
        return 1;
    }
    requested.floor().clamp(1.0, f32::from(MAX_VIEWPORT_DIMENSION)) as u8
}

/// Saturating floor; NaN maps to zero.
#[allow(clippy::cast_possible_truncation)]
fn floor_tile(value: f32) -> i32 {
    value.floor() as i32
}

fn axis_origin(camera: f32, size: u8, hint: Option<f32>, world_tiles: i32) -> i32 {
    let size = i32::from(size);
    let origin = floor_tile(camera).saturating_sub(size / 2);
    match hint.filter(|h| *h >= 1.0) {
        Some(hint) => {
            let bound = floor_tile(hint).min(world_tiles);
            if size <= bound {
                origin.clamp(0, bound - size)
            } else {
                origin
            }
        }
        None => origin,
    }
}

/// Reads viewports out of the shared world and entity state.
#[derive(Clone)]
pub struct ViewportExtractor {
    world: Arc<World>,
    entities: Arc<EntityRegistry>,
}

impl ViewportExtractor {
    /// Creates an extractor over shared state.
    #[must_use]
    pub fn new(world: Arc<World>, entities: Arc<EntityRegistry>) -> Self {
        Self { world, entities }
    }

    /// Window a request resolves to.
    #[must_use]
    pub fn window(&self, request: &ViewportRequest) -> ViewportWindow {
        ViewportWindow::resolve(request, self.world.size_in_tiles())
    }

    /// Builds the snapshot for a request.
    ///
    /// Chunks are read one at a time; a snapshot spanning several chunks may
    /// mix state from either side of a concurrent tick.
    #[must_use]
    pub fn extract(&self, request: &ViewportRequest) -> ViewportData {
        let window = self.window(request);
        let tiles = self.world.tiles_in_area(
            window.origin,
            usize::from(window.width),
            usize::from(window.height),
        );

        let mut entities: Vec<EntityRecord> = self
            .entities
            .entities_in_rect(window.origin, u32::from(window.width), u32::from(window.height))
            .iter()
            .filter_map(|(_, state)| window.record(state))
            .collect();
        entities.sort_unstable_by_key(|e| e.id);

        tracing::trace!(
            x = window.origin.x,
            y = window.origin.y,
            width = window.width,
            height = window.height,
            entities = entities.len(),
            "viewport extracted"
        );

        ViewportData {
            width: window.width,
            height: window.height,
            tiles,
            entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{EntityAction, Facing, Tile};
    use tessera_procedural::WorldGenerator;

    fn generated(size: u8) -> Arc<World> {
        let world = World::new(size);
        WorldGenerator::new().generate(&world).unwrap();
        Arc::new(world)
    }

    #[test]
    fn test_dimensions_floor_and_clamp() {
        assert_eq!(tile_count(20.9), 20);
        assert_eq!(tile_count(0.2), 1);
        assert_eq!(tile_count(-4.0), 1);
        assert_eq!(tile_count(f32::NAN), 1);
        assert_eq!(tile_count(1000.0), 255);
        assert_eq!(tile_count(f32::INFINITY), 255);
    }

    #[test]
    fn test_window_centres_on_camera() {
        let window = ViewportWindow::resolve(&ViewportRequest::new(10.5, -3.0, 20.0, 15.0), 128);
        assert_eq!(window.width, 20);
        assert_eq!(window.height, 15);
        assert_eq!(window.origin, WorldPos::new(0, -10));
    }

    #[test]
    fn test_window_grid_fits_frame() {
        let window = ViewportWindow::resolve(&ViewportRequest::new(0.0, 0.0, 255.0, 255.0), 128);
        assert_eq!(window.width, 255);
        assert!(window.cells() <= MAX_VIEWPORT_CELLS);
        assert_eq!(usize::from(window.height), MAX_VIEWPORT_CELLS / 255);
    }

    #[test]
    fn test_world_hints_clamp_camera() {
        let request = ViewportRequest::new(2.0, 126.0, 10.0, 10.0).with_world_hints(128.0, 128.0);
        let window = ViewportWindow::resolve(&request, 128);
        assert_eq!(window.origin, WorldPos::new(0, 118));

        // The hint never widens past the real world.
        let request = ViewportRequest::new(500.0, 5.0, 10.0, 10.0).with_world_hints(1000.0, 1000.0);
        assert_eq!(ViewportWindow::resolve(&request, 128).origin.x, 118);

        // A rectangle wider than the bound is left alone.
        let request = ViewportRequest::new(0.0, 0.0, 200.0, 10.0).with_world_hints(128.0, 128.0);
        assert_eq!(ViewportWindow::resolve(&request, 128).origin.x, -100);
    }

    #[test]
    fn test_inside_world_has_no_sentinels() {
        let world = generated(4);
        let extractor = ViewportExtractor::new(Arc::clone(&world), Arc::new(EntityRegistry::new()));
        let request = ViewportRequest::new(32.0, 32.0, 20.0, 15.0);
        let window = extractor.window(&request);
        let data = extractor.extract(&request);

        assert_eq!(data.tiles.len(), 20 * 15);
        assert!(data.tiles.iter().all(|t| !t.is_sentinel()));
        for y in 0..data.height {
            for x in 0..data.width {
                let pos = window.origin.offset(i32::from(x), i32::from(y));
                assert_eq!(data.tile(x, y), Some(world.get_tile(pos).unwrap()));
            }
        }
    }

    #[test]
    fn test_edge_cells_are_sentinel() {
        let world = generated(2);
        let extractor = ViewportExtractor::new(Arc::clone(&world), Arc::new(EntityRegistry::new()));
        let data = extractor.extract(&ViewportRequest::new(0.0, 0.0, 10.0, 10.0));

        // Origin is (-5, -5): the first five rows and columns are off-world.
        for y in 0..10u8 {
            for x in 0..10u8 {
                let tile = data.tile(x, y).unwrap();
                if x < 5 || y < 5 {
                    assert_eq!(tile, Tile::SENTINEL);
                } else {
                    let pos = WorldPos::new(i32::from(x) - 5, i32::from(y) - 5);
                    assert_eq!(tile, world.get_tile(pos).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_entities_relative_to_window() {
        let world = generated(2);
        let entities = Arc::new(EntityRegistry::new());
        let inside = entities.register(WorldPos::new(12, 9), 3).unwrap();
        entities.register(WorldPos::new(30, 30), 3).unwrap();
        entities.set_action(inside, EntityAction::Attacking);
        entities.set_facing(inside, Facing::Left);

        let extractor = ViewportExtractor::new(world, Arc::clone(&entities));
        let data = extractor.extract(&ViewportRequest::new(10.0, 10.0, 8.0, 8.0));

        assert_eq!(data.entities.len(), 1);
        let record = data.entities[0];
        assert_eq!((record.x, record.y), (6, 3));
        assert_eq!(record.id, entities.get(inside).unwrap().wire_id);
        assert_eq!(record.action, EntityAction::Attacking as u8);
        assert_eq!(record.direction, Facing::Left as u8);
        assert_eq!(record.kind, 3);
    }
}
