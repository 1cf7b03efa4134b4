//! Spatial hash grid that keeps query results separated by layer
//!
//! Used where one broad-phase pass should answer several questions, e.g.
//! "which enemies and which obstacles are on screen".

use std::collections::HashSet;

use log::{debug, warn};
use slotmap::SlotMap;

use super::{CellRange, ClientHandle, GridLayout, LayeredObject, SpatialError, SpatialQuery, Viewport};
use crate::config::GridConfig;
use crate::foundation::math::Vec2;
use crate::physics::collision::BoundingBox;

/// Grid-owned record of a layered client
#[derive(Debug, Clone)]
pub struct LayeredClient<T> {
    object: T,
    cells: CellRange,
    layer: usize,
}

impl<T> LayeredClient<T> {
    /// The stored object
    pub fn object(&self) -> &T {
        &self.object
    }

    /// Cells the client was inserted into
    pub fn cells(&self) -> CellRange {
        self.cells
    }

    /// Layer the client is filed under (after clamping)
    pub fn layer(&self) -> usize {
        self.layer
    }
}

/// Spatial hash grid with per-layer membership
pub struct LayeredSpatialHashGrid<T> {
    layout: GridLayout,
    layer_count: usize,
    /// Indexed by flat cell index, then layer
    cells: Vec<Vec<HashSet<ClientHandle>>>,
    clients: SlotMap<ClientHandle, LayeredClient<T>>,
}

impl<T: LayeredObject> LayeredSpatialHashGrid<T> {
    /// Create an empty grid with `layer_count` layers
    pub fn new(
        origin: Vec2,
        world_size: Vec2,
        cells_per_row: usize,
        cells_per_column: usize,
        layer_count: usize,
    ) -> Result<Self, SpatialError> {
        if layer_count == 0 {
            return Err(SpatialError::InvalidLayerCount);
        }
        let layout = GridLayout::new(origin, world_size, cells_per_row, cells_per_column)?;
        debug!(
            "Layered spatial hash grid: {}x{} cells, {} layers",
            cells_per_row, cells_per_column, layer_count
        );
        Ok(Self {
            cells: vec![vec![HashSet::new(); layer_count]; layout.cell_count()],
            layout,
            layer_count,
            clients: SlotMap::with_key(),
        })
    }

    /// Create an empty grid from configuration
    pub fn from_config(config: &GridConfig) -> Result<Self, SpatialError> {
        Self::new(
            config.origin,
            config.world_size,
            config.cells_per_row,
            config.cells_per_column,
            config.layers,
        )
    }

    /// Cell geometry
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Client record
    pub fn client(&self, handle: ClientHandle) -> Option<&LayeredClient<T>> {
        self.clients.get(handle)
    }

    /// Clients near `area`, one set per layer
    pub fn find_near_layered(&self, area: &BoundingBox) -> Vec<HashSet<ClientHandle>> {
        let mut layers = vec![HashSet::new(); self.layer_count];
        for cell in self.layout.cell_range(area).cells() {
            let cell_layers = &self.cells[self.layout.flat_index(cell)];
            for (near, members) in layers.iter_mut().zip(cell_layers) {
                near.extend(members.iter().copied());
            }
        }
        layers
    }

    /// Clients near the rectangle `(x, y, w, h)`, one set per layer
    pub fn find_near_rect_layered(&self, x: f32, y: f32, w: f32, h: f32) -> Vec<HashSet<ClientHandle>> {
        self.find_near_layered(&BoundingBox::new(x, y, w, h))
    }

    /// Clients near a camera view, one set per layer
    pub fn find_near_viewport(&self, viewport: &Viewport) -> Vec<HashSet<ClientHandle>> {
        self.find_near_layered(&viewport.bounds())
    }

    fn clamp_layer(&self, layer: usize) -> usize {
        if layer < self.layer_count {
            layer
        } else {
            let clamped = self.layer_count - 1;
            warn!("Layer {} out of range, filing under layer {}", layer, clamped);
            clamped
        }
    }

    fn insert_into_cells(&mut self, handle: ClientHandle, range: CellRange, layer: usize) {
        for cell in range.cells() {
            self.cells[self.layout.flat_index(cell)][layer].insert(handle);
        }
    }

    fn remove_from_cells(&mut self, handle: ClientHandle, range: CellRange, layer: usize) {
        for cell in range.cells() {
            self.cells[self.layout.flat_index(cell)][layer].remove(&handle);
        }
    }
}

impl<T: LayeredObject> SpatialQuery<T> for LayeredSpatialHashGrid<T> {
    fn add(&mut self, object: T) -> ClientHandle {
        let cells = self.layout.cell_range(&object.bounding_box());
        let layer = self.clamp_layer(object.layer());
        let handle = self.clients.insert(LayeredClient { object, cells, layer });
        self.insert_into_cells(handle, cells, layer);
        handle
    }

    fn remove(&mut self, handle: ClientHandle) -> Option<T> {
        let client = self.clients.remove(handle)?;
        self.remove_from_cells(handle, client.cells, client.layer);
        Some(client.object)
    }

    fn update(&mut self, handle: ClientHandle) -> bool {
        let Some(client) = self.clients.get(handle) else {
            return false;
        };
        let (previous_cells, previous_layer) = (client.cells, client.layer);
        let cells = self.layout.cell_range(&client.object.bounding_box());
        let layer = self.clamp_layer(client.object.layer());
        if cells == previous_cells && layer == previous_layer {
            return true;
        }

        self.remove_from_cells(handle, previous_cells, previous_layer);
        self.insert_into_cells(handle, cells, layer);
        if let Some(client) = self.clients.get_mut(handle) {
            client.cells = cells;
            client.layer = layer;
        }
        true
    }

    fn object(&self, handle: ClientHandle) -> Option<&T> {
        self.clients.get(handle).map(|client| &client.object)
    }

    fn object_mut(&mut self, handle: ClientHandle) -> Option<&mut T> {
        self.clients.get_mut(handle).map(|client| &mut client.object)
    }

    /// Union over all layers
    fn find_near(&self, area: &BoundingBox) -> HashSet<ClientHandle> {
        self.find_near_layered(area).into_iter().flatten().collect()
    }

    fn clear(&mut self) {
        self.clients.clear();
        for layers in &mut self.cells {
            for members in layers {
                members.clear();
            }
        }
    }

    fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::BoundedObject;

    #[derive(Debug, Clone, PartialEq)]
    struct Sprite {
        bounds: BoundingBox,
        layer: usize,
    }

    impl BoundedObject for Sprite {
        fn bounding_box(&self) -> BoundingBox {
            self.bounds
        }
    }

    impl LayeredObject for Sprite {
        fn layer(&self) -> usize {
            self.layer
        }
    }

    fn sprite(x: f32, y: f32, layer: usize) -> Sprite {
        Sprite {
            bounds: BoundingBox::new(x, y, 10.0, 10.0),
            layer,
        }
    }

    fn grid() -> LayeredSpatialHashGrid<Sprite> {
        LayeredSpatialHashGrid::new(Vec2::zeros(), Vec2::new(1000.0, 1000.0), 10, 10, 3).unwrap()
    }

    #[test]
    fn test_zero_layers_rejected() {
        let result =
            LayeredSpatialHashGrid::<Sprite>::new(Vec2::zeros(), Vec2::new(10.0, 10.0), 1, 1, 0);
        assert!(matches!(result, Err(SpatialError::InvalidLayerCount)));
    }

    #[test]
    fn test_find_near_splits_by_layer() {
        let mut grid = grid();
        let background = grid.add(sprite(95.0, 95.0, 0));
        let enemy = grid.add(sprite(120.0, 120.0, 2));
        let far_enemy = grid.add(sprite(900.0, 900.0, 2));

        let layers = grid.find_near_rect_layered(0.0, 0.0, 150.0, 150.0);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0], HashSet::from([background]));
        assert!(layers[1].is_empty());
        assert_eq!(layers[2], HashSet::from([enemy]));
        assert!(!layers[2].contains(&far_enemy));

        let union = grid.find_near(&BoundingBox::new(0.0, 0.0, 150.0, 150.0));
        assert_eq!(union, HashSet::from([background, enemy]));
    }

    #[test]
    fn test_out_of_range_layer_is_clamped() {
        let mut grid = grid();
        let handle = grid.add(sprite(10.0, 10.0, 7));

        assert_eq!(grid.client(handle).unwrap().layer(), 2);
        assert!(grid.find_near_rect_layered(0.0, 0.0, 50.0, 50.0)[2].contains(&handle));
    }

    #[test]
    fn test_update_moves_cells_and_layer() {
        let mut grid = grid();
        let handle = grid.add(sprite(95.0, 95.0, 0));

        let object = grid.object_mut(handle).unwrap();
        object.bounds.x = 600.0;
        object.bounds.y = 600.0;
        object.layer = 1;
        assert!(grid.update(handle));

        let old = grid.find_near_rect_layered(0.0, 0.0, 150.0, 150.0);
        assert!(old.iter().all(HashSet::is_empty));

        let new = grid.find_near_rect_layered(600.0, 600.0, 5.0, 5.0);
        assert!(new[0].is_empty());
        assert!(new[1].contains(&handle));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut grid = grid();
        let a = grid.add(sprite(95.0, 95.0, 0));
        grid.add(sprite(300.0, 300.0, 1));

        assert_eq!(grid.remove(a), Some(sprite(95.0, 95.0, 0)));
        assert!(grid.find_near(&BoundingBox::new(0.0, 0.0, 150.0, 150.0)).is_empty());
        assert_eq!(grid.client_count(), 1);

        grid.clear();
        assert_eq!(grid.client_count(), 0);
    }
}
