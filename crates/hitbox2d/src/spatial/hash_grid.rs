//! Uniform spatial hash grid

use std::collections::HashSet;

use log::debug;
use slotmap::SlotMap;

use super::{BoundedObject, CellRange, Client, ClientHandle, GridLayout, SpatialError, SpatialQuery, Viewport};
use crate::config::GridConfig;
use crate::foundation::math::Vec2;
use crate::physics::collision::BoundingBox;

/// Spatial hash grid over a bounded 2D world
///
/// Each client is a member of every cell its bounding box covers.
pub struct SpatialHashGrid<T> {
    layout: GridLayout,
    cells: Vec<HashSet<ClientHandle>>,
    clients: SlotMap<ClientHandle, Client<T>>,
}

impl<T: BoundedObject> SpatialHashGrid<T> {
    /// Create an empty grid
    pub fn new(
        origin: Vec2,
        world_size: Vec2,
        cells_per_row: usize,
        cells_per_column: usize,
    ) -> Result<Self, SpatialError> {
        let layout = GridLayout::new(origin, world_size, cells_per_row, cells_per_column)?;
        debug!(
            "Spatial hash grid: {}x{} cells of {:?} from {:?}",
            cells_per_row,
            cells_per_column,
            layout.cell_size(),
            origin
        );
        Ok(Self {
            cells: vec![HashSet::new(); layout.cell_count()],
            layout,
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
        )
    }

    /// Cell geometry
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Cell containing `(x, y)`, clamped to the grid
    pub fn cell_index_for(&self, x: f32, y: f32) -> (usize, usize) {
        self.layout.cell_index_for(x, y)
    }

    /// Members of cell `(ix, iy)`, `None` outside the grid
    pub fn cell(&self, ix: usize, iy: usize) -> Option<&HashSet<ClientHandle>> {
        if ix >= self.layout.cells_per_row() || iy >= self.layout.cells_per_column() {
            return None;
        }
        self.cells.get(self.layout.flat_index((ix, iy)))
    }

    /// Client record, including the cells it occupies
    pub fn client(&self, handle: ClientHandle) -> Option<&Client<T>> {
        self.clients.get(handle)
    }

    /// Clients near the rectangle `(x, y, w, h)`
    pub fn find_near_rect(&self, x: f32, y: f32, w: f32, h: f32) -> HashSet<ClientHandle> {
        self.find_near(&BoundingBox::new(x, y, w, h))
    }

    /// Clients near a camera view
    pub fn find_near_viewport(&self, viewport: &Viewport) -> HashSet<ClientHandle> {
        self.find_near(&viewport.bounds())
    }

    /// Iterate over every stored object
    pub fn iter(&self) -> impl Iterator<Item = (ClientHandle, &T)> {
        self.clients.iter().map(|(handle, client)| (handle, &client.object))
    }

    fn insert_into_cells(&mut self, handle: ClientHandle, range: CellRange) {
        for cell in range.cells() {
            self.cells[self.layout.flat_index(cell)].insert(handle);
        }
    }

    fn remove_from_cells(&mut self, handle: ClientHandle, range: CellRange) {
        for cell in range.cells() {
            self.cells[self.layout.flat_index(cell)].remove(&handle);
        }
    }
}

impl<T: BoundedObject> SpatialQuery<T> for SpatialHashGrid<T> {
    fn add(&mut self, object: T) -> ClientHandle {
        let cells = self.layout.cell_range(&object.bounding_box());
        let handle = self.clients.insert(Client { object, cells });
        self.insert_into_cells(handle, cells);
        handle
    }

    fn remove(&mut self, handle: ClientHandle) -> Option<T> {
        let client = self.clients.remove(handle)?;
        self.remove_from_cells(handle, client.cells);
        Some(client.object)
    }

    fn update(&mut self, handle: ClientHandle) -> bool {
        let Some(client) = self.clients.get(handle) else {
            return false;
        };
        let previous = client.cells;
        let current = self.layout.cell_range(&client.object.bounding_box());
        if previous == current {
            return true;
        }

        self.remove_from_cells(handle, previous);
        self.insert_into_cells(handle, current);
        if let Some(client) = self.clients.get_mut(handle) {
            client.cells = current;
        }
        true
    }

    fn object(&self, handle: ClientHandle) -> Option<&T> {
        self.clients.get(handle).map(|client| &client.object)
    }

    fn object_mut(&mut self, handle: ClientHandle) -> Option<&mut T> {
        self.clients.get_mut(handle).map(|client| &mut client.object)
    }

    fn find_near(&self, area: &BoundingBox) -> HashSet<ClientHandle> {
        let mut near = HashSet::new();
        for cell in self.layout.cell_range(area).cells() {
            near.extend(self.cells[self.layout.flat_index(cell)].iter().copied());
        }
        near
    }

    fn clear(&mut self) {
        self.clients.clear();
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SpatialHashGrid<BoundingBox> {
        SpatialHashGrid::new(Vec2::zeros(), Vec2::new(1000.0, 1000.0), 10, 10).unwrap()
    }

    fn membership(grid: &SpatialHashGrid<BoundingBox>, handle: ClientHandle) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for iy in 0..10 {
            for ix in 0..10 {
                if grid.cell(ix, iy).unwrap().contains(&handle) {
                    cells.push((ix, iy));
                }
            }
        }
        cells
    }

    #[test]
    fn test_client_spanning_boundary_joins_four_cells() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(95.0, 95.0, 10.0, 10.0));

        assert_eq!(membership(&grid, handle), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(grid.client(handle).unwrap().cells().len(), 4);
    }

    #[test]
    fn test_find_near_deduplicates() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(95.0, 95.0, 10.0, 10.0));

        let near = grid.find_near_rect(0.0, 0.0, 199.0, 199.0);
        assert_eq!(near.len(), 1);
        assert!(near.contains(&handle));
    }

    #[test]
    fn test_find_near_only_covered_cells() {
        let mut grid = grid();
        let near_handle = grid.add(BoundingBox::new(10.0, 10.0, 5.0, 5.0));
        let far_handle = grid.add(BoundingBox::new(800.0, 800.0, 5.0, 5.0));

        let near = grid.find_near_rect(0.0, 0.0, 50.0, 50.0);
        assert!(near.contains(&near_handle));
        assert!(!near.contains(&far_handle));
    }

    #[test]
    fn test_out_of_bounds_clients_clamp_to_border() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(-300.0, 2000.0, 10.0, 10.0));

        assert_eq!(membership(&grid, handle), vec![(0, 9)]);
        assert!(grid.find_near_rect(-1000.0, 5000.0, 1.0, 1.0).contains(&handle));
    }

    #[test]
    fn test_remove_erases_every_cell() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(95.0, 95.0, 10.0, 10.0));

        let removed = grid.remove(handle).unwrap();
        assert_eq!(removed, BoundingBox::new(95.0, 95.0, 10.0, 10.0));
        assert!(membership(&grid, handle).is_empty());
        assert_eq!(grid.client_count(), 0);
        assert!(grid.remove(handle).is_none());
    }

    #[test]
    fn test_update_moves_membership() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(95.0, 95.0, 10.0, 10.0));

        // Repeated moves must not grow membership
        for step in 0..5 {
            let object = grid.object_mut(handle).unwrap();
            object.x = 510.0 + step as f32;
            object.y = 510.0;
            assert!(grid.update(handle));
        }

        assert_eq!(membership(&grid, handle), vec![(5, 5)]);
        assert!(!grid.find_near_rect(0.0, 0.0, 150.0, 150.0).contains(&handle));
        assert!(grid.find_near_rect(500.0, 500.0, 10.0, 10.0).contains(&handle));
    }

    #[test]
    fn test_find_near_viewport() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(450.0, 450.0, 20.0, 20.0));

        let viewport = Viewport::new(Vec2::new(400.0, 400.0), 100.0, 100.0);
        assert!(grid.find_near_viewport(&viewport).contains(&handle));

        let elsewhere = Viewport::new(Vec2::new(0.0, 700.0), 100.0, 100.0);
        assert!(grid.find_near_viewport(&elsewhere).is_empty());
    }

    #[test]
    fn test_negative_extent_client_is_still_found() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(250.0, 250.0, -100.0, 10.0));

        assert_eq!(membership(&grid, handle), vec![(1, 2), (2, 2)]);
        assert_eq!(grid.client(handle).unwrap().cells().len(), 2);
        assert!(grid.find_near_rect(0.0, 0.0, 1000.0, 1000.0).contains(&handle));
    }

    #[test]
    fn test_flipped_viewport_still_culls() {
        let mut grid = grid();
        let handle = grid.add(BoundingBox::new(450.0, 450.0, 20.0, 20.0));

        // Mirrored camera: right of the position is negative
        let viewport = Viewport {
            position: Vec2::new(500.0, 400.0),
            left: 0.0,
            right: -100.0,
            bottom: 100.0,
            top: 0.0,
        };
        assert!(grid.find_near_viewport(&viewport).contains(&handle));
    }

    #[test]
    fn test_clear() {
        let mut grid = grid();
        grid.add(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        grid.add(BoundingBox::new(500.0, 500.0, 1.0, 1.0));
        grid.clear();

        assert_eq!(grid.client_count(), 0);
        assert!(grid.find_near_rect(0.0, 0.0, 1000.0, 1000.0).is_empty());
    }
}
