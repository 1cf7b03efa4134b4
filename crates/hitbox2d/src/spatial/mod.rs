//! Spatial partitioning data structures
//!
//! Uniform spatial hash grids used as the collision broad phase and for
//! camera culling in 2D worlds.
//!
//! Clients are stored in *every* cell their bounding box covers, so a query
//! only has to union the cells its own rectangle covers. Positions outside
//! the world are clamped into the border cells instead of being rejected.

mod hash_grid;
mod layered_grid;
pub mod spatial_query;

pub use hash_grid::SpatialHashGrid;
pub use layered_grid::{LayeredClient, LayeredSpatialHashGrid};
pub use spatial_query::SpatialQuery;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;
use crate::physics::collision::BoundingBox;

slotmap::new_key_type! {
    /// Stable handle to a client stored in a grid
    pub struct ClientHandle;
}

/// Errors raised when building a spatial grid
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Cell counts must be non-zero and the world size positive and finite
    #[error("invalid grid layout: {0}")]
    InvalidLayout(String),

    /// A layered grid needs at least one layer
    #[error("layered grid needs at least one layer")]
    InvalidLayerCount,
}

/// Anything with a world-space axis-aligned bounding box
pub trait BoundedObject {
    /// Current world-space bounds
    fn bounding_box(&self) -> BoundingBox;
}

/// Bounded object tagged with a layer id for the layered grid
pub trait LayeredObject: BoundedObject {
    /// Layer id, `0..layer_count`
    fn layer(&self) -> usize;
}

impl BoundedObject for BoundingBox {
    fn bounding_box(&self) -> BoundingBox {
        *self
    }
}

/// Inclusive rectangle of cell indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Lowest `(ix, iy)` covered
    pub min: (usize, usize),
    /// Highest `(ix, iy)` covered
    pub max: (usize, usize),
}

impl CellRange {
    /// Every `(ix, iy)` in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (min, max) = (self.min, self.max);
        (min.1..=max.1).flat_map(move |iy| (min.0..=max.0).map(move |ix| (ix, iy)))
    }

    /// Number of cells covered
    pub fn len(&self) -> usize {
        (self.max.0 - self.min.0 + 1) * (self.max.1 - self.min.1 + 1)
    }

    /// Always false; a range covers at least one cell
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `(ix, iy)` is inside the range
    pub fn contains(&self, cell: (usize, usize)) -> bool {
        (self.min.0..=self.max.0).contains(&cell.0) && (self.min.1..=self.max.1).contains(&cell.1)
    }
}

/// Cell geometry shared by both grid variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    origin: Vec2,
    cell_width: f32,
    cell_height: f32,
    cells_per_row: usize,
    cells_per_column: usize,
}

impl GridLayout {
    /// Split `world_size` starting at `origin` into `cells_per_row` x `cells_per_column` cells
    pub fn new(
        origin: Vec2,
        world_size: Vec2,
        cells_per_row: usize,
        cells_per_column: usize,
    ) -> Result<Self, SpatialError> {
        if cells_per_row == 0 || cells_per_column == 0 {
            return Err(SpatialError::InvalidLayout(format!(
                "cell counts must be non-zero, got {cells_per_row}x{cells_per_column}"
            )));
        }
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !(valid(world_size.x) && valid(world_size.y)) {
            return Err(SpatialError::InvalidLayout(format!(
                "world size must be positive and finite, got {}x{}",
                world_size.x, world_size.y
            )));
        }
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Err(SpatialError::InvalidLayout("origin must be finite".to_string()));
        }

        Ok(Self {
            origin,
            cell_width: world_size.x / cells_per_row as f32,
            cell_height: world_size.y / cells_per_column as f32,
            cells_per_row,
            cells_per_column,
        })
    }

    /// Cell containing `(x, y)`, clamped to the grid
    pub fn cell_index_for(&self, x: f32, y: f32) -> (usize, usize) {
        let clamp = |value: f32, count: usize| -> usize {
            // NaN and negatives land in cell 0
            if value.is_nan() || value < 0.0 {
                0
            } else {
                (value as usize).min(count - 1)
            }
        };
        let ix = ((x - self.origin.x) / self.cell_width).floor();
        let iy = ((y - self.origin.y) / self.cell_height).floor();
        (clamp(ix, self.cells_per_row), clamp(iy, self.cells_per_column))
    }

    /// Cells covered by `bounds`, corners inclusive
    ///
    /// Negative extents are accepted; the corners are ordered per axis.
    pub fn cell_range(&self, bounds: &BoundingBox) -> CellRange {
        let a = self.cell_index_for(bounds.x, bounds.y);
        let b = self.cell_index_for(bounds.max_x(), bounds.max_y());
        CellRange {
            min: (a.0.min(b.0), a.1.min(b.1)),
            max: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// Row-major index into a flat cell array
    #[inline]
    pub fn flat_index(&self, (ix, iy): (usize, usize)) -> usize {
        iy * self.cells_per_row + ix
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.cells_per_row * self.cells_per_column
    }

    /// World origin (minimum corner)
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Cell size
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(self.cell_width, self.cell_height)
    }

    /// Cells along x
    pub fn cells_per_row(&self) -> usize {
        self.cells_per_row
    }

    /// Cells along y
    pub fn cells_per_column(&self) -> usize {
        self.cells_per_column
    }
}

/// Camera view in world space: a position plus edge offsets
///
/// The visible rectangle spans `position.x + left ..= position.x + right`
/// and `position.y + bottom ..= position.y + top`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Camera position
    pub position: Vec2,
    /// Left edge offset
    pub left: f32,
    /// Right edge offset
    pub right: f32,
    /// Bottom edge offset
    pub bottom: f32,
    /// Top edge offset
    pub top: f32,
}

impl Viewport {
    /// Viewport of `width` x `height` with its bottom-left corner at `position`
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            left: 0.0,
            right: width,
            bottom: 0.0,
            top: height,
        }
    }

    /// Visible world rectangle
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.position.x + self.left,
            self.position.y + self.bottom,
            self.right - self.left,
            self.top - self.bottom,
        )
    }
}

/// Grid-owned record of a client object and the cells it occupies
#[derive(Debug, Clone)]
pub struct Client<T> {
    object: T,
    cells: CellRange,
}

impl<T> Client<T> {
    /// The stored object
    pub fn object(&self) -> &T {
        &self.object
    }

    /// Cells the client was inserted into
    pub fn cells(&self) -> CellRange {
        self.cells
    }
}
