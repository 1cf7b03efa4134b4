//! High-level hitbox abstractions
//!
//! [`Hitbox`] unifies polygon and circle hitboxes behind one type so game code
//! and the collision world can test any pair without matching on shapes.
//! [`CompoundHitbox`] groups several hitboxes that move together, such as the
//! walls of a building.

use crate::foundation::math::{ModelMatrix, Vec2};

use super::circle::CircleHitbox;
use super::error::CollisionError;
use super::polygon::ConvexPolygon;
use super::primitives::BoundingBox;
use super::sat;

/// Hitbox shape (stored in MODEL SPACE, cached in world space)
#[derive(Debug, Clone)]
pub enum Hitbox {
    /// Convex polygon, including the rectangle specialization
    Polygon(ConvexPolygon),
    /// Circle
    Circle(CircleHitbox),
}

impl From<ConvexPolygon> for Hitbox {
    fn from(polygon: ConvexPolygon) -> Self {
        Self::Polygon(polygon)
    }
}

impl From<CircleHitbox> for Hitbox {
    fn from(circle: CircleHitbox) -> Self {
        Self::Circle(circle)
    }
}

impl Hitbox {
    /// Axis-aligned rectangle hitbox
    pub fn rectangle(x: f32, y: f32, w: f32, h: f32) -> Result<Self, CollisionError> {
        ConvexPolygon::rectangle(x, y, w, h).map(Self::Polygon)
    }

    /// Circle hitbox
    pub fn circle(center: Vec2, radius: f32) -> Result<Self, CollisionError> {
        CircleHitbox::new(center, radius).map(Self::Circle)
    }

    /// Refresh the world-space cache
    pub fn transform(&mut self, matrix: &ModelMatrix) {
        match self {
            Self::Polygon(polygon) => polygon.transform(matrix),
            Self::Circle(circle) => circle.transform(matrix),
        }
    }

    /// Whether the world-space cache is valid
    pub fn is_transformed(&self) -> bool {
        match self {
            Self::Polygon(polygon) => polygon.is_transformed(),
            Self::Circle(circle) => circle.is_transformed(),
        }
    }

    /// Check that the world-space geometry can still be tested
    ///
    /// A zero scale on one axis flattens a polygon so its edges lose their
    /// normals, and shrinks a circle to nothing.
    pub fn validate_world(&self) -> Result<(), CollisionError> {
        match self {
            Self::Polygon(polygon) => sat::check_edge_axes(polygon.transformed_points()?),
            Self::Circle(circle) => {
                let radius = circle.radius()?;
                if radius > 0.0 && radius.is_finite() {
                    Ok(())
                } else {
                    Err(CollisionError::InvalidRadius(radius))
                }
            }
        }
    }

    /// World-space center (vertex mean for polygons)
    pub fn center(&self) -> Result<Vec2, CollisionError> {
        match self {
            Self::Polygon(polygon) => polygon.center(),
            Self::Circle(circle) => circle.center(),
        }
    }

    /// World-space axis-aligned bounds
    pub fn bounding_box(&self) -> Result<BoundingBox, CollisionError> {
        match self {
            Self::Polygon(polygon) => polygon.bounding_box(),
            Self::Circle(circle) => circle.bounding_box(),
        }
    }

    /// Overlap test (touching counts)
    pub fn is_colliding(&self, other: &Hitbox) -> Result<bool, CollisionError> {
        match (self, other) {
            (Self::Polygon(a), Self::Polygon(b)) => a.is_colliding(b),
            _ => Ok(self.is_colliding_mtv(other)?.is_some()),
        }
    }

    /// MTV that moves `self` out of `other`, `None` if they do not overlap
    pub fn is_colliding_mtv(&self, other: &Hitbox) -> Result<Option<Vec2>, CollisionError> {
        match (self, other) {
            (Self::Polygon(a), Self::Polygon(b)) => a.is_colliding_mtv(b),
            (Self::Polygon(a), Self::Circle(b)) => {
                sat::polygon_circle_mtv(a, b.center()?, b.radius()?)
            }
            (Self::Circle(a), Self::Polygon(b)) => a.is_colliding_polygon_mtv(b),
            (Self::Circle(a), Self::Circle(b)) => a.is_colliding_mtv(b),
        }
    }
}

/// Group of hitboxes sharing one transform
#[derive(Debug, Clone, Default)]
pub struct CompoundHitbox {
    parts: Vec<Hitbox>,
}

impl CompoundHitbox {
    /// Create an empty compound hitbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from existing parts
    pub fn from_parts(parts: Vec<Hitbox>) -> Self {
        Self { parts }
    }

    /// Add a part
    pub fn push(&mut self, part: impl Into<Hitbox>) {
        self.parts.push(part.into());
    }

    /// All parts
    pub fn parts(&self) -> &[Hitbox] {
        &self.parts
    }

    /// Transform every part with the same matrix
    pub fn transform(&mut self, matrix: &ModelMatrix) {
        for part in &mut self.parts {
            part.transform(matrix);
        }
    }

    /// Union of the parts' bounds, `None` when there are no parts
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>, CollisionError> {
        let mut bounds: Option<BoundingBox> = None;
        for part in &self.parts {
            let part_bounds = part.bounding_box()?;
            bounds = Some(match bounds {
                Some(current) => current.union(&part_bounds),
                None => part_bounds,
            });
        }
        Ok(bounds)
    }

    /// Whether any part overlaps `other`
    pub fn is_colliding(&self, other: &Hitbox) -> Result<bool, CollisionError> {
        for part in &self.parts {
            if part.is_colliding(other)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Total push that moves `other` out of every overlapping part
    ///
    /// Sums the per-part MTVs, so an object wedged into a corner is pushed out
    /// of both walls at once. Returns `None` when no part overlaps.
    pub fn mtv_against(&self, other: &Hitbox) -> Result<Option<Vec2>, CollisionError> {
        let mut total: Option<Vec2> = None;
        for part in &self.parts {
            if let Some(mtv) = other.is_colliding_mtv(part)? {
                *total.get_or_insert_with(Vec2::zeros) += mtv;
            }
        }
        Ok(total)
    }
}
