//! Circle hitboxes

use crate::foundation::math::{ModelMatrix, Vec2};

use super::error::CollisionError;
use super::polygon::ConvexPolygon;
use super::primitives::BoundingBox;
use super::sat;

/// Circle hitbox stored in model space
///
/// Transforming maps the center through the matrix and scales the radius by
/// the matrix's largest axis scale, so a non-uniformly scaled circle grows
/// into the circle enclosing the resulting ellipse.
#[derive(Debug, Clone)]
pub struct CircleHitbox {
    local_center: Vec2,
    local_radius: f32,
    world_center: Vec2,
    world_radius: f32,
    transformed: bool,
}

impl CircleHitbox {
    /// Create a circle; the radius must be positive and finite
    pub fn new(center: Vec2, radius: f32) -> Result<Self, CollisionError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CollisionError::InvalidRadius(radius));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(CollisionError::NonFinitePoint { index: 0 });
        }
        Ok(Self {
            local_center: center,
            local_radius: radius,
            world_center: Vec2::zeros(),
            world_radius: 0.0,
            transformed: false,
        })
    }

    /// Recompute the world-space center and radius
    pub fn transform(&mut self, matrix: &ModelMatrix) {
        self.world_center = matrix.transform_point(self.local_center);
        self.world_radius = self.local_radius * matrix.max_scale();
        self.transformed = true;
    }

    /// Whether [`transform`](Self::transform) has been called at least once
    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    /// World-space center
    pub fn center(&self) -> Result<Vec2, CollisionError> {
        self.ensure_transformed()?;
        Ok(self.world_center)
    }

    /// World-space radius
    pub fn radius(&self) -> Result<f32, CollisionError> {
        self.ensure_transformed()?;
        Ok(self.world_radius)
    }

    /// Model-space radius
    pub fn local_radius(&self) -> f32 {
        self.local_radius
    }

    /// Axis-aligned bounds of the world-space circle
    pub fn bounding_box(&self) -> Result<BoundingBox, CollisionError> {
        let (center, radius) = (self.center()?, self.radius()?);
        Ok(BoundingBox::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        ))
    }

    /// Overlap test against another circle (touching counts)
    pub fn is_colliding(&self, other: &CircleHitbox) -> Result<bool, CollisionError> {
        Ok(self.is_colliding_mtv(other)?.is_some())
    }

    /// MTV that moves `self` out of `other`
    pub fn is_colliding_mtv(&self, other: &CircleHitbox) -> Result<Option<Vec2>, CollisionError> {
        Ok(sat::circle_circle_mtv(
            self.center()?,
            self.radius()?,
            other.center()?,
            other.radius()?,
        ))
    }

    /// MTV that moves `self` out of a polygon
    pub fn is_colliding_polygon_mtv(
        &self,
        polygon: &ConvexPolygon,
    ) -> Result<Option<Vec2>, CollisionError> {
        let mtv = sat::polygon_circle_mtv(polygon, self.center()?, self.radius()?)?;
        Ok(mtv.map(|v| -v))
    }

    fn ensure_transformed(&self) -> Result<(), CollisionError> {
        if self.transformed {
            Ok(())
        } else {
            Err(CollisionError::Untransformed)
        }
    }
}
