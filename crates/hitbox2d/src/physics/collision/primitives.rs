//! Primitive collision shapes and intersection algorithms
//!
//! Provides basic geometric primitives (bounding boxes, axis projections,
//! line segments) shared by the hitbox types and the spatial grids.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, ModelMatrix, Vec2};

/// Axis-aligned bounding box in world space
///
/// `(x, y)` is the minimum corner, `w`/`h` extend towards +x/+y. Used for
/// broad-phase bucketing only; narrow-phase tests use the full hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x
    pub x: f32,
    /// Minimum y
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl BoundingBox {
    /// Creates a new bounding box
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = points.first()?;
        let (mut min, mut max) = (*first, *first);
        for point in &points[1..] {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Maximum x
    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    /// Maximum y
    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Strict overlap test; boxes that only touch do not collide
    pub fn collides_with(&self, other: &BoundingBox) -> bool {
        self.x < other.max_x()
            && self.max_x() > other.x
            && self.y < other.max_y()
            && self.max_y() > other.y
    }

    /// Inclusive point containment
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox::new(
            x,
            y,
            self.max_x().max(other.max_x()) - x,
            self.max_y().max(other.max_y()) - y,
        )
    }

    /// Axis-aligned box around this box's four corners after `matrix`
    pub fn transform(&self, matrix: &ModelMatrix) -> BoundingBox {
        let corners = [
            Vec2::new(self.x, self.y),
            Vec2::new(self.max_x(), self.y),
            Vec2::new(self.max_x(), self.max_y()),
            Vec2::new(self.x, self.max_y()),
        ]
        .map(|corner| matrix.transform_point(corner));

        // Four corners, never empty
        Self::from_points(&corners).unwrap_or(*self)
    }
}

/// Interval covered by a shape projected onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Smallest projected value
    pub min: f32,
    /// Largest projected value
    pub max: f32,
}

impl Projection {
    /// Project a point set onto `axis`
    ///
    /// An empty slice yields an inverted (empty) interval.
    #[inline]
    pub fn of_points(points: &[Vec2], axis: Vec2) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for point in points {
            let p = axis.dot(point);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Project a circle onto a unit `axis`
    #[inline]
    pub fn of_circle(center: Vec2, radius: f32, axis: Vec2) -> Self {
        let c = axis.dot(&center);
        Self {
            min: c - radius,
            max: c + radius,
        }
    }

    /// Intervals are disjoint. Touching intervals (equal bounds) are not.
    #[inline]
    pub fn separated(&self, other: &Projection) -> bool {
        self.max < other.min || other.max < self.min
    }

    /// Overlap depth; only meaningful when not [`separated`](Self::separated)
    #[inline]
    pub fn overlap(&self, other: &Projection) -> f32 {
        self.max.min(other.max) - self.min.max(other.min)
    }
}

/// Intersection point of segments `a0-a1` and `b0-b1`
///
/// Parallel (including collinear) segments report no intersection.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let da = a1 - a0;
    let db = b1 - b0;
    let det = utils::cross(da, db);
    if det == 0.0 {
        return None;
    }

    let offset = b0 - a0;
    let ua = utils::cross(offset, db) / det;
    let ub = utils::cross(offset, da) / det;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(a0 + da * ua)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform2D;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_touching_does_not_collide() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 10.0, 10.0);
        let c = BoundingBox::new(9.0, 9.0, 10.0, 10.0);

        assert!(!a.collides_with(&b));
        assert!(a.collides_with(&c));
        assert!(c.collides_with(&a));
    }

    #[test]
    fn test_bounding_box_from_points_and_union() {
        let points = [Vec2::new(1.0, 5.0), Vec2::new(-2.0, 3.0), Vec2::new(4.0, -1.0)];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds, BoundingBox::new(-2.0, -1.0, 6.0, 6.0));
        assert!(BoundingBox::from_points(&[]).is_none());

        let other = BoundingBox::new(10.0, 10.0, 1.0, 1.0);
        assert_eq!(bounds.union(&other), BoundingBox::new(-2.0, -1.0, 13.0, 12.0));
    }

    #[test]
    fn test_bounding_box_transform_handles_negative_coordinates() {
        // A rotation by 180 degrees pushes every corner negative
        let bounds = BoundingBox::new(1.0, 1.0, 2.0, 1.0);
        let matrix = Transform2D::identity().with_rotation(180.0, Vec2::zeros()).to_matrix();
        let rotated = bounds.transform(&matrix);

        assert_relative_eq!(rotated.x, -3.0, epsilon = 1e-4);
        assert_relative_eq!(rotated.y, -2.0, epsilon = 1e-4);
        assert_relative_eq!(rotated.w, 2.0, epsilon = 1e-4);
        assert_relative_eq!(rotated.h, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_projection_touching_is_not_separated() {
        let a = Projection { min: 0.0, max: 1.0 };
        let b = Projection { min: 1.0, max: 2.0 };
        let c = Projection { min: 1.5, max: 2.0 };

        assert!(!a.separated(&b));
        assert_eq!(a.overlap(&b), 0.0);
        assert!(a.separated(&c));
    }

    #[test]
    fn test_segment_intersection() {
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
        );
        assert_relative_eq!(hit.unwrap(), Vec2::new(1.0, 1.0), epsilon = 1e-5);

        // Parallel
        assert!(segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        )
        .is_none());

        // Lines cross but outside the segments
        assert!(segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(5.0, -1.0),
            Vec2::new(5.0, 1.0),
        )
        .is_none());
    }
}
