//! Convex polygon hitboxes
//!
//! A [`ConvexPolygon`] stores its points in model space and keeps a cached
//! copy transformed to world space. Geometry is validated once at
//! construction, so the SAT tests in [`super::sat`] only ever see convex,
//! non-degenerate input.
//!
//! The world-space cache is only meaningful after the first
//! [`ConvexPolygon::transform`] call. Until then every query returns
//! [`CollisionError::Untransformed`].

use crate::foundation::math::{constants, utils, ModelMatrix, Vec2};

use super::error::CollisionError;
use super::primitives::BoundingBox;
use super::sat;

/// Shape specialization, used to skip redundant SAT axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonKind {
    /// Arbitrary convex polygon, one axis per edge
    Polygon,
    /// Four-point rectangle in model space
    ///
    /// Any affine transform keeps opposite edges parallel, so only the first
    /// two edges contribute distinct axes.
    Rectangle,
}

/// Convex polygon hitbox
#[derive(Debug, Clone)]
pub struct ConvexPolygon {
    local_points: Vec<Vec2>,
    world_points: Vec<Vec2>,
    kind: PolygonKind,
    transformed: bool,
}

impl ConvexPolygon {
    /// Create a polygon from ordered model-space points
    ///
    /// Points may wind either way but must describe a convex polygon with at
    /// least three distinct corners and non-zero area.
    pub fn new(points: Vec<Vec2>) -> Result<Self, CollisionError> {
        validate(&points)?;
        Ok(Self {
            world_points: vec![Vec2::zeros(); points.len()],
            local_points: points,
            kind: PolygonKind::Polygon,
            transformed: false,
        })
    }

    /// Create a polygon from flat `[x0, y0, x1, y1, ...]` coordinates
    pub fn from_flat(coords: &[f32]) -> Result<Self, CollisionError> {
        if coords.len() % 2 != 0 {
            return Err(CollisionError::OddCoordinateCount(coords.len()));
        }
        let points = coords
            .chunks_exact(2)
            .map(|pair| Vec2::new(pair[0], pair[1]))
            .collect();
        Self::new(points)
    }

    /// Axis-aligned rectangle with minimum corner `(x, y)`, wound CCW
    pub fn rectangle(x: f32, y: f32, w: f32, h: f32) -> Result<Self, CollisionError> {
        let mut polygon = Self::new(vec![
            Vec2::new(x, y),
            Vec2::new(x + w, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ])?;
        polygon.kind = PolygonKind::Rectangle;
        Ok(polygon)
    }

    /// Regular polygon approximating a circle, wound CCW starting at angle 0
    pub fn regular(center: Vec2, radius: f32, sides: usize) -> Result<Self, CollisionError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CollisionError::InvalidRadius(radius));
        }
        if sides < 3 {
            return Err(CollisionError::TooFewPoints(sides));
        }

        let step = 2.0 * constants::PI / sides as f32;
        let points = (0..sides)
            .map(|i| {
                let angle = step * i as f32;
                center + Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        Self::new(points)
    }

    /// Recompute world-space points from `matrix`
    ///
    /// Overwrites the previous cache, so calling this repeatedly with the
    /// same matrix always produces the same points.
    pub fn transform(&mut self, matrix: &ModelMatrix) {
        for (world, local) in self.world_points.iter_mut().zip(&self.local_points) {
            *world = matrix.transform_point(*local);
        }
        self.transformed = true;
    }

    /// Whether [`transform`](Self::transform) has been called at least once
    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    /// World-space points from the most recent transform
    pub fn transformed_points(&self) -> Result<&[Vec2], CollisionError> {
        if self.transformed {
            Ok(&self.world_points)
        } else {
            Err(CollisionError::Untransformed)
        }
    }

    /// Model-space points as constructed
    pub fn local_points(&self) -> &[Vec2] {
        &self.local_points
    }

    /// Shape specialization
    pub fn kind(&self) -> PolygonKind {
        self.kind
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.local_points.len()
    }

    /// Always false; construction rejects empty polygons
    pub fn is_empty(&self) -> bool {
        self.local_points.is_empty()
    }

    /// Number of edges that contribute separating axes
    pub fn axis_count(&self) -> usize {
        match self.kind {
            PolygonKind::Rectangle => 2,
            PolygonKind::Polygon => self.local_points.len(),
        }
    }

    /// Mean of the world-space vertices
    ///
    /// This is the reference point SAT uses to orient the MTV.
    pub fn center(&self) -> Result<Vec2, CollisionError> {
        let points = self.transformed_points()?;
        Ok(vertex_mean(points))
    }

    /// Area-weighted centroid of the world-space polygon
    pub fn centroid(&self) -> Result<Vec2, CollisionError> {
        let points = self.transformed_points()?;
        let mut area = 0.0;
        let mut weighted = Vec2::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            let cross = utils::cross(*p, q);
            area += cross;
            weighted += (p + q) * cross;
        }

        // A scale of zero can flatten the polygon after construction
        if area.abs() < constants::EPSILON {
            return Ok(vertex_mean(points));
        }
        Ok(weighted / (3.0 * area))
    }

    /// Axis-aligned bounds of the world-space points
    pub fn bounding_box(&self) -> Result<BoundingBox, CollisionError> {
        let points = self.transformed_points()?;
        BoundingBox::from_points(points).ok_or(CollisionError::TooFewPoints(0))
    }

    /// Axis-aligned bounds of the model-space points
    pub fn local_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.local_points).unwrap_or_default()
    }

    /// SAT overlap test. Touching polygons collide.
    pub fn is_colliding(&self, other: &ConvexPolygon) -> Result<bool, CollisionError> {
        sat::polygons_collide(self, other)
    }

    /// Minimum translation vector that moves `self` out of `other`
    ///
    /// Returns `Ok(None)` when the polygons do not overlap. Neither polygon
    /// is moved; the caller applies the vector and re-transforms.
    pub fn is_colliding_mtv(&self, other: &ConvexPolygon) -> Result<Option<Vec2>, CollisionError> {
        sat::polygon_polygon_mtv(self, other)
    }
}

pub(crate) fn vertex_mean(points: &[Vec2]) -> Vec2 {
    let sum = points.iter().fold(Vec2::zeros(), |acc, p| acc + p);
    sum / points.len().max(1) as f32
}

fn validate(points: &[Vec2]) -> Result<(), CollisionError> {
    let n = points.len();
    if n < 3 {
        return Err(CollisionError::TooFewPoints(n));
    }

    if let Some(index) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(CollisionError::NonFinitePoint { index });
    }

    // Tolerances scale with the polygon so tiny model-space shapes still pass
    let extent = BoundingBox::from_points(points).map_or(0.0, |bounds| bounds.w.max(bounds.h));
    let tolerance = constants::EPSILON * extent * extent;

    let edges: Vec<Vec2> = (0..n).map(|i| points[(i + 1) % n] - points[i]).collect();
    if let Some(index) = edges
        .iter()
        .position(|e| e.norm_squared() <= tolerance)
    {
        return Err(CollisionError::ZeroLengthEdge { index });
    }

    let doubled_area: f32 = (0..n)
        .map(|i| utils::cross(points[i], points[(i + 1) % n]))
        .sum();
    if doubled_area.abs() <= tolerance {
        return Err(CollisionError::ZeroArea);
    }

    // Every turn must follow the overall winding, collinear points excepted
    let winding = doubled_area.signum();
    let mut total_turn = 0.0;
    for i in 0..n {
        let (e0, e1) = (edges[i], edges[(i + 1) % n]);
        let turn = utils::cross(e0, e1);
        if turn * winding < -tolerance {
            return Err(CollisionError::NotConvex { index: (i + 1) % n });
        }
        total_turn += turn.atan2(e0.dot(&e1));
    }

    // Star shapes turn the same way at every corner but wind more than once
    if (total_turn.abs() - 2.0 * constants::PI).abs() > 1.0e-2 {
        return Err(CollisionError::NotConvex { index: 0 });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform2D;
    use approx::assert_relative_eq;

    fn unit_square() -> ConvexPolygon {
        ConvexPolygon::rectangle(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_rejects_too_few_points() {
        let result = ConvexPolygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
        assert_eq!(result.unwrap_err(), CollisionError::TooFewPoints(2));
    }

    #[test]
    fn test_rejects_odd_flat_coordinates() {
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(result.unwrap_err(), CollisionError::OddCoordinateCount(5));
    }

    #[test]
    fn test_rejects_zero_length_edge() {
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(result.unwrap_err(), CollisionError::ZeroLengthEdge { index: 1 });
    }

    #[test]
    fn test_rejects_non_finite_point() {
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, f32::NAN, 0.0, 0.0, 1.0]);
        assert_eq!(result.unwrap_err(), CollisionError::NonFinitePoint { index: 1 });
    }

    #[test]
    fn test_rejects_collinear_points() {
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
        assert_eq!(result.unwrap_err(), CollisionError::ZeroArea);
    }

    #[test]
    fn test_rejects_concave_polygon() {
        // Arrow head with a notch at (1, 0.5)
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, 2.0, 0.0, 1.0, 0.5, 2.0, 1.0, 0.0, 1.0]);
        assert!(matches!(result, Err(CollisionError::NotConvex { .. })));
    }

    #[test]
    fn test_rejects_pentagram() {
        let outer: Vec<Vec2> = (0..5)
            .map(|i| {
                let angle = (i * 2 % 5) as f32 * 2.0 * constants::PI / 5.0;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();
        assert!(matches!(
            ConvexPolygon::new(outer),
            Err(CollisionError::NotConvex { .. })
        ));
    }

    #[test]
    fn test_accepts_clockwise_winding() {
        let polygon = ConvexPolygon::from_flat(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert!(polygon.is_ok());
    }

    #[test]
    fn test_queries_fail_before_transform() {
        let a = unit_square();
        let b = unit_square();

        assert!(!a.is_transformed());
        assert_eq!(a.transformed_points().unwrap_err(), CollisionError::Untransformed);
        assert_eq!(a.is_colliding(&b).unwrap_err(), CollisionError::Untransformed);
        assert_eq!(a.is_colliding_mtv(&b).unwrap_err(), CollisionError::Untransformed);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let mut polygon = ConvexPolygon::regular(Vec2::zeros(), 10.0, 7).unwrap();
        let matrix = Transform2D::from_position(Vec2::new(3.0, -4.0))
            .with_rotation(33.0, Vec2::new(1.0, 1.0))
            .with_scale(Vec2::new(2.0, 0.5))
            .to_matrix();

        polygon.transform(&matrix);
        let first = polygon.transformed_points().unwrap().to_vec();
        polygon.transform(&matrix);
        let second = polygon.transformed_points().unwrap().to_vec();

        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_does_not_accumulate() {
        let mut polygon = unit_square();
        let matrix = Transform2D::from_position(Vec2::new(5.0, 0.0)).to_matrix();
        polygon.transform(&matrix);
        polygon.transform(&matrix);

        let points = polygon.transformed_points().unwrap();
        assert_relative_eq!(points[0], Vec2::new(5.0, 0.0));
        assert_eq!(polygon.local_points()[0], Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_centroid_and_bounds() {
        let mut triangle = ConvexPolygon::from_flat(&[0.0, 0.0, 3.0, 0.0, 0.0, 3.0]).unwrap();
        triangle.transform(&ModelMatrix::identity());

        assert_relative_eq!(triangle.centroid().unwrap(), Vec2::new(1.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(triangle.center().unwrap(), Vec2::new(1.0, 1.0), epsilon = 1e-5);
        assert_eq!(triangle.bounding_box().unwrap(), BoundingBox::new(0.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn test_rectangle_uses_two_axes() {
        let rect = unit_square();
        assert_eq!(rect.kind(), PolygonKind::Rectangle);
        assert_eq!(rect.axis_count(), 2);

        let hexagon = ConvexPolygon::regular(Vec2::zeros(), 1.0, 6).unwrap();
        assert_eq!(hexagon.kind(), PolygonKind::Polygon);
        assert_eq!(hexagon.axis_count(), 6);
    }

    #[test]
    fn test_small_polygons_are_accepted() {
        let tiny = ConvexPolygon::regular(Vec2::zeros(), 0.02, 200).unwrap();
        assert_eq!(tiny.len(), 200);

        let sliver = ConvexPolygon::rectangle(0.0, 0.0, 1.0e-3, 1.0e-3).unwrap();
        assert_eq!(sliver.kind(), PolygonKind::Rectangle);

        // Relative tolerance still catches a repeated point
        let result = ConvexPolygon::from_flat(&[0.0, 0.0, 1.0e-3, 0.0, 1.0e-3, 0.0, 0.0, 1.0e-3]);
        assert_eq!(result.unwrap_err(), CollisionError::ZeroLengthEdge { index: 1 });
    }

    #[test]
    fn test_regular_polygon_vertices_on_circle() {
        let mut circle = ConvexPolygon::regular(Vec2::new(100.0, 100.0), 300.0, 200).unwrap();
        circle.transform(&ModelMatrix::identity());

        assert_eq!(circle.len(), 200);
        for point in circle.transformed_points().unwrap() {
            assert_relative_eq!((point - Vec2::new(100.0, 100.0)).norm(), 300.0, epsilon = 1e-2);
        }
    }
}
