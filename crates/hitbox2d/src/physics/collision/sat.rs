//! Separating axis theorem (SAT) collision resolver
//!
//! Stateless overlap and minimum-translation-vector (MTV) tests for convex
//! shapes already transformed to world space.
//!
//! # Algorithm
//!
//! 1. Candidate axes are the normalized edge normals of both shapes, A's
//!    first. Circles contribute the axis from the nearest polygon vertex (or
//!    the other circle's center) to their center.
//! 2. Both shapes are projected onto each axis. Disjoint intervals prove a
//!    separating axis exists and the test stops there. Intervals that only
//!    touch count as overlapping.
//! 3. For the MTV the axis with the smallest overlap depth wins. Ties keep
//!    the axis found first.
//! 4. The axis is flipped when it points from A towards B, so the returned
//!    `axis * depth` always pushes A away from B.

use crate::foundation::math::{constants, utils, Vec2};

use super::error::CollisionError;
use super::polygon::{vertex_mean, ConvexPolygon};
use super::primitives::Projection;

/// Unit normal of edge `index` (from point `index` to the next point)
#[inline]
fn edge_axis(points: &[Vec2], index: usize) -> Result<Vec2, CollisionError> {
    let edge = points[(index + 1) % points.len()] - points[index];
    utils::perpendicular(edge)
        .try_normalize(constants::EPSILON)
        .ok_or(CollisionError::DegenerateAxis { index })
}

fn edge_axes(points: &[Vec2], count: usize) -> impl Iterator<Item = Result<Vec2, CollisionError>> + '_ {
    (0..count).map(move |index| edge_axis(points, index))
}

/// Fails with [`CollisionError::DegenerateAxis`] if any world-space edge has
/// no usable normal
pub(crate) fn check_edge_axes(points: &[Vec2]) -> Result<(), CollisionError> {
    edge_axes(points, points.len()).try_for_each(|axis| axis.map(drop))
}

/// Axis of least penetration seen so far
#[derive(Debug, Clone, Copy)]
struct MinimumOverlap {
    axis: Vec2,
    depth: f32,
}

impl MinimumOverlap {
    fn track(best: &mut Option<Self>, axis: Vec2, depth: f32) {
        // Strict comparison keeps the first axis on ties
        if best.map_or(true, |current| depth < current.depth) {
            *best = Some(Self { axis, depth });
        }
    }

    /// Orient the axis away from B and scale it by the depth
    fn into_mtv(self, center_a: Vec2, center_b: Vec2) -> Vec2 {
        let axis = if (center_b - center_a).dot(&self.axis) > 0.0 {
            -self.axis
        } else {
            self.axis
        };
        axis * self.depth
    }
}

/// Whether two polygons overlap (touching counts)
pub fn polygons_collide(a: &ConvexPolygon, b: &ConvexPolygon) -> Result<bool, CollisionError> {
    let points_a = a.transformed_points()?;
    let points_b = b.transformed_points()?;

    for axis in edge_axes(points_a, a.axis_count()).chain(edge_axes(points_b, b.axis_count())) {
        let axis = axis?;
        let pa = Projection::of_points(points_a, axis);
        let pb = Projection::of_points(points_b, axis);
        if pa.separated(&pb) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// MTV that moves polygon `a` out of polygon `b`, `None` if they do not overlap
pub fn polygon_polygon_mtv(
    a: &ConvexPolygon,
    b: &ConvexPolygon,
) -> Result<Option<Vec2>, CollisionError> {
    let points_a = a.transformed_points()?;
    let points_b = b.transformed_points()?;

    let mut best = None;
    for axis in edge_axes(points_a, a.axis_count()).chain(edge_axes(points_b, b.axis_count())) {
        let axis = axis?;
        let pa = Projection::of_points(points_a, axis);
        let pb = Projection::of_points(points_b, axis);
        if pa.separated(&pb) {
            return Ok(None);
        }
        MinimumOverlap::track(&mut best, axis, pa.overlap(&pb));
    }

    Ok(best.map(|overlap| overlap.into_mtv(vertex_mean(points_a), vertex_mean(points_b))))
}

/// MTV that moves the polygon out of a world-space circle
pub fn polygon_circle_mtv(
    polygon: &ConvexPolygon,
    center: Vec2,
    radius: f32,
) -> Result<Option<Vec2>, CollisionError> {
    let points = polygon.transformed_points()?;

    let nearest = points
        .iter()
        .copied()
        .min_by(|p, q| {
            (p - center)
                .norm_squared()
                .total_cmp(&(q - center).norm_squared())
        })
        .unwrap_or(center);

    // A circle centered exactly on a vertex adds no axis; the edge normals
    // still cover that case
    let vertex_axis = (center - nearest).try_normalize(constants::EPSILON).map(Ok);

    let mut best = None;
    for axis in edge_axes(points, polygon.axis_count()).chain(vertex_axis) {
        let axis = axis?;
        let pp = Projection::of_points(points, axis);
        let pc = Projection::of_circle(center, radius, axis);
        if pp.separated(&pc) {
            return Ok(None);
        }
        MinimumOverlap::track(&mut best, axis, pp.overlap(&pc));
    }

    Ok(best.map(|overlap| overlap.into_mtv(vertex_mean(points), center)))
}

/// MTV that moves circle A out of circle B
///
/// Concentric circles have no preferred direction and are pushed along +x.
pub fn circle_circle_mtv(center_a: Vec2, radius_a: f32, center_b: Vec2, radius_b: f32) -> Option<Vec2> {
    let offset = center_b - center_a;
    let distance = offset.norm();
    let reach = radius_a + radius_b;
    if distance > reach {
        return None;
    }

    let axis = offset
        .try_normalize(constants::EPSILON)
        .unwrap_or_else(|| Vec2::new(1.0, 0.0));
    let overlap = MinimumOverlap {
        axis,
        depth: reach - distance,
    };
    Some(overlap.into_mtv(center_a, center_b))
}
