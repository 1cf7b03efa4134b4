//! Collision error types

/// Errors raised by hitbox construction and collision queries
///
/// Geometry problems are caught when a hitbox is built so that SAT never runs
/// on input it cannot handle. "No collision" is not an error; queries report
/// it as `Ok(false)` / `Ok(None)`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// A polygon needs at least three points
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    /// Flat coordinate data must contain x/y pairs
    #[error("flat point data must hold x/y pairs, got {0} values")]
    OddCoordinateCount(usize),

    /// A coordinate was NaN or infinite
    #[error("point {index} is not finite")]
    NonFinitePoint {
        /// Index of the offending point
        index: usize,
    },

    /// Two consecutive points coincide
    #[error("edge {index} has zero length")]
    ZeroLengthEdge {
        /// Index of the edge's first point
        index: usize,
    },

    /// Winding changes direction, so the polygon is concave or self-intersecting
    #[error("polygon is not convex at point {index}")]
    NotConvex {
        /// Index of the point where the turn direction flips
        index: usize,
    },

    /// All points are collinear
    #[error("polygon has zero area")]
    ZeroArea,

    /// Circle radius must be positive and finite
    #[error("circle radius must be positive and finite, got {0}")]
    InvalidRadius(f32),

    /// The hitbox has never been transformed to world space
    #[error("hitbox queried before its first transform")]
    Untransformed,

    /// A world-space edge collapsed, leaving no axis direction
    #[error("world-space edge {index} is degenerate, no separating axis")]
    DegenerateAxis {
        /// Index of the collapsed edge
        index: usize,
    },

    /// A body handle does not belong to the collision world
    #[error("unknown body handle")]
    UnknownBody,
}
