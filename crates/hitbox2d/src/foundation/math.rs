//! Math utilities and types
//!
//! Provides the 2D vector and affine transform types used by hitboxes and
//! spatial grids. Vectors are plain `nalgebra` values; transforms are
//! homogeneous 3x3 matrices mapping model space to world space.

pub use nalgebra::{Matrix3, Vector2};

use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 homogeneous matrix type
pub type Mat3 = Matrix3<f32>;

/// Affine "model matrix" mapping local (model space) points to world space
///
/// Operations post-multiply like a GL model matrix: the most recently added
/// operation is the first one applied to a point. Building a matrix as
/// `translate -> rotate_around_point -> scale` therefore scales a point
/// first, rotates it around the pivot, then translates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMatrix {
    matrix: Mat3,
}

impl Default for ModelMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ModelMatrix {
    /// Create an identity matrix
    pub fn identity() -> Self {
        Self {
            matrix: Mat3::identity(),
        }
    }

    /// Wrap an existing homogeneous matrix
    pub fn from_matrix(matrix: Mat3) -> Self {
        Self { matrix }
    }

    /// Reset to identity
    pub fn reset(&mut self) {
        self.matrix = Mat3::identity();
    }

    /// Post-multiply a translation
    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        self.matrix *= Mat3::new_translation(&Vec2::new(x, y));
        self
    }

    /// Post-multiply a counter-clockwise rotation around the origin (degrees)
    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        self.matrix *= Mat3::new_rotation(utils::deg_to_rad(degrees));
        self
    }

    /// Post-multiply a rotation around `pivot` (degrees)
    pub fn rotate_around_point(&mut self, pivot: Vec2, degrees: f32) -> &mut Self {
        self.translate(pivot.x, pivot.y);
        self.rotate(degrees);
        self.translate(-pivot.x, -pivot.y)
    }

    /// Post-multiply a non-uniform scale
    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.matrix *= Mat3::new_nonuniform_scaling(&Vec2::new(sx, sy));
        self
    }

    /// Map a local-space point to world space
    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        let m = &self.matrix;
        Vec2::new(
            m[(0, 0)] * point.x + m[(0, 1)] * point.y + m[(0, 2)],
            m[(1, 0)] * point.x + m[(1, 1)] * point.y + m[(1, 2)],
        )
    }

    /// Map a direction (ignores translation)
    #[inline]
    pub fn transform_vector(&self, vector: Vec2) -> Vec2 {
        let m = &self.matrix;
        Vec2::new(
            m[(0, 0)] * vector.x + m[(0, 1)] * vector.y,
            m[(1, 0)] * vector.x + m[(1, 1)] * vector.y,
        )
    }

    /// World-space position of the local origin
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.matrix[(0, 2)], self.matrix[(1, 2)])
    }

    /// Largest axis scale factor (length of the longest basis column)
    pub fn max_scale(&self) -> f32 {
        let x_axis = Vec2::new(self.matrix[(0, 0)], self.matrix[(1, 0)]);
        let y_axis = Vec2::new(self.matrix[(0, 1)], self.matrix[(1, 1)]);
        x_axis.norm().max(y_axis.norm())
    }

    /// Access the raw matrix
    pub fn as_matrix(&self) -> &Mat3 {
        &self.matrix
    }
}

/// Entity transform: position, rotation around a pivot, and scale
///
/// The matrix produced by [`Transform2D::to_matrix`] applies scale, then
/// rotation around `pivot`, then translation by `position`. The same
/// transform always yields the same matrix, so re-transforming a hitbox
/// with it never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// World position (translation)
    pub position: Vec2,

    /// Rotation in degrees, counter-clockwise
    pub rotation_degrees: f32,

    /// Local-space pivot the rotation is applied around
    pub pivot: Vec2,

    /// Non-uniform scale
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation_degrees: 0.0,
            pivot: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the rotation (degrees) around a pivot
    pub fn with_rotation(mut self, degrees: f32, pivot: Vec2) -> Self {
        self.rotation_degrees = degrees;
        self.pivot = pivot;
        self
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Move the position by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Convert to a model matrix (scale -> rotate around pivot -> translate)
    pub fn to_matrix(&self) -> ModelMatrix {
        let mut matrix = ModelMatrix::identity();
        matrix
            .translate(self.position.x, self.position.y)
            .rotate_around_point(self.pivot, self.rotation_degrees)
            .scale(self.scale.x, self.scale.y);
        matrix
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Below this squared length a vector has no usable direction
    pub const EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec2};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Left-hand perpendicular of an edge, `(y, -x)`
    ///
    /// For counter-clockwise winding this points out of the polygon.
    #[inline]
    pub fn perpendicular(edge: Vec2) -> Vec2 {
        Vec2::new(edge.y, -edge.x)
    }

    /// 2D cross product (z component of the 3D cross product)
    #[inline]
    pub fn cross(a: Vec2, b: Vec2) -> f32 {
        a.x * b.y - a.y * b.x
    }
}
