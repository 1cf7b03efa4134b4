//! Narrow-phase collision detection for 2D hitboxes
//!
//! Hitboxes are defined in model space and cache their world-space geometry
//! after every `transform` call. Collision tests always read the cache, so
//! the game loop transforms once per move and can then test any number of
//! pairs.
//!
//! # Module Organization
//!
//! - [`primitives`] - Bounding boxes, axis projections, segment intersection
//! - [`polygon`] - Convex polygon hitboxes and their validation
//! - [`circle`] - Circle hitboxes
//! - [`sat`] - Separating axis theorem overlap and MTV tests
//! - [`shape`] - [`Hitbox`] enum and [`CompoundHitbox`]
//! - [`error`] - [`CollisionError`]

pub mod circle;
pub mod error;
pub mod polygon;
pub mod primitives;
pub mod sat;
pub mod shape;

// Re-export commonly used types
pub use circle::CircleHitbox;
pub use error::CollisionError;
pub use polygon::{ConvexPolygon, PolygonKind};
pub use primitives::{segment_intersection, BoundingBox, Projection};
pub use shape::{CompoundHitbox, Hitbox};
