//! Physics module for collision detection and response
//!
//! Provides 2D hitboxes with SAT overlap and MTV tests, collision layer
//! filtering, and a collision world that combines them with a spatial hash
//! grid broad phase.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;

#[cfg(test)]
mod tests;

pub use collision::{
    BoundingBox, CircleHitbox, CollisionError, CompoundHitbox, ConvexPolygon, Hitbox, PolygonKind,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{
    Body, BodyEntry, BodyHandle, BodyKind, CollisionPair, CollisionWorld, Contact,
};
