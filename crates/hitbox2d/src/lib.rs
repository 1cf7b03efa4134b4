//! # hitbox2d
//!
//! 2D collision for game loops: convex polygon and circle hitboxes, SAT
//! overlap and minimum-translation-vector tests, and spatial hash grids for
//! broad-phase culling.
//!
//! ## Features
//!
//! - **Hitboxes**: Convex polygons (with a rectangle specialization), circles
//!   and compound hitboxes, defined in model space and transformed on move
//! - **SAT / MTV**: Overlap tests that treat touching shapes as colliding, and
//!   the smallest push that separates two shapes
//! - **Spatial hashing**: Uniform grids with multi-cell membership, plus a
//!   layered variant that splits results by category
//! - **Collision world**: Broad phase, layer filtering, narrow phase and MTV
//!   resolution for static and dynamic bodies
//!
//! ## Quick Start
//!
//! ```rust
//! use hitbox2d::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = CollisionWorld::from_config(&PhysicsConfig::default())?;
//!
//!     let wall = world.add_body(
//!         Hitbox::rectangle(0.0, 0.0, 100.0, 20.0)?,
//!         Transform2D::from_position(Vec2::new(100.0, 100.0)),
//!         BodyKind::Static,
//!         CollisionLayers::ENVIRONMENT,
//!         CollisionLayers::all(),
//!     )?;
//!     let player = world.add_body(
//!         Hitbox::circle(Vec2::zeros(), 8.0)?,
//!         Transform2D::from_position(Vec2::new(150.0, 125.0)),
//!         BodyKind::Dynamic,
//!         CollisionLayers::PLAYER,
//!         CollisionLayers::ENVIRONMENT,
//!     )?;
//!
//!     let contacts = world.resolve_collisions()?;
//!     assert_eq!(contacts[0].body, player);
//!     assert_eq!(contacts[0].other, wall);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, GridConfig, PhysicsConfig, ResolutionConfig},
        foundation::{
            math::{ModelMatrix, Transform2D, Vec2},
            time::{Cooldown, Stopwatch},
        },
        physics::{
            BodyHandle, BodyKind, BoundingBox, CircleHitbox, CollisionError, CollisionLayers,
            CollisionPair, CollisionWorld, CompoundHitbox, Contact, ConvexPolygon, Hitbox,
        },
        spatial::{
            BoundedObject, ClientHandle, LayeredObject, LayeredSpatialHashGrid, SpatialError,
            SpatialHashGrid, SpatialQuery, Viewport,
        },
    };
}
