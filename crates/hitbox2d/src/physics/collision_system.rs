//! Collision world: broad phase, narrow phase and MTV resolution
//!
//! Detection is split into two phases. The broad phase asks the spatial
//! grid which bodies share cells; the narrow phase runs SAT on the hitboxes
//! of those candidates. Resolution then pushes overlapping bodies apart by
//! their minimum translation vectors.
//!
//! The world owns every body's hitbox and transform. Moving a body through
//! [`CollisionWorld::set_transform`] or [`CollisionWorld::translate`]
//! re-transforms its hitbox and re-buckets it in the grid, so world-space
//! geometry is always current when a query runs.

use std::collections::HashSet;

use log::{debug, trace};
use slotmap::SlotMap;

use crate::config::{PhysicsConfig, ResolutionConfig};
use crate::foundation::math::{constants, Transform2D, Vec2};
use crate::physics::collision::{BoundingBox, CollisionError, Hitbox};
use crate::physics::collision_layers::CollisionLayers;
use crate::spatial::{
    BoundedObject, ClientHandle, LayeredObject, SpatialError, SpatialHashGrid, SpatialQuery,
};

slotmap::new_key_type! {
    /// Handle to a body in a [`CollisionWorld`]
    pub struct BodyHandle;
}

/// How a body reacts to collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Never moved by resolution (walls, buildings)
    Static,
    /// Pushed out of whatever it overlaps
    Dynamic,
}

/// Collision pair of two bodies, stored with the smaller handle first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
}

impl CollisionPair {
    /// Create a new collision pair (always stores the smaller handle first)
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        if body_a < body_b {
            Self { body_a, body_b }
        } else {
            Self {
                body_a: body_b,
                body_b: body_a,
            }
        }
    }

    /// Whether `body` is part of the pair
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }
}

/// A correction applied to one body during resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Body that was moved
    pub body: BodyHandle,
    /// Body it was pushed out of
    pub other: BodyHandle,
    /// Translation applied to `body`
    pub correction: Vec2,
}

/// Entry stored in the broad-phase grid for each body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyEntry {
    /// Owning body
    pub body: BodyHandle,
    /// World-space bounds at the last move
    pub bounds: BoundingBox,
    /// Grid layer, derived from the body's lowest collision layer bit
    pub layer: usize,
}

impl BoundedObject for BodyEntry {
    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }
}

impl LayeredObject for BodyEntry {
    fn layer(&self) -> usize {
        self.layer
    }
}

/// A body owned by the collision world
#[derive(Debug, Clone)]
pub struct Body {
    hitbox: Hitbox,
    transform: Transform2D,
    kind: BodyKind,
    layer: CollisionLayers,
    mask: CollisionLayers,
    client: ClientHandle,
}

impl Body {
    /// World-space hitbox
    pub fn hitbox(&self) -> &Hitbox {
        &self.hitbox
    }

    /// Current transform
    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    /// Static or dynamic
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Layers the body belongs to
    pub fn layer(&self) -> CollisionLayers {
        self.layer
    }

    /// Layers the body reacts to
    pub fn mask(&self) -> CollisionLayers {
        self.mask
    }

    /// Whether resolution may move this body
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

/// Core collision world
pub struct CollisionWorld {
    /// Spatial partitioning structure for broad-phase
    spatial_query: Box<dyn SpatialQuery<BodyEntry>>,

    bodies: SlotMap<BodyHandle, Body>,

    resolution: ResolutionConfig,

    /// Collision pairs from the current frame
    current_pairs: HashSet<CollisionPair>,

    /// Collision pairs from the previous frame
    previous_pairs: HashSet<CollisionPair>,
}

impl CollisionWorld {
    /// Create a world over the given spatial query implementation
    pub fn new(spatial_query: Box<dyn SpatialQuery<BodyEntry>>, resolution: ResolutionConfig) -> Self {
        Self {
            spatial_query,
            bodies: SlotMap::with_key(),
            resolution,
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
        }
    }

    /// Create a world over a plain [`SpatialHashGrid`] built from `config`
    pub fn from_config(config: &PhysicsConfig) -> Result<Self, SpatialError> {
        let grid = SpatialHashGrid::from_config(&config.grid)?;
        Ok(Self::new(Box::new(grid), config.resolution.clone()))
    }

    /// Add a body; its hitbox is transformed immediately
    ///
    /// Fails if the transform flattens the hitbox, for example a zero scale
    /// on one axis.
    pub fn add_body(
        &mut self,
        mut hitbox: Hitbox,
        transform: Transform2D,
        kind: BodyKind,
        layer: CollisionLayers,
        mask: CollisionLayers,
    ) -> Result<BodyHandle, CollisionError> {
        hitbox.transform(&transform.to_matrix());
        hitbox.validate_world()?;
        let bounds = hitbox.bounding_box()?;

        let spatial_query = &mut self.spatial_query;
        let handle = self.bodies.insert_with_key(|body| {
            let client = spatial_query.add(BodyEntry {
                body,
                bounds,
                layer: layer.layer_index(),
            });
            Body {
                hitbox,
                transform,
                kind,
                layer,
                mask,
                client,
            }
        });

        debug!("Added {:?} body {:?} at {:?}", kind, handle, transform.position);
        Ok(handle)
    }

    /// Remove a body and forget any pairs it was part of
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(handle)?;
        self.spatial_query.remove(body.client);
        self.current_pairs.retain(|pair| !pair.contains(handle));
        self.previous_pairs.retain(|pair| !pair.contains(handle));
        debug!("Removed body {:?}", handle);
        Some(body)
    }

    /// Replace a body's transform
    ///
    /// A transform that flattens the hitbox is rejected and the body keeps
    /// its previous transform.
    pub fn set_transform(&mut self, handle: BodyHandle, transform: Transform2D) -> Result<(), CollisionError> {
        self.apply_transform(handle, transform)
    }

    /// Move a body by `delta`
    pub fn translate(&mut self, handle: BodyHandle, delta: Vec2) -> Result<(), CollisionError> {
        let mut transform = *self.transform(handle).ok_or(CollisionError::UnknownBody)?;
        transform.translate(delta);
        self.apply_transform(handle, transform)
    }

    /// Borrow a body
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Borrow a body's world-space hitbox
    pub fn hitbox(&self, handle: BodyHandle) -> Option<&Hitbox> {
        self.bodies.get(handle).map(Body::hitbox)
    }

    /// Borrow a body's transform
    pub fn transform(&self, handle: BodyHandle) -> Option<&Transform2D> {
        self.bodies.get(handle).map(Body::transform)
    }

    /// Iterate over every body
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Resolution settings
    pub fn resolution(&self) -> &ResolutionConfig {
        &self.resolution
    }

    /// Perform collision detection update (broad-phase + narrow-phase)
    ///
    /// Returns the colliding pairs for this frame. Static pairs are never
    /// reported. On error the previous frame's pairs are left untouched.
    pub fn detect_collisions(&mut self) -> Result<&HashSet<CollisionPair>, CollisionError> {
        let mut pairs = HashSet::new();
        for pair in self.broad_phase() {
            if self.narrow_phase(pair)? {
                pairs.insert(pair);
            }
        }
        self.previous_pairs = std::mem::replace(&mut self.current_pairs, pairs);

        trace!(
            "Collision detection: {} bodies, {} pairs",
            self.bodies.len(),
            self.current_pairs.len()
        );
        Ok(&self.current_pairs)
    }

    /// Pairs that started colliding in the last detection
    pub fn collision_entered(&self) -> Vec<CollisionPair> {
        self.current_pairs
            .difference(&self.previous_pairs)
            .copied()
            .collect()
    }

    /// Pairs that stopped colliding in the last detection
    pub fn collision_exited(&self) -> Vec<CollisionPair> {
        self.previous_pairs
            .difference(&self.current_pairs)
            .copied()
            .collect()
    }

    /// Pairs found by the last detection
    pub fn current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Push overlapping bodies apart
    ///
    /// Runs up to `iterations` passes, stopping early once a pass moves
    /// nothing. Two dynamic bodies split the MTV by `dynamic_share`; a
    /// dynamic body overlapping a static one takes the whole MTV. Pairs with
    /// a [`CollisionLayers::TRIGGER`] body are detected but never pushed.
    pub fn resolve_collisions(&mut self) -> Result<Vec<Contact>, CollisionError> {
        let mut contacts = Vec::new();

        for pass in 0..self.resolution.iterations {
            let before = contacts.len();

            for pair in self.broad_phase() {
                self.resolve_pair(pair, &mut contacts)?;
            }

            if contacts.len() == before {
                trace!("Resolution settled after {} passes", pass);
                break;
            }
        }

        Ok(contacts)
    }

    /// Bodies whose grid cells overlap `area`
    pub fn query_area(&self, area: &BoundingBox) -> Vec<BodyHandle> {
        self.spatial_query
            .find_near(area)
            .into_iter()
            .filter_map(|client| self.spatial_query.object(client).map(|entry| entry.body))
            .collect()
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.spatial_query.clear();
        self.bodies.clear();
        self.current_pairs.clear();
        self.previous_pairs.clear();
    }

    /// Broad-phase candidate pairs, sorted so resolution order is stable
    fn broad_phase(&self) -> Vec<CollisionPair> {
        let mut candidates = HashSet::new();

        for (handle, body) in &self.bodies {
            let Some(entry) = self.spatial_query.object(body.client) else {
                continue;
            };

            for client in self.spatial_query.find_near(&entry.bounds) {
                let Some(other_handle) = self.spatial_query.object(client).map(|e| e.body) else {
                    continue;
                };
                if other_handle == handle {
                    continue;
                }
                let Some(other) = self.bodies.get(other_handle) else {
                    continue;
                };

                if !body.is_dynamic() && !other.is_dynamic() {
                    continue;
                }
                if !CollisionLayers::should_collide(body.layer, body.mask, other.layer, other.mask) {
                    continue;
                }

                candidates.insert(CollisionPair::new(handle, other_handle));
            }
        }

        let mut candidates: Vec<_> = candidates.into_iter().collect();
        candidates.sort_unstable();
        candidates
    }

    fn narrow_phase(&self, pair: CollisionPair) -> Result<bool, CollisionError> {
        match (self.bodies.get(pair.body_a), self.bodies.get(pair.body_b)) {
            (Some(a), Some(b)) => a.hitbox.is_colliding(&b.hitbox),
            _ => Ok(false),
        }
    }

    fn resolve_pair(&mut self, pair: CollisionPair, contacts: &mut Vec<Contact>) -> Result<(), CollisionError> {
        let (Some(a), Some(b)) = (self.bodies.get(pair.body_a), self.bodies.get(pair.body_b)) else {
            return Ok(());
        };
        if a.layer.contains(CollisionLayers::TRIGGER) || b.layer.contains(CollisionLayers::TRIGGER) {
            return Ok(());
        }
        let Some(mtv) = a.hitbox.is_colliding_mtv(&b.hitbox)? else {
            return Ok(());
        };
        // Touching shapes report a zero-length MTV
        if mtv.norm_squared() <= constants::EPSILON * constants::EPSILON {
            return Ok(());
        }

        let moves = match (a.kind, b.kind) {
            (BodyKind::Dynamic, BodyKind::Dynamic) => {
                let share = self.resolution.dynamic_share;
                [
                    Some((pair.body_a, pair.body_b, mtv * share)),
                    Some((pair.body_b, pair.body_a, -mtv * (1.0 - share))),
                ]
            }
            (BodyKind::Dynamic, BodyKind::Static) => [Some((pair.body_a, pair.body_b, mtv)), None],
            (BodyKind::Static, BodyKind::Dynamic) => [Some((pair.body_b, pair.body_a, -mtv)), None],
            (BodyKind::Static, BodyKind::Static) => [None, None],
        };

        for (body, other, correction) in moves.into_iter().flatten() {
            if correction.norm_squared() == 0.0 {
                continue;
            }
            self.translate(body, correction)?;
            contacts.push(Contact {
                body,
                other,
                correction,
            });
        }
        Ok(())
    }

    /// Re-transform a body's hitbox and re-bucket it
    fn apply_transform(&mut self, handle: BodyHandle, transform: Transform2D) -> Result<(), CollisionError> {
        let body = self.bodies.get_mut(handle).ok_or(CollisionError::UnknownBody)?;
        body.hitbox.transform(&transform.to_matrix());
        if let Err(e) = body.hitbox.validate_world() {
            body.hitbox.transform(&body.transform.to_matrix());
            return Err(e);
        }
        let bounds = body.hitbox.bounding_box()?;
        body.transform = transform;
        let client = body.client;

        if let Some(entry) = self.spatial_query.object_mut(client) {
            entry.bounds = bounds;
        }
        self.spatial_query.update(client);
        Ok(())
    }
}
