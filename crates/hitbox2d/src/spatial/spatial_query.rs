//! Abstract spatial query interface for broad-phase collision detection
//!
//! Lets the collision world run over either grid variant without knowing
//! which one it holds.

use std::collections::HashSet;

use super::ClientHandle;
use crate::physics::collision::BoundingBox;

/// Storage that buckets objects by their bounding boxes
///
/// The structure owns its objects. After mutating an object through
/// [`object_mut`](Self::object_mut) in a way that moves its bounds, call
/// [`update`](Self::update) so it is re-bucketed.
pub trait SpatialQuery<T> {
    /// Insert an object, bucketing it by its current bounds
    fn add(&mut self, object: T) -> ClientHandle;

    /// Remove an object from every cell it occupies and return it
    fn remove(&mut self, handle: ClientHandle) -> Option<T>;

    /// Re-bucket an object after its bounds changed
    ///
    /// Returns `false` for unknown handles.
    fn update(&mut self, handle: ClientHandle) -> bool;

    /// Borrow a stored object
    fn object(&self, handle: ClientHandle) -> Option<&T>;

    /// Mutably borrow a stored object
    fn object_mut(&mut self, handle: ClientHandle) -> Option<&mut T>;

    /// Every client sharing a cell with `area`
    ///
    /// Membership is cell based, so the result can contain clients whose
    /// bounds do not touch `area` but share a cell with it.
    fn find_near(&self, area: &BoundingBox) -> HashSet<ClientHandle>;

    /// Remove every client
    fn clear(&mut self);

    /// Number of stored clients
    fn client_count(&self) -> usize;
}
