//! Collision layer system for filtering collision detection
//!
//! Every body sits on one or more layers and carries a mask of the layers it
//! reacts to. A pair is only tested when each body's layer is in the other's
//! mask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision categories
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CollisionLayers: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static environment geometry (walls, buildings)
        const ENVIRONMENT = 1 << 3;
        /// Movable props such as crates
        const PROP = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
        /// Trigger volumes (reported, never resolved)
        const TRIGGER = 1 << 6;
    }
}

impl Default for CollisionLayers {
    /// Every solid layer; triggers must be opted into
    fn default() -> Self {
        Self::all().difference(Self::TRIGGER)
    }
}

impl CollisionLayers {
    /// Check if two bodies should collide based on their layers and masks
    ///
    /// # Example
    /// ```
    /// use hitbox2d::physics::CollisionLayers;
    ///
    /// let player_mask = CollisionLayers::ENEMY | CollisionLayers::ENVIRONMENT;
    /// let enemy_mask = CollisionLayers::PLAYER | CollisionLayers::PROJECTILE;
    ///
    /// assert!(CollisionLayers::should_collide(
    ///     CollisionLayers::PLAYER, player_mask,
    ///     CollisionLayers::ENEMY, enemy_mask,
    /// ));
    /// ```
    pub fn should_collide(
        layer_a: CollisionLayers,
        mask_a: CollisionLayers,
        layer_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        // A's layer must be in B's mask AND B's layer must be in A's mask
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }

    /// Index of the lowest set bit, used as a grid layer id
    pub fn layer_index(self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.bits().trailing_zeros() as usize
        }
    }
}
