//! Headless top-down arena
//!
//! A player circles the map while waves of zombies close in. Crates get
//! shoved around, a rotated building with a doorway blocks movement, and the
//! player fires at the nearest zombie whenever the gun cooldown allows.

use std::collections::HashSet;

use hitbox2d::prelude::*;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

const PLAYER_RADIUS: f32 = 20.0;
const PLAYER_SPEED: f32 = 180.0;

const ZOMBIE_SIZE: f32 = 48.0;
const ZOMBIE_MIN_SPEED: f32 = 40.0;
const ZOMBIE_MAX_SPEED: f32 = 70.0;
const WAVE_INTERVAL: f32 = 4.0;
const WAVE_SIZE: usize = 6;
const MAX_ZOMBIES: usize = 40;

const BULLET_SIZE: f32 = 6.0;
const BULLET_SPEED: f32 = 600.0;
const BULLET_LIFETIME: f32 = 1.5;
const FIRE_INTERVAL: f32 = 0.15;

const CRATE_COUNT: usize = 8;
const CRATE_SIZE: f32 = 40.0;

const WALL_THICKNESS: f32 = 15.0;
const BUILDING_ROTATION: f32 = 45.0;

const CAMERA_WIDTH: f32 = 400.0;
const CAMERA_HEIGHT: f32 = 300.0;

/// Errors that stop the simulation
#[derive(thiserror::Error, Debug)]
pub enum ArenaError {
    /// Hitbox or world failure
    #[error("collision error: {0}")]
    Collision(#[from] CollisionError),

    /// Grid construction failure
    #[error("spatial grid error: {0}")]
    Spatial(#[from] SpatialError),

    /// World too small to place crates and zombies inside it
    #[error("world size {width}x{height} must exceed {min} on both axes")]
    WorldTooSmall { width: f32, height: f32, min: f32 },
}

/// Draw order buckets in the visibility grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLayer {
    Floor,
    Props,
    Actors,
    Projectiles,
}

impl DrawLayer {
    pub const COUNT: usize = 4;
    pub const ALL: [Self; Self::COUNT] = [Self::Floor, Self::Props, Self::Actors, Self::Projectiles];

    fn index(self) -> usize {
        self as usize
    }
}

/// What the camera culls against
struct Sprite {
    bounds: BoundingBox,
    layer: DrawLayer,
}

impl BoundedObject for Sprite {
    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }
}

impl LayeredObject for Sprite {
    fn layer(&self) -> usize {
        self.layer.index()
    }
}

/// A physics body paired with its sprite
#[derive(Debug, Clone, Copy)]
struct Actor {
    body: BodyHandle,
    sprite: ClientHandle,
}

struct Zombie {
    actor: Actor,
    speed: f32,
}

struct Bullet {
    actor: Actor,
    velocity: Vec2,
    lifetime: Cooldown,
}

/// Walls of a rotated building with a doorway in the bottom wall
struct Building {
    walls: CompoundHitbox,
}

impl Building {
    fn new(position: Vec2, size: Vec2) -> Result<Self, CollisionError> {
        let door_width = size.x * 0.2;
        let side = size.x / 2.0 - door_width / 2.0;

        let mut walls = CompoundHitbox::new();
        walls.push(ConvexPolygon::rectangle(0.0, 0.0, WALL_THICKNESS, size.y)?);
        walls.push(ConvexPolygon::rectangle(size.x - WALL_THICKNESS, 0.0, WALL_THICKNESS, size.y)?);
        walls.push(ConvexPolygon::rectangle(0.0, 0.0, side, WALL_THICKNESS)?);
        walls.push(ConvexPolygon::rectangle(size.x - side, 0.0, side, WALL_THICKNESS)?);
        walls.push(ConvexPolygon::rectangle(0.0, size.y - WALL_THICKNESS, size.x, WALL_THICKNESS)?);

        let transform = Transform2D::from_position(position).with_rotation(BUILDING_ROTATION, Vec2::zeros());
        walls.transform(&transform.to_matrix());
        Ok(Self { walls })
    }

    fn bounds(&self) -> Result<BoundingBox, CollisionError> {
        Ok(self.walls.bounding_box()?.unwrap_or_default())
    }
}

/// Running totals reported at the end of a run
#[derive(Debug, Clone, Default)]
pub struct ArenaStats {
    pub frames: u64,
    pub spawned: usize,
    pub shots: usize,
    pub kills: usize,
    pub contacts: usize,
    pub building_pushes: usize,
    pub peak_visible: [usize; DrawLayer::COUNT],
}

impl ArenaStats {
    /// Log the totals
    pub fn log_summary(&self, elapsed_ms: f32) {
        info!("Arena finished: {} frames in {:.1} ms", self.frames, elapsed_ms);
        info!(
            "Zombies: {} spawned, {} killed; {} shots fired",
            self.spawned, self.kills, self.shots
        );
        info!(
            "Resolution: {} contacts, {} building pushes",
            self.contacts, self.building_pushes
        );
        for layer in DrawLayer::ALL {
            info!(
                "Peak visible {:?}: {}",
                layer,
                self.peak_visible[layer.index()]
            );
        }
    }
}

/// Simulation state
pub struct Arena {
    world: CollisionWorld,
    visibility: LayeredSpatialHashGrid<Sprite>,
    bounds: BoundingBox,
    rng: StdRng,
    player: Actor,
    zombies: Vec<Zombie>,
    bullets: Vec<Bullet>,
    crates: Vec<Actor>,
    building: Building,
    gun: Cooldown,
    waves: Cooldown,
    elapsed: f32,
    stats: ArenaStats,
}

impl Arena {
    /// Build the map described by `config`, seeding spawns with `seed`
    pub fn new(config: &PhysicsConfig, seed: u64) -> Result<Self, ArenaError> {
        // Spawn ranges run from the world edge to the edge minus the footprint
        let min = CRATE_SIZE.max(ZOMBIE_SIZE);
        let size = config.grid.world_size;
        if !(size.x > min && size.y > min) {
            return Err(ArenaError::WorldTooSmall {
                width: size.x,
                height: size.y,
                min,
            });
        }

        let world = CollisionWorld::from_config(config)?;
        let visibility = LayeredSpatialHashGrid::from_config(&GridConfig {
            layers: DrawLayer::COUNT,
            ..config.grid.clone()
        })?;

        let origin = config.grid.origin;
        let bounds = BoundingBox::new(origin.x, origin.y, size.x, size.y);

        let building = Building::new(
            origin + Vec2::new(size.x * 0.65, size.y * 0.15),
            Vec2::new(size.x * 0.3, size.y * 0.16),
        )?;

        let mut arena = Self {
            world,
            visibility,
            bounds,
            rng: StdRng::seed_from_u64(seed),
            player: Actor {
                body: BodyHandle::default(),
                sprite: ClientHandle::default(),
            },
            zombies: Vec::new(),
            bullets: Vec::new(),
            crates: Vec::new(),
            building,
            gun: Cooldown::new(FIRE_INTERVAL),
            waves: Cooldown::new(WAVE_INTERVAL),
            elapsed: 0.0,
            stats: ArenaStats::default(),
        };

        let floor = arena.building.bounds()?;
        arena.visibility.add(Sprite {
            bounds: floor,
            layer: DrawLayer::Floor,
        });

        arena.player = arena.spawn(
            Hitbox::circle(Vec2::zeros(), PLAYER_RADIUS)?,
            Transform2D::from_position(arena.path_point(0.0)),
            CollisionLayers::PLAYER,
            CollisionLayers::ENEMY | CollisionLayers::PROP,
            DrawLayer::Actors,
        )?;

        arena.spawn_crates()?;

        info!(
            "Arena ready: {}x{} world, {} crates, building at {:?}",
            size.x,
            size.y,
            arena.crates.len(),
            floor
        );
        Ok(arena)
    }

    /// Totals so far
    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }

    /// Zombies currently alive
    pub fn zombie_count(&self) -> usize {
        self.zombies.len()
    }

    /// Bodies currently in the collision world
    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    /// Advance one frame of `delta_time` seconds
    pub fn step(&mut self, delta_time: f32) -> Result<(), ArenaError> {
        self.elapsed += delta_time;
        self.gun.tick(delta_time);
        self.waves.tick(delta_time);

        if self.zombies.len() < MAX_ZOMBIES && self.waves.trigger() {
            self.spawn_wave()?;
        }

        self.move_player(delta_time)?;
        self.move_zombies(delta_time)?;
        self.fire()?;
        self.move_bullets(delta_time)?;
        self.push_out_of_building()?;
        self.handle_hits()?;

        let contacts = self.world.resolve_collisions()?;
        self.stats.contacts += contacts.len();

        self.sync_sprites()?;
        self.count_visible()?;
        self.stats.frames += 1;
        Ok(())
    }

    fn spawn(
        &mut self,
        hitbox: Hitbox,
        transform: Transform2D,
        layer: CollisionLayers,
        mask: CollisionLayers,
        draw_layer: DrawLayer,
    ) -> Result<Actor, ArenaError> {
        let body = self
            .world
            .add_body(hitbox, transform, BodyKind::Dynamic, layer, mask)?;
        let bounds = self.body_bounds(body)?;
        let sprite = self.visibility.add(Sprite {
            bounds,
            layer: draw_layer,
        });
        Ok(Actor { body, sprite })
    }

    fn despawn(&mut self, actor: Actor) {
        self.world.remove_body(actor.body);
        self.visibility.remove(actor.sprite);
    }

    fn spawn_crates(&mut self) -> Result<(), ArenaError> {
        let keep_out = self.building.bounds()?;
        let mut attempts = 0;

        while self.crates.len() < CRATE_COUNT && attempts < CRATE_COUNT * 10 {
            attempts += 1;
            let position = self.random_point(CRATE_SIZE);
            let footprint = BoundingBox::new(position.x, position.y, CRATE_SIZE, CRATE_SIZE);
            if footprint.collides_with(&keep_out) {
                continue;
            }

            let actor = self.spawn(
                Hitbox::rectangle(0.0, 0.0, CRATE_SIZE, CRATE_SIZE)?,
                Transform2D::from_position(position),
                CollisionLayers::PROP,
                CollisionLayers::all(),
                DrawLayer::Props,
            )?;
            self.crates.push(actor);
        }
        Ok(())
    }

    fn spawn_wave(&mut self) -> Result<(), ArenaError> {
        for _ in 0..WAVE_SIZE {
            let position = self.edge_point();
            let hitbox = ConvexPolygon::from_flat(&[0.4, 0.2, 0.4, 0.8, 0.6, 0.8, 1.0, 0.2])?;
            let transform = Transform2D::from_position(position)
                .with_scale(Vec2::new(ZOMBIE_SIZE, ZOMBIE_SIZE));

            let actor = self.spawn(
                hitbox.into(),
                transform,
                CollisionLayers::ENEMY,
                CollisionLayers::PLAYER
                    | CollisionLayers::ENEMY
                    | CollisionLayers::PROP
                    | CollisionLayers::PROJECTILE,
                DrawLayer::Actors,
            )?;
            let speed = self.rng.gen_range(ZOMBIE_MIN_SPEED..ZOMBIE_MAX_SPEED);
            self.zombies.push(Zombie { actor, speed });
            self.stats.spawned += 1;
        }
        debug!("Wave spawned, {} zombies alive", self.zombies.len());
        Ok(())
    }

    fn move_player(&mut self, delta_time: f32) -> Result<(), ArenaError> {
        let current = self.body_center(self.player.body)?;
        let target = self.path_point(self.elapsed);
        let step = clamp_length(target - current, PLAYER_SPEED * delta_time);
        self.world.translate(self.player.body, step)?;
        Ok(())
    }

    fn move_zombies(&mut self, delta_time: f32) -> Result<(), ArenaError> {
        let player = self.body_center(self.player.body)?;
        for zombie in &self.zombies {
            let center = self
                .world
                .hitbox(zombie.actor.body)
                .ok_or(CollisionError::UnknownBody)?
                .center()?;
            if let Some(direction) = (player - center).try_normalize(f32::EPSILON) {
                self.world
                    .translate(zombie.actor.body, direction * zombie.speed * delta_time)?;
            }
        }
        Ok(())
    }

    fn fire(&mut self) -> Result<(), ArenaError> {
        let origin = self.body_center(self.player.body)?;

        let mut nearest: Option<(f32, Vec2)> = None;
        for zombie in &self.zombies {
            let center = self.body_center(zombie.actor.body)?;
            let distance = (center - origin).norm_squared();
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, center));
            }
        }
        let Some((_, target)) = nearest else {
            return Ok(());
        };
        let Some(direction) = (target - origin).try_normalize(f32::EPSILON) else {
            return Ok(());
        };
        if !self.gun.trigger() {
            return Ok(());
        }

        let muzzle = origin + direction * (PLAYER_RADIUS + BULLET_SIZE);
        let half = BULLET_SIZE / 2.0;
        let actor = self.spawn(
            Hitbox::rectangle(-half, -half, BULLET_SIZE, BULLET_SIZE)?,
            Transform2D::from_position(muzzle),
            CollisionLayers::PROJECTILE,
            CollisionLayers::ENEMY | CollisionLayers::PROP,
            DrawLayer::Projectiles,
        )?;
        self.bullets.push(Bullet {
            actor,
            velocity: direction * BULLET_SPEED,
            lifetime: Cooldown::started(BULLET_LIFETIME),
        });
        self.stats.shots += 1;
        Ok(())
    }

    fn move_bullets(&mut self, delta_time: f32) -> Result<(), ArenaError> {
        let mut spent = Vec::new();
        for bullet in &mut self.bullets {
            bullet.lifetime.tick(delta_time);
            self.world.translate(bullet.actor.body, bullet.velocity * delta_time)?;

            let hitbox = self
                .world
                .hitbox(bullet.actor.body)
                .ok_or(CollisionError::UnknownBody)?;
            let outside = !hitbox.bounding_box()?.collides_with(&self.bounds);
            if bullet.lifetime.is_ready() || outside || self.building.walls.is_colliding(hitbox)? {
                spent.push(bullet.actor.body);
            }
        }
        self.remove_bullets(&spent.into_iter().collect());
        Ok(())
    }

    /// Walls push the player and zombies back out by the summed MTV
    fn push_out_of_building(&mut self) -> Result<(), ArenaError> {
        let walkers: Vec<BodyHandle> = std::iter::once(self.player.body)
            .chain(self.zombies.iter().map(|zombie| zombie.actor.body))
            .collect();

        for body in walkers {
            let hitbox = self.world.hitbox(body).ok_or(CollisionError::UnknownBody)?;
            if let Some(mtv) = self.building.walls.mtv_against(hitbox)? {
                self.world.translate(body, mtv)?;
                self.stats.building_pushes += 1;
            }
        }
        Ok(())
    }

    fn handle_hits(&mut self) -> Result<(), ArenaError> {
        let pairs: Vec<CollisionPair> = self.world.detect_collisions()?.iter().copied().collect();

        let mut spent = HashSet::new();
        let mut killed = HashSet::new();
        for pair in pairs {
            for (bullet, other) in [(pair.body_a, pair.body_b), (pair.body_b, pair.body_a)] {
                if self.layer_of(bullet) != Some(CollisionLayers::PROJECTILE) || spent.contains(&bullet) {
                    continue;
                }
                let Some(layer) = self.layer_of(other) else {
                    continue;
                };
                if layer == CollisionLayers::ENEMY {
                    if killed.insert(other) {
                        spent.insert(bullet);
                    }
                } else if layer == CollisionLayers::PROP {
                    spent.insert(bullet);
                }
            }
        }

        self.remove_bullets(&spent);

        let (dead, alive): (Vec<_>, Vec<_>) = std::mem::take(&mut self.zombies)
            .into_iter()
            .partition(|zombie| killed.contains(&zombie.actor.body));
        self.zombies = alive;
        for zombie in dead {
            self.despawn(zombie.actor);
            self.stats.kills += 1;
        }
        Ok(())
    }

    fn remove_bullets(&mut self, spent: &HashSet<BodyHandle>) {
        if spent.is_empty() {
            return;
        }
        let (gone, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.bullets)
            .into_iter()
            .partition(|bullet| spent.contains(&bullet.actor.body));
        self.bullets = live;
        for bullet in gone {
            self.despawn(bullet.actor);
        }
    }

    fn sync_sprites(&mut self) -> Result<(), ArenaError> {
        let actors: Vec<Actor> = std::iter::once(self.player)
            .chain(self.crates.iter().copied())
            .chain(self.zombies.iter().map(|zombie| zombie.actor))
            .chain(self.bullets.iter().map(|bullet| bullet.actor))
            .collect();

        for actor in actors {
            let bounds = self.body_bounds(actor.body)?;
            if let Some(sprite) = self.visibility.object_mut(actor.sprite) {
                sprite.bounds = bounds;
            }
            self.visibility.update(actor.sprite);
        }
        Ok(())
    }

    fn count_visible(&mut self) -> Result<(), ArenaError> {
        let player = self.body_center(self.player.body)?;
        let camera = Viewport::new(
            player - Vec2::new(CAMERA_WIDTH / 2.0, CAMERA_HEIGHT / 2.0),
            CAMERA_WIDTH,
            CAMERA_HEIGHT,
        );

        for (peak, near) in self
            .stats
            .peak_visible
            .iter_mut()
            .zip(self.visibility.find_near_viewport(&camera))
        {
            *peak = (*peak).max(near.len());
        }
        Ok(())
    }

    fn layer_of(&self, body: BodyHandle) -> Option<CollisionLayers> {
        self.world.body(body).map(|body| body.layer())
    }

    fn body_center(&self, body: BodyHandle) -> Result<Vec2, CollisionError> {
        self.world.hitbox(body).ok_or(CollisionError::UnknownBody)?.center()
    }

    fn body_bounds(&self, body: BodyHandle) -> Result<BoundingBox, CollisionError> {
        self.world
            .hitbox(body)
            .ok_or(CollisionError::UnknownBody)?
            .bounding_box()
    }

    /// Point on the player's patrol loop at time `t`
    fn path_point(&self, t: f32) -> Vec2 {
        let center = Vec2::new(
            self.bounds.x + self.bounds.w * 0.4,
            self.bounds.y + self.bounds.h * 0.5,
        );
        let radius = self.bounds.w.min(self.bounds.h) * 0.25;
        let angle = t * 0.4;
        center + Vec2::new(angle.cos(), angle.sin()) * radius
    }

    fn random_point(&mut self, margin: f32) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(self.bounds.x..self.bounds.max_x() - margin),
            self.rng.gen_range(self.bounds.y..self.bounds.max_y() - margin),
        )
    }

    /// Random point just inside one of the world edges
    fn edge_point(&mut self) -> Vec2 {
        let inset = ZOMBIE_SIZE;
        let along = self.rng.gen_range(0.0..1.0_f32);
        let (x0, y0) = (self.bounds.x, self.bounds.y);
        let (x1, y1) = (self.bounds.max_x() - inset, self.bounds.max_y() - inset);

        match self.rng.gen_range(0..4) {
            0 => Vec2::new(x0 + (x1 - x0) * along, y0),
            1 => Vec2::new(x0 + (x1 - x0) * along, y1),
            2 => Vec2::new(x0, y0 + (y1 - y0) * along),
            _ => Vec2::new(x1, y0 + (y1 - y0) * along),
        }
    }
}

fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    let length = v.norm();
    if length > max {
        v * (max / length)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn arena() -> Arena {
        Arena::new(&PhysicsConfig::default(), 7).unwrap()
    }

    #[test]
    fn test_new_arena_has_player_and_crates() {
        let arena = arena();
        assert_eq!(arena.zombie_count(), 0);
        assert_eq!(arena.body_count(), 1 + arena.crates.len());
        assert!(!arena.crates.is_empty());
    }

    #[test]
    fn test_first_frame_spawns_a_wave() {
        let mut arena = arena();
        arena.step(FRAME).unwrap();
        assert_eq!(arena.stats().spawned, WAVE_SIZE);
        assert_eq!(arena.stats().frames, 1);
    }

    #[test]
    fn test_gun_respects_cooldown() {
        let mut arena = arena();
        for _ in 0..60 {
            arena.step(FRAME).unwrap();
        }
        // One second of frames allows at most one shot per interval
        let limit = (1.0 / FIRE_INTERVAL).ceil() as usize + 1;
        assert!(arena.stats().shots > 0);
        assert!(arena.stats().shots <= limit);
    }

    #[test]
    fn test_player_stays_out_of_building() {
        let mut arena = arena();
        for _ in 0..300 {
            arena.step(FRAME).unwrap();
            let player = arena.world.hitbox(arena.player.body).unwrap();
            if let Some(mtv) = arena.building.walls.mtv_against(player).unwrap() {
                // Only zombie shoves after the wall push can leave a sliver
                assert!(mtv.norm() < PLAYER_RADIUS);
            }
        }
    }

    #[test]
    fn test_camera_sees_the_player() {
        let mut arena = arena();
        arena.step(FRAME).unwrap();
        assert!(arena.stats().peak_visible[DrawLayer::Actors.index()] >= 1);
    }

    #[test]
    fn test_world_smaller_than_spawn_footprint_is_rejected() {
        let mut config = PhysicsConfig::default();
        config.grid.world_size = Vec2::new(30.0, 30.0);
        assert!(config.validate().is_ok());
        assert!(matches!(
            Arena::new(&config, 7),
            Err(ArenaError::WorldTooSmall { min, .. }) if min == ZOMBIE_SIZE
        ));

        // Just big enough to spawn crates and a wave
        config.grid.world_size = Vec2::new(60.0, 60.0);
        let mut arena = Arena::new(&config, 7).unwrap();
        arena.step(FRAME).unwrap();
        assert_eq!(arena.stats().spawned, WAVE_SIZE);
    }

    #[test]
    fn test_clamp_length() {
        assert_eq!(clamp_length(Vec2::new(3.0, 4.0), 10.0), Vec2::new(3.0, 4.0));
        let clamped = clamp_length(Vec2::new(3.0, 4.0), 1.0);
        assert!((clamped.norm() - 1.0).abs() < 1e-6);
    }
}
