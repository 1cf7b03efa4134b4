//! Arena demo
//!
//! Runs the collision world through a fixed number of frames of a top-down
//! shooter and logs what happened. Pass a TOML or RON physics config as the
//! first argument to override the defaults.

mod arena;

use arena::Arena;
use hitbox2d::config::{Config, PhysicsConfig};
use hitbox2d::foundation::logging::{self, LevelFilter};
use hitbox2d::foundation::time::Stopwatch;

const FRAMES: u64 = 1800;
const FRAME_TIME: f32 = 1.0 / 60.0;
const SEED: u64 = 0x00c0_ffee;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(LevelFilter::Info);

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load_from_file(&path)?,
        None => {
            log::info!("No config file given, using defaults");
            PhysicsConfig::default()
        }
    };
    config.validate()?;

    log::info!("Starting arena demo ({} frames)", FRAMES);
    let mut arena = Arena::new(&config, SEED)?;

    let stopwatch = Stopwatch::start_new();
    for frame in 0..FRAMES {
        if let Err(e) = arena.step(FRAME_TIME) {
            log::error!("Arena failed on frame {}: {}", frame, e);
            return Err(e.into());
        }
    }

    arena.stats().log_summary(stopwatch.elapsed_millis());
    log::info!(
        "{} zombies still alive, {} bodies in the world",
        arena.zombie_count(),
        arena.body_count()
    );
    Ok(())
}
