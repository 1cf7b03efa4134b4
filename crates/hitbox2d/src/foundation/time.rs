//! Time management utilities
//!
//! Frame-gated actions ("fire no more than every N ms") are modelled as a
//! [`Cooldown`] that the game loop ticks with the frame delta, so behaviour is
//! deterministic and testable without a real clock. [`Stopwatch`] measures
//! wall-clock time for diagnostics only.

use std::time::{Duration, Instant};

/// Tick-driven cooldown timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    duration: f32,
    remaining: f32,
}

impl Cooldown {
    /// Create a cooldown of `duration` seconds that starts ready
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }

    /// Create a cooldown that must elapse once before the first trigger
    pub fn started(duration: f32) -> Self {
        let mut cooldown = Self::new(duration);
        cooldown.remaining = cooldown.duration;
        cooldown
    }

    /// Advance by `delta_time` seconds (call once per frame)
    pub fn tick(&mut self, delta_time: f32) {
        self.remaining = (self.remaining - delta_time.max(0.0)).max(0.0);
    }

    /// Whether the action may fire now
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Fire if ready, restarting the cooldown. Returns whether it fired.
    pub fn trigger(&mut self) -> bool {
        if self.is_ready() {
            self.remaining = self.duration;
            true
        } else {
            false
        }
    }

    /// Seconds left until ready
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Configured cooldown length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Make the cooldown ready immediately
    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
