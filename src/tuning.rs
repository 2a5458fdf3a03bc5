//! Data-driven game balance
//!
//! Every constant the entity engine, camera and state machine read lives
//! here so a game can ship its own JSON without touching code.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Retention caps for the fast-spawning entity categories
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budgets {
    pub powerup_particles: usize,
    pub boost_particles: usize,
    pub floating_texts: usize,
    /// Per-emitter cap, kept below the global pools
    pub trail_particles: usize,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            powerup_particles: 30,
            boost_particles: 60,
            floating_texts: 16,
            trail_particles: 12,
        }
    }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub budgets: Budgets,
    /// Scrolling objects are kept while `x + width > exit_margin`
    pub exit_margin: f32,
    /// Downward acceleration for rained-down collectibles and powerup particles (px/s²)
    pub gravity: f32,
    /// Constant horizontal drift of rained-down collectibles (px/s)
    pub rain_drift: f32,
    /// Rained-down collectibles are dropped once below this y
    pub rain_floor: f32,
    /// Magnet pull speed (px/s)
    pub magnet_speed: f32,
    /// Magnet pull speed while the player is in turbo
    pub magnet_turbo_speed: f32,
    /// Distance at which a magnetized collectible counts as collected
    pub magnet_pickup_radius: f32,
    /// Particles with less life than this are dropped
    pub particle_epsilon: f32,
    /// Per-frame probability that an active trail emits a particle
    pub trail_spawn_chance: f32,
    /// Lifetime of one trail particle (s)
    pub trail_particle_life: f32,
    /// Floating text rise speed (px/s)
    pub floating_text_rise: f32,
    /// Per-axis camera smoothing, fraction closed per 1/60 s
    pub camera_rates: Vec3,
    /// Seconds between session heartbeats while playing
    pub heartbeat_interval_secs: f32,
    /// How long GoalReached lingers before the level summary
    pub goal_celebration_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            budgets: Budgets::default(),
            exit_margin: -50.0,
            gravity: 900.0,
            rain_drift: -40.0,
            rain_floor: 800.0,
            magnet_speed: 600.0,
            magnet_turbo_speed: 1100.0,
            magnet_pickup_radius: 12.0,
            particle_epsilon: 0.02,
            trail_spawn_chance: 0.3,
            trail_particle_life: 0.5,
            floating_text_rise: 40.0,
            camera_rates: Vec3::new(0.05, 0.05, 0.15),
            heartbeat_interval_secs: 30.0,
            goal_celebration_secs: 1.5,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Fold player preferences into the balance values
    pub fn apply_settings(&mut self, settings: &Settings) {
        let defaults = Budgets::default();
        let scale = |base: usize| -> usize {
            if !settings.particles {
                0
            } else {
                ((base as f32 * settings.quality.particle_scale()).round() as usize).max(1)
            }
        };
        self.budgets.powerup_particles = scale(defaults.powerup_particles);
        self.budgets.boost_particles = scale(defaults.boost_particles);
        self.budgets.trail_particles = scale(defaults.trail_particles);

        if settings.reduced_motion {
            // Hard-lock the camera instead of easing
            self.camera_rates = Vec3::splat(crate::camera::MAX_RATE);
        }
    }
}
