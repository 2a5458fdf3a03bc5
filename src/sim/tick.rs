//! Per-frame entity update
//!
//! [`EntityUpdateEngine::advance_all`] replaces every collection with the
//! entities that survived this frame: each type is advanced, then filtered
//! by its retention predicate, then (for budgeted pools) trimmed from the
//! front until it fits its cap.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{
    Bounds, Collectible, EntityKind, Falling, FloatingText, Particle, Platform, Scroller,
    TrailEmitter, TrailKind, TrailParticle, Transient,
};
use super::events::GameEvent;
use super::store::EntityStore;
use crate::tuning::Tuning;

/// What the engine needs to know about the player this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerView {
    pub center: Vec2,
    /// Turbo/boost state: the player out-runs the normal magnet speed
    pub turbo: bool,
}

/// Owns the entity store and advances it once per frame
pub struct EntityUpdateEngine {
    store: EntityStore,
    tuning: Tuning,
    rng: Pcg32,
    on_platform_exit: Option<Box<dyn FnMut(u32)>>,
}

impl EntityUpdateEngine {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            store: EntityStore::new(),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            on_platform_exit: None,
        }
    }

    /// Level-progress hook, called once per culled non-safety platform
    pub fn set_platform_exit_handler(&mut self, handler: impl FnMut(u32) + 'static) {
        self.on_platform_exit = Some(Box::new(handler));
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Spawn call sites (level loader, collision handlers) write through here
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// [`EntityStore::emit_burst`] driven by the engine's seeded RNG
    pub fn emit_burst(&mut self, kind: EntityKind, origin: Vec2, count: usize, speed: f32) -> bool {
        self.store.emit_burst(kind, origin, count, speed, &mut self.rng)
    }

    /// Advance every collection by `dt` seconds
    ///
    /// `scroll_speed` is the camera's horizontal speed; scrolling objects
    /// move by `(own velocity - scroll_speed) * dt`.
    pub fn advance_all(&mut self, dt: f32, scroll_speed: f32, player: &PlayerView) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let tuning = &self.tuning;
        let bounds = Bounds {
            exit_margin: tuning.exit_margin,
            floor: tuning.rain_floor,
            epsilon: tuning.particle_epsilon,
        };
        let store = &mut self.store;

        // Platforms
        let mut exited = Vec::new();
        for platform in store.platforms.iter_mut() {
            platform.pos.x += (platform.vel_x - scroll_speed) * dt;
            platform.animate(dt);
        }
        store.platforms.retain(|p| {
            if p.is_retained(&bounds) {
                return true;
            }
            cull_platform(p, &mut events, &mut exited);
            false
        });
        for index in exited {
            events.push(GameEvent::PlatformExited { index });
            if let Some(handler) = self.on_platform_exit.as_mut() {
                handler(index);
            }
        }

        // Plain scrollers
        for pool in [
            &mut store.obstacles,
            &mut store.hearts,
            &mut store.boosts,
            &mut store.bonuses,
        ] {
            advance_scrollers(pool, dt, scroll_speed, &bounds);
        }

        advance_collectibles(&mut store.collectibles, dt, scroll_speed, player, tuning, &bounds, &mut events);
        advance_falling(&mut store.rained_collectibles, dt, tuning, &bounds);
        advance_trails(&mut store.trails, dt, scroll_speed, tuning, &mut self.rng, &bounds);

        // Free particles
        advance_particles(&mut store.powerup_particles, dt, scroll_speed, Some(tuning.gravity), &bounds);
        advance_particles(&mut store.boost_particles, dt, scroll_speed, None, &bounds);
        for (kind, pool, cap) in [
            (
                EntityKind::PowerupParticles,
                &mut store.powerup_particles,
                tuning.budgets.powerup_particles,
            ),
            (
                EntityKind::BoostParticles,
                &mut store.boost_particles,
                tuning.budgets.boost_particles,
            ),
        ] {
            let count = enforce_budget(pool, cap);
            if count > 0 {
                events.push(GameEvent::ParticlesEvicted { kind, count });
            }
        }

        // Floating text
        advance_texts(&mut store.floating_texts, dt, tuning.floating_text_rise, &bounds);
        let count = enforce_budget(&mut store.floating_texts, tuning.budgets.floating_texts);
        if count > 0 {
            events.push(GameEvent::ParticlesEvicted {
                kind: EntityKind::FloatingTexts,
                count,
            });
        }

        events
    }
}

fn cull_platform(platform: &Platform, events: &mut Vec<GameEvent>, exited: &mut Vec<u32>) {
    if platform.is_expired() {
        events.push(GameEvent::PlatformCrumbled {
            index: platform.index,
        });
    }
    if platform.safety {
        return;
    }
    match platform.index {
        Some(index) => exited.push(index),
        None => log::debug!("Culled platform has no index, skipping exit notification"),
    }
}

/// Drop the oldest `len - cap` entries; returns how many were dropped
pub fn enforce_budget<T>(pool: &mut Vec<T>, cap: usize) -> usize {
    if pool.len() <= cap {
        return 0;
    }
    let excess = pool.len() - cap;
    pool.drain(..excess);
    log::debug!("Evicted {} over-budget entities", excess);
    excess
}

fn advance_scrollers(pool: &mut Vec<Scroller>, dt: f32, scroll_speed: f32, bounds: &Bounds) {
    for s in pool.iter_mut() {
        s.pos.x += (s.vel_x - scroll_speed) * dt;
        s.phase = (s.phase + dt) % std::f32::consts::TAU;
    }
    pool.retain(|s| s.is_retained(bounds));
}

fn advance_collectibles(
    pool: &mut Vec<Collectible>,
    dt: f32,
    scroll_speed: f32,
    player: &PlayerView,
    tuning: &Tuning,
    bounds: &Bounds,
    events: &mut Vec<GameEvent>,
) {
    let pull_speed = if player.turbo {
        tuning.magnet_turbo_speed
    } else {
        tuning.magnet_speed
    };

    let pickup_radius = tuning.magnet_pickup_radius;
    pool.retain_mut(|c| {
        c.phase = (c.phase + dt) % std::f32::consts::TAU;
        if !c.is_magnetized() {
            c.pos.x += (c.vel_x - scroll_speed) * dt;
            return c.is_retained(bounds);
        }

        let to_player = player.center - c.center();
        let dist = to_player.length();
        let step = pull_speed * dt;
        if step >= dist {
            c.pos = player.center - c.size * 0.5;
        } else {
            c.pos += to_player / dist * step;
        }

        if c.center().distance(player.center) <= pickup_radius {
            events.push(GameEvent::Collected {
                kind: EntityKind::Collectibles,
                value: c.value,
                pos: c.center(),
            });
            return false;
        }

        c.magnet_timer = (c.magnet_timer - dt).max(0.0);
        if c.magnet_timer == 0.0 {
            events.push(GameEvent::MagnetExpired);
        }
        c.is_retained(bounds)
    });
}

fn advance_falling(pool: &mut Vec<Falling>, dt: f32, tuning: &Tuning, bounds: &Bounds) {
    for f in pool.iter_mut() {
        f.vel.y += tuning.gravity * dt;
        f.vel.x = tuning.rain_drift;
        f.pos += f.vel * dt;
    }
    pool.retain(|f| f.is_retained(bounds));
}

fn advance_trails(
    pool: &mut Vec<TrailEmitter>,
    dt: f32,
    scroll_speed: f32,
    tuning: &Tuning,
    rng: &mut Pcg32,
    bounds: &Bounds,
) {
    let cap = tuning.budgets.trail_particles;
    for trail in pool.iter_mut() {
        trail.pos.x += (trail.vel_x - scroll_speed) * dt;
        trail.remaining = (trail.remaining - dt).max(0.0);

        for dot in trail.particles.iter_mut() {
            dot.pos.x -= scroll_speed * dt;
            dot.life -= dt;
            dot.size *= (1.0 - 2.0 * dt).max(0.0);
        }
        trail.particles.retain(|dot| dot.life > 0.0);

        if trail.is_emitting()
            && trail.particles.len() < cap
            && rng.random::<f32>() < tuning.trail_spawn_chance
        {
            let size = match trail.kind {
                TrailKind::Boost => 3.0,
                TrailKind::Rainbow => 4.5,
            };
            trail.particles.push(TrailParticle {
                pos: trail.pos,
                life: tuning.trail_particle_life,
                size,
            });
        }
    }
    pool.retain(|t| t.is_retained(bounds));
}

fn advance_particles(
    pool: &mut Vec<Particle>,
    dt: f32,
    scroll_speed: f32,
    gravity: Option<f32>,
    bounds: &Bounds,
) {
    for p in pool.iter_mut() {
        p.pos += p.vel * dt;
        p.pos.x -= scroll_speed * dt;
        if let Some(g) = gravity {
            p.vel.y += g * dt;
        } else {
            // Sparks lose speed instead of falling
            p.vel *= (1.0 - 2.0 * dt).max(0.0);
        }
        p.life -= p.decay * dt;
        p.size *= (1.0 - 0.3 * dt).max(0.0);
    }
    // Cut slightly above zero so faded particles don't sit at the cap
    pool.retain(|p| p.is_retained(bounds));
}

fn advance_texts(pool: &mut Vec<FloatingText>, dt: f32, rise: f32, bounds: &Bounds) {
    for t in pool.iter_mut() {
        t.life -= dt;
        t.pos.y -= rise * dt;
        t.opacity = if t.max_life > 0.0 {
            (t.life / t.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
    pool.retain(|t| t.is_retained(bounds));
}
