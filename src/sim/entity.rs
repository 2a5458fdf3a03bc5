//! Entity types
//!
//! Entities carry no identity: each lives in exactly one typed collection
//! and is only addressed by its position in that collection during an
//! update pass. Per-type fields belong to the per-type struct.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Every collection the store knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Platforms,
    Obstacles,
    Collectibles,
    Hearts,
    Boosts,
    Bonuses,
    RainedCollectibles,
    Trails,
    PowerupParticles,
    BoostParticles,
    FloatingTexts,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Platforms,
        EntityKind::Obstacles,
        EntityKind::Collectibles,
        EntityKind::Hearts,
        EntityKind::Boosts,
        EntityKind::Bonuses,
        EntityKind::RainedCollectibles,
        EntityKind::Trails,
        EntityKind::PowerupParticles,
        EntityKind::BoostParticles,
        EntityKind::FloatingTexts,
    ];

    /// Collection name as used by level data and spawn call sites
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Platforms => "platforms",
            EntityKind::Obstacles => "obstacles",
            EntityKind::Collectibles => "collectibles",
            EntityKind::Hearts => "hearts",
            EntityKind::Boosts => "boosts",
            EntityKind::Bonuses => "bonuses",
            EntityKind::RainedCollectibles => "rainedCollectibles",
            EntityKind::Trails => "trails",
            EntityKind::PowerupParticles => "powerupParticles",
            EntityKind::BoostParticles => "boostParticles",
            EntityKind::FloatingTexts => "floatingTexts",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Whether `entity` has the shape this collection stores
    pub fn accepts(&self, entity: &Entity) -> bool {
        matches!(
            (self, entity),
            (EntityKind::Platforms, Entity::Platform(_))
                | (
                    EntityKind::Obstacles
                        | EntityKind::Hearts
                        | EntityKind::Boosts
                        | EntityKind::Bonuses,
                    Entity::Scroller(_)
                )
                | (EntityKind::Collectibles, Entity::Collectible(_))
                | (EntityKind::RainedCollectibles, Entity::Falling(_))
                | (EntityKind::Trails, Entity::Trail(_))
                | (
                    EntityKind::PowerupParticles | EntityKind::BoostParticles,
                    Entity::Particle(_)
                )
                | (EntityKind::FloatingTexts, Entity::Text(_))
        )
    }
}

/// Thresholds a retention predicate is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    /// Horizontal exit line (small negative number)
    pub exit_margin: f32,
    /// Lowest y a falling object may reach
    pub floor: f32,
    /// Minimum life a particle needs to stay alive
    pub epsilon: f32,
}

/// Shared surface of every entity type
pub trait Transient {
    fn position(&self) -> Vec2;

    /// Remaining life in seconds, for timed entities
    fn life(&self) -> Option<f32> {
        None
    }

    /// Whether the entity survives the current update pass
    fn is_retained(&self, bounds: &Bounds) -> bool;
}

/// Platform behaviour and its per-type timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlatformKind {
    Solid,
    /// Falls apart `duration` seconds after spawning
    Crumbling { elapsed: f32, duration: f32 },
    /// Fades out `duration` seconds after spawning
    Dissolving { elapsed: f32, duration: f32 },
    /// Bobs vertically around `base_y`
    Bouncing {
        phase: f32,
        amplitude: f32,
        frequency: f32,
        base_y: f32,
    },
    Rotating { angle: f32, speed: f32 },
    /// Compressed by a landing, springs back at `recover` per second
    Spring { compression: f32, recover: f32 },
    Icy { shimmer: f32 },
}

/// A platform scrolling with the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel_x: f32,
    /// Level-progress index; platforms without one never report exits
    pub index: Option<u32>,
    /// Safety platforms never report exits
    pub safety: bool,
    pub kind: PlatformKind,
}

impl Platform {
    pub fn new(pos: Vec2, size: Vec2, index: Option<u32>, kind: PlatformKind) -> Self {
        Self {
            pos,
            size,
            vel_x: 0.0,
            index,
            safety: false,
            kind,
        }
    }

    pub fn safety(mut self) -> Self {
        self.safety = true;
        self
    }

    pub fn crumbling(pos: Vec2, size: Vec2, index: Option<u32>, duration: f32) -> Self {
        Self::new(
            pos,
            size,
            index,
            PlatformKind::Crumbling {
                elapsed: 0.0,
                duration,
            },
        )
    }

    /// Called by collision handling when the player lands
    pub fn on_landed(&mut self) {
        if let PlatformKind::Spring { compression, .. } = &mut self.kind {
            *compression = 1.0;
        }
    }

    /// True once a timed platform has run out
    pub fn is_expired(&self) -> bool {
        match self.kind {
            PlatformKind::Crumbling { elapsed, duration }
            | PlatformKind::Dissolving { elapsed, duration } => elapsed >= duration,
            _ => false,
        }
    }

    /// Advance per-type timers and phases
    pub fn animate(&mut self, dt: f32) {
        match &mut self.kind {
            PlatformKind::Solid => {}
            PlatformKind::Crumbling { elapsed, .. } | PlatformKind::Dissolving { elapsed, .. } => {
                *elapsed += dt
            }
            PlatformKind::Bouncing {
                phase,
                amplitude,
                frequency,
                base_y,
            } => {
                *phase = (*phase + dt * *frequency) % std::f32::consts::TAU;
                self.pos.y = *base_y + phase.sin() * *amplitude;
            }
            PlatformKind::Rotating { angle, speed } => {
                *angle = (*angle + *speed * dt) % std::f32::consts::TAU;
            }
            PlatformKind::Spring {
                compression,
                recover,
            } => {
                *compression = (*compression - *recover * dt).max(0.0);
            }
            PlatformKind::Icy { shimmer } => *shimmer = (*shimmer + dt) % 1.0,
        }
    }
}

impl Transient for Platform {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        self.pos.x + self.size.x > bounds.exit_margin && !self.is_expired()
    }
}

/// Plain horizontally scrolling object (obstacles, hearts, boosts, bonuses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scroller {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel_x: f32,
    /// Idle animation phase (bobbing, spinning)
    pub phase: f32,
}

impl Scroller {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel_x: 0.0,
            phase: 0.0,
        }
    }
}

impl Transient for Scroller {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        self.pos.x + self.size.x > bounds.exit_margin
    }
}

/// Scrolling collectible that can be pulled by a magnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel_x: f32,
    pub value: u32,
    /// Seconds of magnet pull left; 0 when not magnetized
    pub magnet_timer: f32,
    pub phase: f32,
}

impl Collectible {
    pub fn new(pos: Vec2, size: Vec2, value: u32) -> Self {
        Self {
            pos,
            size,
            vel_x: 0.0,
            value,
            magnet_timer: 0.0,
            phase: 0.0,
        }
    }

    pub fn is_magnetized(&self) -> bool {
        self.magnet_timer > 0.0
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

impl Transient for Collectible {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        // A pulled collectible may be behind the exit line while chasing the player
        self.is_magnetized() || self.pos.x + self.size.x > bounds.exit_margin
    }
}

/// Gravity-affected collectible (coin rain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Falling {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub value: u32,
}

impl Transient for Falling {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        self.pos.y < bounds.floor && self.pos.x + self.size.x > bounds.exit_margin
    }
}

/// Free particle (powerup bursts, boost sparks)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0-1, decreases over time
    pub life: f32,
    /// Life lost per second
    pub decay: f32,
    pub size: f32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, size: f32) -> Self {
        Self {
            pos,
            vel,
            life: 1.0,
            decay: 1.5,
            size,
        }
    }
}

impl Transient for Particle {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn life(&self) -> Option<f32> {
        Some(self.life)
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        self.life > bounds.epsilon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailKind {
    Boost,
    Rainbow,
}

/// One dot of a trail, in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailParticle {
    pub pos: Vec2,
    pub life: f32,
    pub size: f32,
}

/// An object leaving a trail behind it, owning its own particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailEmitter {
    pub pos: Vec2,
    pub vel_x: f32,
    pub kind: TrailKind,
    /// Seconds of emission left
    pub remaining: f32,
    /// Oldest first
    pub particles: Vec<TrailParticle>,
}

impl TrailEmitter {
    pub fn new(pos: Vec2, kind: TrailKind, remaining: f32) -> Self {
        Self {
            pos,
            vel_x: 0.0,
            kind,
            remaining,
            particles: Vec::new(),
        }
    }

    pub fn is_emitting(&self) -> bool {
        self.remaining > 0.0
    }
}

impl Transient for TrailEmitter {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn life(&self) -> Option<f32> {
        Some(self.remaining)
    }

    fn is_retained(&self, bounds: &Bounds) -> bool {
        // Linger on screen until the last dot has faded
        self.pos.x > bounds.exit_margin && (self.is_emitting() || !self.particles.is_empty())
    }
}

/// "+10" style popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub life: f32,
    pub max_life: f32,
    pub opacity: f32,
}

impl FloatingText {
    pub fn new(pos: Vec2, text: impl Into<String>, life: f32) -> Self {
        Self {
            pos,
            text: text.into(),
            life,
            max_life: life,
            opacity: 1.0,
        }
    }
}

impl Transient for FloatingText {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn life(&self) -> Option<f32> {
        Some(self.life)
    }

    fn is_retained(&self, _bounds: &Bounds) -> bool {
        self.life > 0.0
    }
}

/// Any entity, as handed to the store's insertion primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Platform(Platform),
    Scroller(Scroller),
    Collectible(Collectible),
    Falling(Falling),
    Particle(Particle),
    Trail(TrailEmitter),
    Text(FloatingText),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("powerupParticles"), Some(EntityKind::PowerupParticles));
        assert_eq!(EntityKind::parse("ghosts"), None);
    }

    #[test]
    fn kinds_reject_wrong_shapes() {
        let particle = Entity::Particle(Particle::new(Vec2::ZERO, Vec2::ZERO, 2.0));
        assert!(EntityKind::BoostParticles.accepts(&particle));
        assert!(!EntityKind::Platforms.accepts(&particle));
        let heart = Entity::Scroller(Scroller::new(Vec2::ZERO, Vec2::ONE));
        assert!(EntityKind::Hearts.accepts(&heart));
        assert!(!EntityKind::Collectibles.accepts(&heart));
    }

    #[test]
    fn crumbling_timer_runs_untouched() {
        let mut p = Platform::crumbling(Vec2::ZERO, Vec2::new(50.0, 10.0), Some(1), 0.5);
        p.animate(0.3);
        assert!(!p.is_expired());
        // Landing does not reset or pause the timer
        p.on_landed();
        p.animate(0.3);
        assert!(p.is_expired());
    }

    #[test]
    fn bouncing_platform_stays_within_amplitude() {
        let mut p = Platform::new(
            Vec2::new(0.0, 100.0),
            Vec2::new(40.0, 10.0),
            None,
            PlatformKind::Bouncing {
                phase: 0.0,
                amplitude: 15.0,
                frequency: 3.0,
                base_y: 100.0,
            },
        );
        for _ in 0..200 {
            p.animate(1.0 / 60.0);
            assert!((p.pos.y - 100.0).abs() <= 15.0 + 1e-4);
        }
    }

    #[test]
    fn spring_recovers() {
        let mut p = Platform::new(
            Vec2::ZERO,
            Vec2::ONE,
            None,
            PlatformKind::Spring {
                compression: 0.0,
                recover: 2.0,
            },
        );
        p.on_landed();
        p.animate(0.25);
        assert_eq!(p.kind, PlatformKind::Spring { compression: 0.5, recover: 2.0 });
        p.animate(1.0);
        assert_eq!(p.kind, PlatformKind::Spring { compression: 0.0, recover: 2.0 });
    }
}
