//! Entity store
//!
//! One ordered `Vec` per [`EntityKind`]. Insertion order is eviction order:
//! index 0 is always the oldest entity of its collection.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{
    Collectible, Entity, EntityKind, Falling, FloatingText, Particle, Platform, Scroller,
    TrailEmitter,
};

/// All transient game objects of one running game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub platforms: Vec<Platform>,
    pub obstacles: Vec<Scroller>,
    pub collectibles: Vec<Collectible>,
    pub hearts: Vec<Scroller>,
    pub boosts: Vec<Scroller>,
    pub bonuses: Vec<Scroller>,
    pub rained_collectibles: Vec<Falling>,
    pub trails: Vec<TrailEmitter>,
    pub powerup_particles: Vec<Particle>,
    pub boost_particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,
}

/// Borrowed, read-only view of the store for the renderer
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub platforms: &'a [Platform],
    pub obstacles: &'a [Scroller],
    pub collectibles: &'a [Collectible],
    pub hearts: &'a [Scroller],
    pub boosts: &'a [Scroller],
    pub bonuses: &'a [Scroller],
    pub rained_collectibles: &'a [Falling],
    pub trails: &'a [TrailEmitter],
    pub powerup_particles: &'a [Particle],
    pub boost_particles: &'a [Particle],
    pub floating_texts: &'a [FloatingText],
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entity` to the `kind` collection
    ///
    /// Returns false (and drops the entity) when its shape does not match
    /// the collection.
    pub fn insert(&mut self, kind: EntityKind, entity: Entity) -> bool {
        match (kind, entity) {
            (EntityKind::Platforms, Entity::Platform(p)) => self.platforms.push(p),
            (EntityKind::Obstacles, Entity::Scroller(s)) => self.obstacles.push(s),
            (EntityKind::Hearts, Entity::Scroller(s)) => self.hearts.push(s),
            (EntityKind::Boosts, Entity::Scroller(s)) => self.boosts.push(s),
            (EntityKind::Bonuses, Entity::Scroller(s)) => self.bonuses.push(s),
            (EntityKind::Collectibles, Entity::Collectible(c)) => self.collectibles.push(c),
            (EntityKind::RainedCollectibles, Entity::Falling(f)) => {
                self.rained_collectibles.push(f)
            }
            (EntityKind::Trails, Entity::Trail(t)) => self.trails.push(t),
            (EntityKind::PowerupParticles, Entity::Particle(p)) => self.powerup_particles.push(p),
            (EntityKind::BoostParticles, Entity::Particle(p)) => self.boost_particles.push(p),
            (EntityKind::FloatingTexts, Entity::Text(t)) => self.floating_texts.push(t),
            (kind, entity) => {
                log::warn!(
                    "Dropping {}: it does not belong in '{}'",
                    entity_label(&entity),
                    kind.as_str()
                );
                return false;
            }
        }
        true
    }

    /// Insert by collection name (level data, scripted spawns)
    ///
    /// Unknown names are a warning, not an error: the entity is dropped.
    pub fn insert_named(&mut self, name: &str, entity: Entity) -> bool {
        match EntityKind::parse(name) {
            Some(kind) => self.insert(kind, entity),
            None => {
                log::warn!("Unknown entity collection '{}', entity dropped", name);
                false
            }
        }
    }

    /// Number of live entities in one collection
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Platforms => self.platforms.len(),
            EntityKind::Obstacles => self.obstacles.len(),
            EntityKind::Collectibles => self.collectibles.len(),
            EntityKind::Hearts => self.hearts.len(),
            EntityKind::Boosts => self.boosts.len(),
            EntityKind::Bonuses => self.bonuses.len(),
            EntityKind::RainedCollectibles => self.rained_collectibles.len(),
            EntityKind::Trails => self.trails.len(),
            EntityKind::PowerupParticles => self.powerup_particles.len(),
            EntityKind::BoostParticles => self.boost_particles.len(),
            EntityKind::FloatingTexts => self.floating_texts.len(),
        }
    }

    pub fn total(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.len(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Drop everything (new run)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Emit `count` particles radiating from `origin` into a particle pool
    ///
    /// Spawning never evicts; the cap is enforced by the next update pass.
    pub fn emit_burst<R: Rng>(
        &mut self,
        kind: EntityKind,
        origin: Vec2,
        count: usize,
        speed: f32,
        rng: &mut R,
    ) -> bool {
        let pool = match kind {
            EntityKind::PowerupParticles => &mut self.powerup_particles,
            EntityKind::BoostParticles => &mut self.boost_particles,
            _ => {
                log::warn!("'{}' is not a particle pool", kind.as_str());
                return false;
            }
        };
        pool.reserve(count);
        for _ in 0..count {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let magnitude = speed * rng.random_range(0.5..1.0);
            let vel = Vec2::from_angle(angle) * magnitude;
            let size = rng.random_range(2.0..5.0);
            pool.push(Particle::new(origin, vel, size));
        }
        true
    }

    /// Popup text, e.g. "+10" over a collected coin
    pub fn spawn_floating_text(&mut self, pos: Vec2, text: impl Into<String>) {
        self.floating_texts.push(FloatingText::new(pos, text, 1.0));
    }

    /// Read-only snapshot for rendering
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            platforms: &self.platforms,
            obstacles: &self.obstacles,
            collectibles: &self.collectibles,
            hearts: &self.hearts,
            boosts: &self.boosts,
            bonuses: &self.bonuses,
            rained_collectibles: &self.rained_collectibles,
            trails: &self.trails,
            powerup_particles: &self.powerup_particles,
            boost_particles: &self.boost_particles,
            floating_texts: &self.floating_texts,
        }
    }
}

fn entity_label(entity: &Entity) -> &'static str {
    match entity {
        Entity::Platform(_) => "platform",
        Entity::Scroller(_) => "scroller",
        Entity::Collectible(_) => "collectible",
        Entity::Falling(_) => "falling collectible",
        Entity::Particle(_) => "particle",
        Entity::Trail(_) => "trail",
        Entity::Text(_) => "floating text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn heart() -> Entity {
        Entity::Scroller(Scroller::new(Vec2::new(300.0, 50.0), Vec2::splat(16.0)))
    }

    #[test]
    fn insert_routes_by_kind() {
        let mut store = EntityStore::new();
        assert!(store.insert(EntityKind::Hearts, heart()));
        assert!(store.insert_named("obstacles", heart()));
        assert_eq!(store.len(EntityKind::Hearts), 1);
        assert_eq!(store.len(EntityKind::Obstacles), 1);
        assert_eq!(store.total(), 2);
    }

    #[test]
    fn unknown_collection_drops_entity() {
        let mut store = EntityStore::new();
        assert!(!store.insert_named("ghosts", heart()));
        assert!(store.is_empty());
    }

    #[test]
    fn mismatched_shape_is_dropped() {
        let mut store = EntityStore::new();
        assert!(!store.insert(EntityKind::Platforms, heart()));
        assert!(store.is_empty());
    }

    #[test]
    fn burst_only_targets_particle_pools() {
        let mut store = EntityStore::new();
        let mut rng = Pcg32::seed_from_u64(7);
        assert!(store.emit_burst(EntityKind::BoostParticles, Vec2::ZERO, 12, 100.0, &mut rng));
        assert!(!store.emit_burst(EntityKind::Hearts, Vec2::ZERO, 12, 100.0, &mut rng));
        assert_eq!(store.boost_particles.len(), 12);
        assert!(store.boost_particles.iter().all(|p| p.life == 1.0));
    }

    #[test]
    fn render_view_mirrors_store() {
        let mut store = EntityStore::new();
        store.spawn_floating_text(Vec2::ZERO, "+10");
        store.insert(EntityKind::Hearts, heart());
        let view = store.render_view();
        assert_eq!(view.floating_texts.len(), 1);
        assert_eq!(view.floating_texts[0].text, "+10");
        assert_eq!(view.hearts.len(), 1);
    }
}
