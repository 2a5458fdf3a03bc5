//! Entity simulation module
//!
//! All transient game objects live here. The module is pure and synchronous:
//! - Typed collections keyed by [`EntityKind`], oldest entry first
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod entity;
pub mod events;
pub mod store;
pub mod tick;

pub use entity::{
    Bounds, Collectible, Entity, EntityKind, Falling, FloatingText, Particle, Platform,
    PlatformKind, Scroller, TrailEmitter, TrailKind, TrailParticle, Transient,
};
pub use events::GameEvent;
pub use store::{EntityStore, RenderView};
pub use tick::{EntityUpdateEngine, PlayerView, enforce_budget};
