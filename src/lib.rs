//! Arcade Sim - shared real-time core for the browser arcade games
//!
//! Core modules:
//! - `sim`: Entity store and per-frame update engine
//! - `camera`: Frame-rate independent follow camera
//! - `fsm`: Game flow state machine and collaborator contracts
//! - `input`: Discrete input actions and key bindings
//! - `tuning`: Data-driven game balance
//! - `game`: Per-frame loop tying the pieces together
//! - `score`, `highscores`, `level`, `audio`: stock collaborators

pub mod audio;
pub mod camera;
pub mod error;
pub mod fsm;
pub mod game;
pub mod highscores;
pub mod input;
pub mod level;
pub mod score;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod tuning;

pub use camera::CameraRig;
pub use error::{CollaboratorError, FsmError};
pub use fsm::{Collaborators, FlowOptions, StateId, StateMachine, TransitionContext};
pub use game::{FrameInput, GameLoop};
pub use highscores::HighScores;
pub use input::{Action, InputMapper};
pub use level::{LevelManager, LevelProgress};
pub use score::{ScoreBoard, ScoreKeeper, ScoreReport};
pub use settings::{QualityPreset, Settings};
pub use sim::{EntityStore, EntityUpdateEngine, GameEvent, PlayerView};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference tick the smoothing rates are tuned against (60 Hz)
    pub const REFERENCE_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta fed to the simulation (tab switches, debugger stalls)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Elapsed seconds expressed in reference ticks (1.0 == one 60 Hz frame)
#[inline]
pub fn normalized_dt(elapsed_secs: f32) -> f32 {
    elapsed_secs / consts::REFERENCE_DT
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
