//! Collaborators borrowed by every state method

use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};

use super::machine::StateId;
use super::task::TaskSpawner;
use crate::audio::AudioSink;
use crate::camera::CameraView;
use crate::error::CollaboratorError;
use crate::level::LevelManager;
use crate::score::{ScoreKeeper, ScoreReport};
use crate::sim::RenderView;

/// Result of a session SDK call
pub type SessionFuture = LocalBoxFuture<'static, Result<(), CollaboratorError>>;

/// Remote session/score service
///
/// Calls return immediately with a future; states never await them.
/// Implementations own their request timeouts.
pub trait SessionClient {
    fn start_session(&self) -> SessionFuture;

    /// Submit the final score of a level or run
    fn end_session(&self, report: ScoreReport) -> SessionFuture;

    fn heartbeat(&self) -> SessionFuture;
}

/// No backend: every call succeeds immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineSession;

impl SessionClient for OfflineSession {
    fn start_session(&self) -> SessionFuture {
        Box::pin(future::ready(Ok(())))
    }

    fn end_session(&self, report: ScoreReport) -> SessionFuture {
        log::debug!("Offline: score {} not submitted", report.score);
        Box::pin(future::ready(Ok(())))
    }

    fn heartbeat(&self) -> SessionFuture {
        Box::pin(future::ready(Ok(())))
    }
}

/// Render loop handoff
pub trait RenderSurface {
    /// Swap the visible screen/overlay
    fn show_screen(&mut self, screen: StateId);

    /// Start or stop the simulation part of the render loop
    fn set_running(&mut self, running: bool);

    /// Draw one frame; the view is read-only
    fn present(&mut self, _view: &RenderView<'_>, _camera: &CameraView) {}
}

/// Surface that only records what it was told, for headless runs
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    pub screen: Option<StateId>,
    pub running: bool,
    pub frames: u64,
    /// Entity count of the last presented frame
    pub last_entity_count: usize,
}

impl RenderSurface for HeadlessSurface {
    fn show_screen(&mut self, screen: StateId) {
        self.screen = Some(screen);
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn present(&mut self, view: &RenderView<'_>, _camera: &CameraView) {
        self.frames += 1;
        self.last_entity_count = view.platforms.len()
            + view.obstacles.len()
            + view.collectibles.len()
            + view.hearts.len()
            + view.boosts.len()
            + view.bonuses.len()
            + view.rained_collectibles.len()
            + view.trails.len()
            + view.powerup_particles.len()
            + view.boost_particles.len()
            + view.floating_texts.len();
    }
}

/// Per-call bundle of collaborators
///
/// Built by the host for each machine call and dropped right after; states
/// must not keep any of these references. Anything a detached task needs
/// (the session client, a ticket) is cloned out first.
pub struct TransitionContext<'a> {
    pub audio: &'a mut dyn AudioSink,
    pub surface: &'a mut dyn RenderSurface,
    pub score: &'a mut dyn ScoreKeeper,
    pub levels: &'a mut dyn LevelManager,
    pub session: &'a Rc<dyn SessionClient>,
    pub tasks: &'a dyn TaskSpawner,
}

/// Owned collaborators, lent out as a [`TransitionContext`] per call
pub struct Collaborators {
    pub audio: Box<dyn AudioSink>,
    pub surface: Box<dyn RenderSurface>,
    pub score: Box<dyn ScoreKeeper>,
    pub levels: Box<dyn LevelManager>,
    pub session: Rc<dyn SessionClient>,
    pub tasks: Box<dyn TaskSpawner>,
}

impl Collaborators {
    pub fn context(&mut self) -> TransitionContext<'_> {
        TransitionContext {
            audio: self.audio.as_mut(),
            surface: self.surface.as_mut(),
            score: self.score.as_mut(),
            levels: self.levels.as_mut(),
            session: &self.session,
            tasks: self.tasks.as_ref(),
        }
    }
}
