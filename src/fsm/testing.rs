//! Call-recording collaborators for state machine and game loop tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};

use super::context::{RenderSurface, SessionClient, SessionFuture, TransitionContext};
use super::machine::StateId;
use crate::audio::{AudioSink, SoundEffect};
use crate::error::CollaboratorError;
use crate::level::{LevelManager, LevelProgress, LevelSummary};
use crate::score::{RunStats, ScoreBoard, ScoreKeeper, ScoreReport};

/// Shared, ordered call log
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn log(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }
}

pub struct RecordingAudio(pub Journal);

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.0.log(format!("play {}", effect.name()));
    }

    fn suspend(&mut self) {
        self.0.log("suspend");
    }

    fn resume(&mut self) {
        self.0.log("resume");
    }
}

pub struct RecordingSurface {
    pub journal: Journal,
    pub running: bool,
    pub presented: usize,
}

impl RenderSurface for RecordingSurface {
    fn show_screen(&mut self, screen: StateId) {
        self.journal.log(format!("show {}", screen.as_str()));
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
        self.journal.log(format!("running {}", running));
    }

    fn present(&mut self, _view: &crate::sim::RenderView<'_>, _camera: &crate::camera::CameraView) {
        self.presented += 1;
    }
}

pub struct RecordingScore {
    pub journal: Journal,
    pub board: ScoreBoard,
}

impl ScoreKeeper for RecordingScore {
    fn add_points(&mut self, points: u64) {
        self.board.add_points(points);
    }

    fn stats_mut(&mut self) -> &mut RunStats {
        self.board.stats_mut()
    }

    fn snapshot(&self) -> ScoreReport {
        self.board.snapshot()
    }

    fn reset_level(&mut self) {
        self.journal.log("reset_level");
        self.board.reset_level();
    }

    fn reset(&mut self) {
        self.journal.log("reset");
        self.board.reset();
    }

    fn record_high_score(&mut self, report: &ScoreReport) -> Option<usize> {
        self.journal.log(format!("record_high_score {}", report.score));
        self.board.record_high_score(report)
    }
}

pub struct RecordingLevels {
    pub journal: Journal,
    pub progress: LevelProgress,
}

impl LevelManager for RecordingLevels {
    fn current_level(&self) -> u32 {
        self.progress.current_level()
    }

    fn level_count(&self) -> u32 {
        self.progress.level_count()
    }

    fn load_level(&mut self, index: u32) {
        self.journal.log(format!("load_level {}", index));
        self.progress.load_level(index);
    }

    fn platform_exited(&mut self, index: u32) {
        self.journal.log(format!("platform_exited {}", index));
        self.progress.platform_exited(index);
    }

    fn level_summary(&self) -> LevelSummary {
        self.progress.level_summary()
    }

    fn complete_level(&mut self) {
        self.journal.log("complete_level");
        self.progress.complete_level();
    }
}

/// Session whose calls can be made to fail or to stay pending
#[derive(Default)]
pub struct ScriptedSession {
    journal: Journal,
    pub fail: Cell<bool>,
    pub hold: Cell<bool>,
    held: RefCell<Vec<oneshot::Sender<()>>>,
}

impl ScriptedSession {
    /// Let every held call settle
    pub fn release(&self) {
        for gate in self.held.borrow_mut().drain(..) {
            let _ = gate.send(());
        }
    }

    fn call(&self, entry: String) -> SessionFuture {
        self.journal.log(entry);
        let fail = self.fail.get();
        let gate = self.hold.get().then(|| {
            let (tx, rx) = oneshot::channel();
            self.held.borrow_mut().push(tx);
            rx
        });
        Box::pin(async move {
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            if fail {
                Err(CollaboratorError::Network("scripted failure".into()))
            } else {
                Ok(())
            }
        })
    }
}

impl SessionClient for ScriptedSession {
    fn start_session(&self) -> SessionFuture {
        self.call("start_session".into())
    }

    fn end_session(&self, report: ScoreReport) -> SessionFuture {
        self.call(format!("end_session score={}", report.score))
    }

    fn heartbeat(&self) -> SessionFuture {
        self.call("heartbeat".into())
    }
}

/// Every collaborator recording into one journal, plus an executor
pub struct Harness {
    pub journal: Journal,
    pub pool: LocalPool,
    spawner: LocalSpawner,
    pub audio: RecordingAudio,
    pub surface: RecordingSurface,
    pub score: RecordingScore,
    pub levels: RecordingLevels,
    pub session: Rc<ScriptedSession>,
    session_dyn: Rc<dyn SessionClient>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let session = Rc::new(ScriptedSession {
            journal: journal.clone(),
            ..ScriptedSession::default()
        });
        let session_dyn: Rc<dyn SessionClient> = session.clone();
        Self {
            audio: RecordingAudio(journal.clone()),
            surface: RecordingSurface {
                journal: journal.clone(),
                running: false,
                presented: 0,
            },
            score: RecordingScore {
                journal: journal.clone(),
                board: ScoreBoard::default(),
            },
            levels: RecordingLevels {
                journal: journal.clone(),
                progress: LevelProgress::new(vec![20, 25, 30]),
            },
            journal,
            pool,
            spawner,
            session,
            session_dyn,
        }
    }

    pub fn ctx(&mut self) -> TransitionContext<'_> {
        TransitionContext {
            audio: &mut self.audio,
            surface: &mut self.surface,
            score: &mut self.score,
            levels: &mut self.levels,
            session: &self.session_dyn,
            tasks: &self.spawner,
        }
    }

    /// Drive detached tasks until none can make progress
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }
}
