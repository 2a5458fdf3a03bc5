//! Stock game flow states
//!
//! Menu -> (LevelSelect) -> Playing <-> Paused
//! Playing -> GoalReached -> LevelSummary -> Playing | Menu
//! Playing -> GameOver -> Playing | Menu

use std::cell::Cell;
use std::rc::Rc;

use super::context::TransitionContext;
use super::machine::{Entry, GameState, StateId, StateMachine};
use super::task::detach;
use crate::audio::SoundEffect;
use crate::error::CollaboratorError;
use crate::input::Action;
use crate::level::LevelSummary;
use crate::score::ScoreReport;
use crate::tuning::Tuning;

/// Which optional screens a game uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOptions {
    pub level_select: bool,
    /// Show GoalReached before the level summary
    pub celebrate_goal: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            level_select: true,
            celebrate_goal: true,
        }
    }
}

/// Outcome of the latest score submission, as seen by its screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Pending,
    Saved,
    Failed,
}

/// Machine with every stock state registered
pub fn standard_machine(tuning: &Tuning, options: FlowOptions) -> StateMachine {
    let mut machine = StateMachine::new();
    machine.register(Box::new(MenuState::new(options.level_select)));
    if options.level_select {
        machine.register(Box::new(LevelSelectState));
    }
    machine.register(Box::new(PlayingState::new(
        tuning.heartbeat_interval_secs,
        options.celebrate_goal,
    )));
    machine.register(Box::new(PausedState::default()));
    if options.celebrate_goal {
        machine.register(Box::new(GoalReachedState::new(tuning.goal_celebration_secs)));
    }
    machine.register(Box::new(LevelSummaryState::default()));
    machine.register(Box::new(GameOverState::default()));
    machine
}

/// Issue `end_session` with a stable copy of the report
///
/// The call is issued before this returns, so callers may reset score state
/// right after. The settled result only updates `status` while the screen
/// that issued it is still current.
fn submit_report(
    entry: &Entry,
    ctx: &mut TransitionContext<'_>,
    report: ScoreReport,
    status: &Rc<Cell<SubmitStatus>>,
) {
    status.set(SubmitStatus::Pending);
    let call = ctx.session.end_session(report);
    let status = status.clone();
    let ticket = entry.ticket.clone();
    detach(ctx.tasks, "end_session", async move {
        let result = call.await;
        if ticket.is_current() {
            status.set(if result.is_ok() {
                SubmitStatus::Saved
            } else {
                SubmitStatus::Failed
            });
        } else {
            log::debug!("Score submission settled after its screen closed");
        }
        result
    });
}

pub struct MenuState {
    level_select: bool,
}

impl MenuState {
    pub fn new(level_select: bool) -> Self {
        Self { level_select }
    }
}

impl GameState for MenuState {
    fn id(&self) -> StateId {
        StateId::Menu
    }

    fn enter(&mut self, _entry: &Entry, ctx: &mut TransitionContext<'_>) {
        ctx.surface.set_running(false);
        ctx.surface.show_screen(StateId::Menu);
    }

    fn handle_input(&mut self, action: Action, ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::Start | Action::Continue => {
                ctx.audio.play(SoundEffect::MenuSelect);
                if self.level_select {
                    Some(StateId::LevelSelect)
                } else {
                    ctx.levels.load_level(0);
                    Some(StateId::Playing)
                }
            }
            _ => None,
        }
    }
}

pub struct LevelSelectState;

impl GameState for LevelSelectState {
    fn id(&self) -> StateId {
        StateId::LevelSelect
    }

    fn enter(&mut self, _entry: &Entry, ctx: &mut TransitionContext<'_>) {
        ctx.surface.show_screen(StateId::LevelSelect);
    }

    fn handle_input(&mut self, action: Action, ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::SelectLevel(index) if index < ctx.levels.level_count() => {
                ctx.audio.play(SoundEffect::MenuSelect);
                ctx.levels.load_level(index);
                Some(StateId::Playing)
            }
            Action::SelectLevel(index) => {
                log::warn!("Level {} does not exist", index);
                None
            }
            Action::Back | Action::Menu => Some(StateId::Menu),
            _ => None,
        }
    }
}

pub struct PlayingState {
    heartbeat_interval: f32,
    since_heartbeat: f32,
    celebrate_goal: bool,
    /// Set once `start_session` succeeded for the current run
    session_live: Rc<Cell<bool>>,
    /// Bumped on every fresh (non-resume) entry
    run: Rc<Cell<u64>>,
}

impl PlayingState {
    pub fn new(heartbeat_interval: f32, celebrate_goal: bool) -> Self {
        Self {
            heartbeat_interval: heartbeat_interval.max(1.0),
            since_heartbeat: 0.0,
            celebrate_goal,
            session_live: Rc::new(Cell::new(false)),
            run: Rc::new(Cell::new(0)),
        }
    }

    fn begin_run(&mut self, ctx: &mut TransitionContext<'_>) {
        let run = self.run.get() + 1;
        self.run.set(run);
        self.session_live.set(false);
        self.since_heartbeat = 0.0;
        ctx.score.stats_mut().level = ctx.levels.current_level();

        let call = ctx.session.start_session();
        let live = self.session_live.clone();
        let current_run = self.run.clone();
        detach(ctx.tasks, "start_session", async move {
            call.await?;
            if current_run.get() == run {
                live.set(true);
            } else {
                log::debug!("Session for run {} started after it ended", run);
            }
            Ok::<(), CollaboratorError>(())
        });
    }
}

impl GameState for PlayingState {
    fn id(&self) -> StateId {
        StateId::Playing
    }

    fn enter(&mut self, entry: &Entry, ctx: &mut TransitionContext<'_>) {
        ctx.surface.show_screen(StateId::Playing);
        ctx.surface.set_running(true);
        if entry.from != Some(StateId::Paused) {
            self.begin_run(ctx);
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        ctx.score.stats_mut().play_time_secs += dt;
        if !self.session_live.get() {
            return None;
        }
        self.since_heartbeat += dt;
        if self.since_heartbeat >= self.heartbeat_interval {
            self.since_heartbeat = 0.0;
            detach(ctx.tasks, "heartbeat", ctx.session.heartbeat());
        }
        None
    }

    fn handle_input(&mut self, action: Action, ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::Jump => {
                ctx.audio.play(SoundEffect::Jump);
                None
            }
            Action::PowerUp => {
                ctx.audio.play(SoundEffect::PowerUp);
                None
            }
            Action::Pause => Some(StateId::Paused),
            Action::PlayerDied => Some(StateId::GameOver),
            Action::LevelComplete if self.celebrate_goal => Some(StateId::GoalReached),
            Action::LevelComplete => Some(StateId::LevelSummary),
            _ => None,
        }
    }
}

/// Suspends audio and the simulation; `exit` undoes exactly that
#[derive(Default)]
pub struct PausedState {
    resuming: bool,
}

impl GameState for PausedState {
    fn id(&self) -> StateId {
        StateId::Paused
    }

    fn enter(&mut self, _entry: &Entry, ctx: &mut TransitionContext<'_>) {
        self.resuming = false;
        ctx.audio.play(SoundEffect::Pause);
        ctx.audio.suspend();
        ctx.surface.set_running(false);
        ctx.surface.show_screen(StateId::Paused);
    }

    fn exit(&mut self, ctx: &mut TransitionContext<'_>) {
        ctx.audio.resume();
        ctx.surface.set_running(true);
        if self.resuming {
            ctx.audio.play(SoundEffect::Resume);
        }
    }

    fn handle_input(&mut self, action: Action, _ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            // The pause key toggles
            Action::Pause | Action::Resume => {
                self.resuming = true;
                Some(StateId::Playing)
            }
            Action::Menu => Some(StateId::Menu),
            _ => None,
        }
    }
}

pub struct GoalReachedState {
    duration: f32,
    remaining: f32,
}

impl GoalReachedState {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }
}

impl GameState for GoalReachedState {
    fn id(&self) -> StateId {
        StateId::GoalReached
    }

    fn enter(&mut self, _entry: &Entry, ctx: &mut TransitionContext<'_>) {
        self.remaining = self.duration;
        ctx.audio.play(SoundEffect::LevelComplete);
        ctx.surface.show_screen(StateId::GoalReached);
    }

    fn update(&mut self, dt: f32, _ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        self.remaining -= dt;
        (self.remaining <= 0.0).then_some(StateId::LevelSummary)
    }

    fn handle_input(&mut self, action: Action, _ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::Continue | Action::Start | Action::Jump => Some(StateId::LevelSummary),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct LevelSummaryState {
    summary: Option<LevelSummary>,
    report: Option<ScoreReport>,
    has_next: bool,
    submit: Rc<Cell<SubmitStatus>>,
}

impl LevelSummaryState {
    pub fn summary(&self) -> Option<&LevelSummary> {
        self.summary.as_ref()
    }

    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    /// Shared view of the submission outcome for the summary screen
    pub fn submit_status(&self) -> Rc<Cell<SubmitStatus>> {
        self.submit.clone()
    }
}

impl GameState for LevelSummaryState {
    fn id(&self) -> StateId {
        StateId::LevelSummary
    }

    fn enter(&mut self, entry: &Entry, ctx: &mut TransitionContext<'_>) {
        let summary = ctx.levels.level_summary();
        let report = ctx.score.snapshot();
        submit_report(entry, ctx, report.clone(), &self.submit);

        self.has_next = ctx.levels.has_next_level();
        ctx.levels.complete_level();
        ctx.score.reset_level();

        ctx.surface.set_running(false);
        ctx.surface.show_screen(StateId::LevelSummary);
        log::info!(
            "Level {} summary: {}/{} platforms, score {}",
            summary.level,
            summary.platforms_passed,
            summary.platforms_total,
            report.score
        );
        self.summary = Some(summary);
        self.report = Some(report);
    }

    fn handle_input(&mut self, action: Action, _ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::Continue | Action::Start if self.has_next => Some(StateId::Playing),
            Action::Continue | Action::Start | Action::Menu => Some(StateId::Menu),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct GameOverState {
    report: Option<ScoreReport>,
    rank: Option<usize>,
    submit: Rc<Cell<SubmitStatus>>,
}

impl GameOverState {
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    /// Leaderboard rank of the last run (1-indexed)
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }

    pub fn submit_status(&self) -> Rc<Cell<SubmitStatus>> {
        self.submit.clone()
    }
}

impl GameState for GameOverState {
    fn id(&self) -> StateId {
        StateId::GameOver
    }

    fn enter(&mut self, entry: &Entry, ctx: &mut TransitionContext<'_>) {
        ctx.audio.play(SoundEffect::GameOver);
        let report = ctx.score.snapshot();
        self.rank = ctx.score.record_high_score(&report);
        if self.rank == Some(1) {
            ctx.audio.play(SoundEffect::HighScore);
        }

        submit_report(entry, ctx, report.clone(), &self.submit);
        ctx.score.reset();

        ctx.surface.set_running(false);
        ctx.surface.show_screen(StateId::GameOver);
        log::info!("Game over: score {} (rank {:?})", report.score, self.rank);
        self.report = Some(report);
    }

    fn handle_input(&mut self, action: Action, ctx: &mut TransitionContext<'_>) -> Option<StateId> {
        match action {
            Action::Restart | Action::Start | Action::Continue => {
                let level = ctx.levels.current_level();
                ctx.levels.load_level(level);
                Some(StateId::Playing)
            }
            Action::Menu => Some(StateId::Menu),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::testing::Harness;
    use crate::score::ScoreKeeper;

    fn no_frills() -> FlowOptions {
        FlowOptions {
            level_select: false,
            celebrate_goal: false,
        }
    }

    fn playing(h: &mut Harness, options: FlowOptions) -> StateMachine {
        let mut sm = standard_machine(&Tuning::default(), options);
        sm.start(StateId::Menu, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Start, &mut h.ctx()).unwrap();
        if options.level_select {
            sm.handle_input(Action::SelectLevel(0), &mut h.ctx()).unwrap();
        }
        assert!(sm.is_playing());
        sm
    }

    #[test]
    fn game_over_submits_before_reset() {
        let mut h = Harness::new();
        let mut sm = playing(&mut h, no_frills());
        h.score.add_points(420);

        sm.handle_input(Action::PlayerDied, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::GameOver));

        let submit = h.journal.position("end_session score=420").unwrap();
        let reset = h.journal.position("reset").unwrap();
        assert!(submit < reset, "{:?}", h.journal.entries());
        assert_eq!(h.score.board.score(), 0);
        assert_eq!(h.journal.count("play highScore"), 1);
    }

    #[test]
    fn failed_submission_keeps_game_over_usable() {
        let mut h = Harness::new();
        h.session.fail.set(true);
        let options = no_frills();
        let mut sm = standard_machine(&Tuning::default(), options);
        let game_over = GameOverState::default();
        let status = game_over.submit_status();
        sm.register(Box::new(game_over));

        sm.start(StateId::Menu, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Start, &mut h.ctx()).unwrap();
        sm.handle_input(Action::PlayerDied, &mut h.ctx()).unwrap();
        assert_eq!(status.get(), SubmitStatus::Pending);

        h.settle();
        assert_eq!(status.get(), SubmitStatus::Failed);
        assert_eq!(sm.current(), Some(StateId::GameOver));

        sm.handle_input(Action::Restart, &mut h.ctx()).unwrap();
        assert!(sm.is_playing());
    }

    #[test]
    fn late_submission_result_is_ignored_after_leaving() {
        let mut h = Harness::new();
        h.session.hold.set(true);
        let mut sm = standard_machine(&Tuning::default(), no_frills());
        let game_over = GameOverState::default();
        let status = game_over.submit_status();
        sm.register(Box::new(game_over));

        sm.start(StateId::Menu, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Start, &mut h.ctx()).unwrap();
        sm.handle_input(Action::PlayerDied, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Menu, &mut h.ctx()).unwrap();

        h.session.release();
        h.settle();
        assert_eq!(status.get(), SubmitStatus::Pending);
        assert_eq!(sm.current(), Some(StateId::Menu));
    }

    #[test]
    fn pause_is_undone_symmetrically() {
        let mut h = Harness::new();
        let mut sm = playing(&mut h, no_frills());

        sm.handle_input(Action::Pause, &mut h.ctx()).unwrap();
        assert!(sm.is_paused());
        assert!(!h.surface.running);
        assert_eq!(h.journal.count("suspend"), 1);

        sm.handle_input(Action::Pause, &mut h.ctx()).unwrap();
        assert!(sm.is_playing());
        assert!(h.surface.running);
        assert_eq!(h.journal.count("resume"), 1);
        assert_eq!(h.journal.count("play resume"), 1);

        // Resuming continues the same run
        assert_eq!(h.journal.count("start_session"), 1);
    }

    #[test]
    fn powerup_plays_its_sound_and_stays_in_play() {
        let mut h = Harness::new();
        let mut sm = playing(&mut h, no_frills());
        let result = sm.handle_input(Action::PowerUp, &mut h.ctx()).unwrap();
        assert_eq!(result, None);
        assert!(sm.is_playing());
        assert_eq!(h.journal.count("play powerup"), 1);
    }

    #[test]
    fn menu_from_pause_still_resumes_audio() {
        let mut h = Harness::new();
        let mut sm = playing(&mut h, no_frills());
        sm.handle_input(Action::Pause, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Menu, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::Menu));
        assert_eq!(h.journal.count("suspend"), h.journal.count("resume"));
        assert_eq!(h.journal.count("play resume"), 0);
    }

    #[test]
    fn heartbeat_waits_for_session() {
        let mut h = Harness::new();
        h.session.hold.set(true);
        let mut sm = playing(&mut h, no_frills());

        for _ in 0..4 {
            sm.update(10.0, &mut h.ctx()).unwrap();
        }
        assert_eq!(h.journal.count("heartbeat"), 0);

        h.session.hold.set(false);
        h.session.release();
        h.settle();
        for _ in 0..3 {
            sm.update(10.0, &mut h.ctx()).unwrap();
        }
        assert_eq!(h.journal.count("heartbeat"), 1);
    }

    #[test]
    fn goal_flow_completes_level_then_continues() {
        let mut h = Harness::new();
        let mut sm = playing(&mut h, FlowOptions::default());
        h.score.add_points(75);

        sm.handle_input(Action::LevelComplete, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::GoalReached));
        assert!(sm.update(1.0, &mut h.ctx()).unwrap().is_none());
        let t = sm.update(1.0, &mut h.ctx()).unwrap();
        assert_eq!(t.map(|t| t.to), Some(StateId::LevelSummary));

        let submit = h.journal.position("end_session score=75").unwrap();
        let complete = h.journal.position("complete_level").unwrap();
        let reset = h.journal.position("reset_level").unwrap();
        assert!(submit < complete && complete < reset);
        // Level score carries over
        assert_eq!(h.score.board.score(), 75);

        sm.handle_input(Action::Continue, &mut h.ctx()).unwrap();
        assert!(sm.is_playing());
        assert_eq!(h.score.board.snapshot().stats.level, 1);
        assert_eq!(h.journal.count("start_session"), 2);
    }

    #[test]
    fn last_level_summary_returns_to_menu() {
        let mut h = Harness::new();
        let mut sm = standard_machine(&Tuning::default(), FlowOptions::default());
        sm.start(StateId::Menu, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Start, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::LevelSelect));
        assert!(sm.handle_input(Action::SelectLevel(9), &mut h.ctx()).unwrap().is_none());
        sm.handle_input(Action::SelectLevel(2), &mut h.ctx()).unwrap();

        sm.handle_input(Action::LevelComplete, &mut h.ctx()).unwrap();
        sm.handle_input(Action::Continue, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::LevelSummary));
        sm.handle_input(Action::Continue, &mut h.ctx()).unwrap();
        assert_eq!(sm.current(), Some(StateId::Menu));
    }
}
