//! Score and run statistics
//!
//! [`ScoreKeeper`] is the collaborator the state machine reads final scores
//! from and resets between runs; [`ScoreBoard`] is the stock implementation.

use serde::{Deserialize, Serialize};

use crate::highscores::HighScores;

/// Counters gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Zero-based level index
    pub level: u32,
    pub collectibles: u32,
    pub platforms_passed: u32,
    pub play_time_secs: f32,
}

/// Stable copy of the score state, safe to hand to async work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: u64,
    pub stats: RunStats,
}

pub trait ScoreKeeper {
    fn add_points(&mut self, points: u64);

    fn stats_mut(&mut self) -> &mut RunStats;

    /// Copy of the current score and stats
    fn snapshot(&self) -> ScoreReport;

    /// Clear per-level counters, keep the running score
    fn reset_level(&mut self);

    /// Clear everything for a new run
    fn reset(&mut self);

    /// Enter a finished run into the leaderboard, returning its rank
    fn record_high_score(&mut self, _report: &ScoreReport) -> Option<usize> {
        None
    }
}

/// Score state plus the local leaderboard
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    score: u64,
    stats: RunStats,
    high_scores: HighScores,
}

impl ScoreBoard {
    pub fn new(high_scores: HighScores) -> Self {
        Self {
            score: 0,
            stats: RunStats::default(),
            high_scores,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }
}

impl ScoreKeeper for ScoreBoard {
    fn add_points(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    fn snapshot(&self) -> ScoreReport {
        ScoreReport {
            score: self.score,
            stats: self.stats.clone(),
        }
    }

    fn reset_level(&mut self) {
        let level = self.stats.level;
        self.stats = RunStats {
            level,
            ..RunStats::default()
        };
    }

    fn reset(&mut self) {
        self.score = 0;
        self.stats = RunStats::default();
    }

    fn record_high_score(&mut self, report: &ScoreReport) -> Option<usize> {
        let rank = self
            .high_scores
            .add(report, crate::highscores::now_ms())?;
        self.high_scores.save();
        Some(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_independent_of_reset() {
        let mut board = ScoreBoard::default();
        board.add_points(120);
        board.stats_mut().collectibles = 4;
        let report = board.snapshot();
        board.reset();
        assert_eq!(report.score, 120);
        assert_eq!(report.stats.collectibles, 4);
        assert_eq!(board.score(), 0);
    }

    #[test]
    fn level_reset_keeps_score_and_level() {
        let mut board = ScoreBoard::default();
        board.add_points(50);
        board.stats_mut().level = 2;
        board.stats_mut().platforms_passed = 9;
        board.reset_level();
        assert_eq!(board.score(), 50);
        assert_eq!(board.snapshot().stats.level, 2);
        assert_eq!(board.snapshot().stats.platforms_passed, 0);
    }

    #[test]
    fn high_scores_are_ranked() {
        let mut board = ScoreBoard::default();
        let report = ScoreReport {
            score: 300,
            stats: RunStats::default(),
        };
        assert_eq!(board.record_high_score(&report), Some(1));
        assert_eq!(board.high_scores().top_score(), Some(300));
        assert_eq!(board.record_high_score(&ScoreReport::default()), None);
    }
}
