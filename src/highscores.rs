//! Local top-10 leaderboard

use serde::{Deserialize, Serialize};

use crate::score::ScoreReport;
use crate::storage;

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Zero-based level the run ended on
    pub level: u32,
    pub collectibles: u32,
    /// Unix time in ms
    pub timestamp: f64,
}

/// Best first; equal scores keep their original order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "arcade_sim_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// 1-indexed rank `score` would take, if it makes the board
    ///
    /// A tie ranks below the existing entry. Zero never ranks.
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let rank = self.entries.partition_point(|e| e.score >= score) + 1;
        (rank <= MAX_HIGH_SCORES).then_some(rank)
    }

    /// Insert a finished run, returning its rank
    pub fn add(&mut self, report: &ScoreReport, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(report.score)?;
        let entry = HighScoreEntry {
            score: report.score,
            level: report.stats.level,
            collectibles: report.stats.collectibles,
            timestamp,
        };
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load() -> Self {
        let mut scores = storage::load_json::<Self>(Self::STORAGE_KEY).unwrap_or_default();
        // Stored data may predate a smaller board
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("{} high scores on record", scores.entries.len());
        scores
    }

    pub fn save(&self) {
        if let Err(e) = storage::save_json(Self::STORAGE_KEY, self) {
            log::debug!("High scores kept in memory only: {}", e);
        }
    }
}

/// Wall-clock time in milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
