//! Level progress collaborator
//!
//! Level content (layouts, spawn tables) is loaded elsewhere; the core only
//! needs to know which level is active and how far the player got.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What the summary screen shows for a finished level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Zero-based level index
    pub level: u32,
    pub platforms_passed: u32,
    pub platforms_total: u32,
    /// Whether this level was already completed in an earlier run
    pub replay: bool,
}

pub trait LevelManager {
    /// Zero-based index of the active level
    fn current_level(&self) -> u32;

    fn level_count(&self) -> u32;

    /// Make `index` the active level and reset its progress
    fn load_level(&mut self, index: u32);

    /// A non-safety platform left play
    fn platform_exited(&mut self, index: u32);

    fn level_summary(&self) -> LevelSummary;

    /// Mark the active level completed and advance to the next one, if any
    fn complete_level(&mut self);

    fn has_next_level(&self) -> bool {
        self.current_level() + 1 < self.level_count()
    }
}

/// In-memory level progress
#[derive(Debug, Clone)]
pub struct LevelProgress {
    current: u32,
    /// Platform count per level
    platform_totals: Vec<u32>,
    /// Platform indices passed in the active level
    passed: BTreeSet<u32>,
    completed: BTreeSet<u32>,
}

impl LevelProgress {
    pub fn new(platform_totals: Vec<u32>) -> Self {
        if platform_totals.is_empty() {
            log::warn!("Level list is empty");
        }
        Self {
            current: 0,
            platform_totals,
            passed: BTreeSet::new(),
            completed: BTreeSet::new(),
        }
    }

    pub fn is_completed(&self, index: u32) -> bool {
        self.completed.contains(&index)
    }

    pub fn passed(&self) -> usize {
        self.passed.len()
    }
}

impl LevelManager for LevelProgress {
    fn current_level(&self) -> u32 {
        self.current
    }

    fn level_count(&self) -> u32 {
        self.platform_totals.len() as u32
    }

    fn load_level(&mut self, index: u32) {
        if index >= self.level_count() {
            log::warn!("Level {} out of range, staying on {}", index, self.current);
        } else {
            self.current = index;
        }
        self.passed.clear();
        log::info!("Loaded level {}", self.current);
    }

    fn platform_exited(&mut self, index: u32) {
        // Indices are unique per level; a repeat would be a double count
        if !self.passed.insert(index) {
            log::debug!("Platform {} reported twice", index);
        }
    }

    fn level_summary(&self) -> LevelSummary {
        LevelSummary {
            level: self.current,
            platforms_passed: self.passed.len() as u32,
            platforms_total: self
                .platform_totals
                .get(self.current as usize)
                .copied()
                .unwrap_or(0),
            replay: self.completed.contains(&self.current),
        }
    }

    fn complete_level(&mut self) {
        self.completed.insert(self.current);
        log::info!("Level {} complete", self.current);
        if self.has_next_level() {
            self.current += 1;
        }
        self.passed.clear();
    }
}
