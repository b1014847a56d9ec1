//! Leaderboards
//!
//! A leaderboard watches three condition sets (start, cancel, submit) and a
//! value formula. Once started, an attempt ends either cancelled or with the
//! formula's value submitted.

mod board;
mod format;
mod formula;

pub use board::{Leaderboard, LeaderboardEvent};
pub use format::ValueFormat;
pub use formula::{FormulaTerm, ValueFormula};

use crate::memory::BankRegistry;

/// All leaderboards for the loaded game
#[derive(Debug, Clone, Default)]
pub struct LeaderboardManager {
    boards: Vec<Leaderboard>,
}

impl LeaderboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaderboard, replacing any existing one with the same id
    pub fn add(&mut self, board: Leaderboard) {
        match self.boards.iter_mut().find(|b| b.id() == board.id()) {
            Some(existing) => *existing = board,
            None => self.boards.push(board),
        }
    }

    pub fn find(&self, id: u32) -> Option<&Leaderboard> {
        self.boards.iter().find(|b| b.id() == id)
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut Leaderboard> {
        self.boards.iter_mut().find(|b| b.id() == id)
    }

    pub fn boards(&self) -> &[Leaderboard] {
        &self.boards
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Evaluate every leaderboard for one frame
    pub fn test_all(&mut self, banks: &BankRegistry) -> Vec<LeaderboardEvent> {
        self.boards
            .iter_mut()
            .filter_map(|board| board.test(banks))
            .collect()
    }

    /// Abandon all running attempts
    pub fn reset(&mut self) {
        for board in self.boards.iter_mut() {
            board.reset();
        }
    }

    pub fn clear(&mut self) {
        self.boards.clear();
    }
}
