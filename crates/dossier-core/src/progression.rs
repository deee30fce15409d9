//! Progression: one player's mutable position within a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NO_FOCUS, case::Case, response::GameState};

/// A statement that changed the player's database, replayed on every rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlHistoryItem {
  pub timestamp:    DateTime<Utc>,
  pub query:        String,
  pub puzzle_state: u32,
  pub focus_state:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
  pub user_id:        String,
  pub case_id:        String,
  pub current_puzzle: u32,
  pub current_focus:  String,
  /// Chronological; append-only.
  #[serde(default)]
  pub sql_history:    Vec<SqlHistoryItem>,
  #[serde(default)]
  pub completed:      bool,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Progression {
  /// A fresh progression at the case's starting puzzle.
  pub fn start(user_id: impl Into<String>, case: &Case) -> Self {
    let now = Utc::now();
    Self {
      user_id:        user_id.into(),
      case_id:        case.id.clone(),
      current_puzzle: case.starting_puzzle(),
      current_focus:  NO_FOCUS.to_owned(),
      sql_history:    Vec::new(),
      completed:      false,
      created_at:     now,
      updated_at:     now,
    }
  }

  /// Return to the starting puzzle with no focus and an empty history.
  pub fn reset(&mut self, starting_puzzle: u32) {
    self.current_puzzle = starting_puzzle;
    self.current_focus = NO_FOCUS.to_owned();
    self.sql_history.clear();
    self.completed = false;
    self.updated_at = Utc::now();
  }

  /// Take over puzzle and focus from an engine response.
  ///
  /// The puzzle number never decreases; a state pointing at an earlier
  /// puzzle only updates the focus.
  pub fn apply_state(&mut self, case: &Case, state: &GameState) {
    if state.current_puzzle > self.current_puzzle {
      self.current_puzzle = state.current_puzzle;
    }
    self.current_focus.clone_from(&state.current_focus);
    if case.is_complete_at(self.current_puzzle) {
      self.completed = true;
    }
    self.updated_at = Utc::now();
  }
}
