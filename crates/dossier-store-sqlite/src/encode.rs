//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Cases are stored as the same
//! JSON document they are authored in.

use chrono::{DateTime, Utc};
use dossier_core::{
  case::Case,
  progression::{Progression, SqlHistoryItem},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Case ────────────────────────────────────────────────────────────────────

pub fn encode_case(case: &Case) -> Result<String> { Ok(serde_json::to_string(case)?) }

pub fn decode_case(s: &str) -> Result<Case> { Ok(Case::from_json(s)?) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Raw values read directly from a `progressions` row.
pub struct RawProgression {
  pub user_id:        String,
  pub case_id:        String,
  pub current_puzzle: u32,
  pub current_focus:  String,
  pub completed:      bool,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawProgression {
  pub const COLUMNS: &'static str = "user_id, case_id, current_puzzle, current_focus, \
                                     completed, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:        row.get(0)?,
      case_id:        row.get(1)?,
      current_puzzle: row.get(2)?,
      current_focus:  row.get(3)?,
      completed:      row.get(4)?,
      created_at:     row.get(5)?,
      updated_at:     row.get(6)?,
    })
  }

  pub fn into_progression(self, sql_history: Vec<SqlHistoryItem>) -> Result<Progression> {
    Ok(Progression {
      user_id: self.user_id,
      case_id: self.case_id,
      current_puzzle: self.current_puzzle,
      current_focus: self.current_focus,
      sql_history,
      completed: self.completed,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `sql_history` row.
pub struct RawHistoryItem {
  pub query:        String,
  pub puzzle_state: u32,
  pub focus_state:  String,
  pub recorded_at:  String,
}

impl RawHistoryItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      query:        row.get(0)?,
      puzzle_state: row.get(1)?,
      focus_state:  row.get(2)?,
      recorded_at:  row.get(3)?,
    })
  }

  pub fn into_item(self) -> Result<SqlHistoryItem> {
    Ok(SqlHistoryItem {
      timestamp:    decode_dt(&self.recorded_at)?,
      query:        self.query,
      puzzle_state: self.puzzle_state,
      focus_state:  self.focus_state,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_round_trip() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
