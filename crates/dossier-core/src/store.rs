//! Storage traits for cases and progressions.
//!
//! The engine itself never touches storage; these traits are what the API
//! layer talks to. Implemented by `dossier-store-sqlite`.
//!
//! The engine does no locking. Callers that read a progression, run a
//! command and write it back must serialize those steps per player.

use std::future::Future;

use crate::{
  case::Case,
  progression::{Progression, SqlHistoryItem},
};

/// Read access to authored cases, plus an upsert used for seeding.
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a case by id. Returns `None` if not found.
  fn get_case<'a>(
    &'a self,
    case_id: &'a str,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + 'a;

  /// All cases, ordered by `order` then id.
  fn list_cases(
    &self,
  ) -> impl Future<Output = Result<Vec<Case>, Self::Error>> + Send + '_;

  /// Insert a case or replace the stored document with the same id.
  fn put_case<'a>(
    &'a self,
    case: &'a Case,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Per-player, per-case progression documents.
pub trait ProgressionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a progression with its full history in chronological order.
  fn get_progression<'a>(
    &'a self,
    user_id: &'a str,
    case_id: &'a str,
  ) -> impl Future<Output = Result<Option<Progression>, Self::Error>> + Send + 'a;

  /// Persist the scalar fields of a progression, creating it if needed.
  ///
  /// History is not written here; it only grows through
  /// [`append_history`](Self::append_history).
  fn upsert_progression<'a>(
    &'a self,
    progression: &'a Progression,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Return the progression to `starting_puzzle` with no focus and delete its
  /// history.
  fn reset_progression<'a>(
    &'a self,
    user_id: &'a str,
    case_id: &'a str,
    starting_puzzle: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Append one statement to the progression's history.
  fn append_history<'a>(
    &'a self,
    user_id: &'a str,
    case_id: &'a str,
    item: &'a SqlHistoryItem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every progression belonging to `user_id`, without history.
  fn list_progressions<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Progression>, Self::Error>> + Send + 'a;
}
