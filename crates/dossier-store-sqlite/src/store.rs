//! [`SqliteStore`]: the SQLite implementation of [`CaseStore`] and
//! [`ProgressionStore`].

use std::path::Path;

use chrono::Utc;
use dossier_core::{
  NO_FOCUS,
  case::Case,
  progression::{Progression, SqlHistoryItem},
  store::{CaseStore, ProgressionStore},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawHistoryItem, RawProgression, decode_case, encode_case, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dossier store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  async fn get_case(&self, case_id: &str) -> Result<Option<Case>> {
    let id = case_id.to_owned();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT body_json FROM cases WHERE case_id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    body.as_deref().map(decode_case).transpose()
  }

  async fn list_cases(&self) -> Result<Vec<Case>> {
    let bodies: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT body_json FROM cases ORDER BY sort_order, case_id")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|body| decode_case(body)).collect()
  }

  async fn put_case(&self, case: &Case) -> Result<()> {
    let id = case.id.clone();
    let order = case.order;
    let body = encode_case(case)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cases (case_id, sort_order, body_json) VALUES (?1, ?2, ?3)
           ON CONFLICT (case_id) DO UPDATE
             SET sort_order = excluded.sort_order, body_json = excluded.body_json",
          rusqlite::params![id, order, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ProgressionStore impl ───────────────────────────────────────────────────

impl ProgressionStore for SqliteStore {
  type Error = Error;

  async fn get_progression(
    &self,
    user_id: &str,
    case_id: &str,
  ) -> Result<Option<Progression>> {
    let user = user_id.to_owned();
    let case = case_id.to_owned();

    let raw: Option<(RawProgression, Vec<RawHistoryItem>)> = self
      .conn
      .call(move |conn| {
        let Some(progression) = conn
          .query_row(
            &format!(
              "SELECT {} FROM progressions WHERE user_id = ?1 AND case_id = ?2",
              RawProgression::COLUMNS
            ),
            rusqlite::params![user, case],
            RawProgression::from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT query, puzzle_state, focus_state, recorded_at FROM sql_history
           WHERE user_id = ?1 AND case_id = ?2
           ORDER BY history_id",
        )?;
        let history = stmt
          .query_map(rusqlite::params![user, case], RawHistoryItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((progression, history)))
      })
      .await?;

    raw
      .map(|(progression, history)| {
        let history = history
          .into_iter()
          .map(RawHistoryItem::into_item)
          .collect::<Result<Vec<_>>>()?;
        progression.into_progression(history)
      })
      .transpose()
  }

  async fn upsert_progression(&self, progression: &Progression) -> Result<()> {
    let user = progression.user_id.clone();
    let case = progression.case_id.clone();
    let puzzle = progression.current_puzzle;
    let focus = progression.current_focus.clone();
    let completed = progression.completed;
    let created_at = encode_dt(progression.created_at);
    let updated_at = encode_dt(progression.updated_at);

    let case_known = {
      let case = case.clone();
      self
        .conn
        .call(move |conn| {
          let known = conn
            .query_row(
              "SELECT 1 FROM cases WHERE case_id = ?1",
              rusqlite::params![case],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !known {
            return Ok(false);
          }

          conn.execute(
            "INSERT INTO progressions (
               user_id, case_id, current_puzzle, current_focus,
               completed, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (user_id, case_id) DO UPDATE SET
               current_puzzle = excluded.current_puzzle,
               current_focus  = excluded.current_focus,
               completed      = excluded.completed,
               updated_at     = excluded.updated_at",
            rusqlite::params![user, case, puzzle, focus, completed, created_at, updated_at],
          )?;
          Ok(true)
        })
        .await?
    };

    if !case_known {
      return Err(Error::CaseNotFound(case));
    }
    Ok(())
  }

  async fn reset_progression(
    &self,
    user_id: &str,
    case_id: &str,
    starting_puzzle: u32,
  ) -> Result<()> {
    let user = user_id.to_owned();
    let case = case_id.to_owned();
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE progressions
           SET current_puzzle = ?3, current_focus = ?4, completed = 0, updated_at = ?5
           WHERE user_id = ?1 AND case_id = ?2",
          rusqlite::params![user, case, starting_puzzle, NO_FOCUS, now],
        )?;
        tx.execute(
          "DELETE FROM sql_history WHERE user_id = ?1 AND case_id = ?2",
          rusqlite::params![user, case],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_history(
    &self,
    user_id: &str,
    case_id: &str,
    item: &SqlHistoryItem,
  ) -> Result<()> {
    let user = user_id.to_owned();
    let case = case_id.to_owned();
    let query = item.query.clone();
    let puzzle = item.puzzle_state;
    let focus = item.focus_state.clone();
    let recorded_at = encode_dt(item.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sql_history (
             user_id, case_id, query, puzzle_state, focus_state, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![user, case, query, puzzle, focus, recorded_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_progressions(&self, user_id: &str) -> Result<Vec<Progression>> {
    let user = user_id.to_owned();

    let raws: Vec<RawProgression> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM progressions WHERE user_id = ?1 ORDER BY case_id",
          RawProgression::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user], RawProgression::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_progression(Vec::new()))
      .collect()
  }
}
