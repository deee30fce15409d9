//! [`Sandbox`]: the throwaway database a single command runs against.
//!
//! Every call rebuilds the player's world from scratch: a private in-memory
//! SQLite connection, every schema fragment unlocked so far, then the
//! player's statement history replayed on top. The connection closes when the
//! sandbox is dropped.

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use dossier_core::{case::Case, progression::Progression, response::Row};
use regex::Regex;
use rusqlite::{Connection, types::ValueRef};
use serde_json::Value;

use crate::{Error, Result};

static DESTRUCTIVE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(DROP|TRUNCATE|ALTER|ATTACH|DETACH|VACUUM)\b")
    .expect("valid regex")
});

/// Whether `query` may reshape or escape the schema and must not be replayed.
pub fn is_destructive(query: &str) -> bool { DESTRUCTIVE.is_match(query) }

// ─── Sandbox ─────────────────────────────────────────────────────────────────

/// An exclusively owned, per-call SQLite database.
pub struct Sandbox {
  conn: Connection,
}

impl Sandbox {
  /// Build the database a player at `progression` sees.
  ///
  /// Fragments apply in declared order, creation statement before seed data.
  /// A fragment that fails is an error; a history entry that fails is logged
  /// and skipped, since schema added by later puzzles can invalidate older
  /// statements.
  pub fn build(case: &Case, progression: &Progression) -> Result<Self> {
    let conn = Connection::open_in_memory().map_err(Error::Open)?;
    let sandbox = Self { conn };

    let mut applied = 0usize;
    for schema in case.schemas_through(progression.current_puzzle) {
      let fail = |source: rusqlite::Error| Error::Schema {
        puzzle: schema.puzzle,
        table: schema.table_name.clone(),
        source,
      };
      sandbox.conn.execute_batch(&schema.create_sql).map_err(fail)?;
      if let Some(seed) = schema.insert_sql.as_deref().filter(|s| !s.trim().is_empty()) {
        sandbox.conn.execute_batch(seed).map_err(fail)?;
      }
      applied += 1;
    }

    let mut replayed = 0usize;
    for item in &progression.sql_history {
      if item.query.trim().is_empty() || is_destructive(&item.query) {
        continue;
      }
      match sandbox.conn.execute_batch(&item.query) {
        Ok(()) => replayed += 1,
        Err(e) => tracing::warn!(
          case = %case.id,
          query = %item.query,
          error = %e,
          "skipping history entry that no longer applies"
        ),
      }
    }

    tracing::debug!(
      case = %case.id,
      puzzle = progression.current_puzzle,
      applied,
      replayed,
      "sandbox built"
    );
    Ok(sandbox)
  }

  /// Run a row-returning statement and collect every row.
  pub fn query_rows(&self, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = self.conn.prepare(sql)?;
    let columns: Vec<String> =
      stmt.column_names().into_iter().map(str::to_owned).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
      let mut record = Row::new();
      for (i, name) in columns.iter().enumerate() {
        record.insert(name.clone(), json_value(row.get_ref(i)?));
      }
      out.push(record);
    }
    Ok(out)
  }

  /// Run one or more statements for their effect.
  pub fn execute(&self, sql: &str) -> rusqlite::Result<()> {
    self.conn.execute_batch(sql)
  }

  /// First column of the first row of `sql`, as text.
  ///
  /// `NULL` and an empty result both read as the empty string.
  pub fn scalar(&self, sql: &str) -> rusqlite::Result<String> {
    let mut stmt = self.conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
      Some(row) => Ok(text_value(row.get_ref(0)?)),
      None => Ok(String::new()),
    }
  }
}

// ─── Value conversion ────────────────────────────────────────────────────────

fn json_value(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::from(i),
    ValueRef::Real(f) => {
      serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
    ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::String(B64.encode(b)),
  }
}

fn text_value(value: ValueRef<'_>) -> String {
  match value {
    ValueRef::Null => String::new(),
    ValueRef::Integer(i) => i.to_string(),
    ValueRef::Real(f) => f.to_string(),
    ValueRef::Text(t) | ValueRef::Blob(t) => {
      String::from_utf8_lossy(t).into_owned()
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use dossier_core::{NO_FOCUS, progression::SqlHistoryItem};

  use super::*;

  fn case() -> Case {
    serde_json::from_value(serde_json::json!({
      "id": "c1",
      "title": "Case",
      "puzzles": [{ "number": 1 }, { "number": 2 }, { "number": 3 }],
      "schemas": [
        { "puzzle": 1, "table_name": "clues",
          "create_sql": "CREATE TABLE clues (id INT, label TEXT)",
          "insert_sql": "INSERT INTO clues VALUES (1, 'Gun'), (2, 'Rope')" },
        { "puzzle": 2, "table_name": "suspects",
          "create_sql": "CREATE TABLE suspects (id INT, name TEXT)" },
        { "puzzle": 3, "table_name": "alibis",
          "create_sql": "CREATE TABLE alibis (suspect_id INT, place TEXT)" }
      ]
    }))
    .unwrap()
  }

  fn at(puzzle: u32, history: &[&str]) -> Progression {
    let mut p = Progression::start("u1", &case());
    p.current_puzzle = puzzle;
    p.sql_history = history
      .iter()
      .map(|q| SqlHistoryItem {
        timestamp:    Utc::now(),
        query:        (*q).to_owned(),
        puzzle_state: puzzle,
        focus_state:  NO_FOCUS.to_owned(),
      })
      .collect();
    p
  }

  fn table_names(sb: &Sandbox) -> Vec<String> {
    let mut stmt = sb
      .conn
      .prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
      )
      .unwrap();
    stmt
      .query_map([], |row| row.get(0))
      .unwrap()
      .collect::<rusqlite::Result<Vec<String>>>()
      .unwrap()
  }

  #[test]
  fn schema_is_cumulative() {
    let c = case();
    assert_eq!(table_names(&Sandbox::build(&c, &at(1, &[])).unwrap()), ["clues"]);
    assert_eq!(table_names(&Sandbox::build(&c, &at(2, &[])).unwrap()), [
      "clues", "suspects"
    ]);
    for puzzle in 3..6 {
      let tables = table_names(&Sandbox::build(&c, &at(puzzle, &[])).unwrap());
      assert_eq!(tables, ["alibis", "clues", "suspects"]);
    }
  }

  #[test]
  fn seed_data_is_loaded() {
    let sb = Sandbox::build(&case(), &at(1, &[])).unwrap();
    assert_eq!(sb.scalar("SELECT COUNT(*) FROM clues").unwrap(), "2");
  }

  #[test]
  fn history_is_replayed_in_order() {
    let sb = Sandbox::build(&case(), &at(1, &[
      "INSERT INTO clues VALUES (3, 'Knife')",
      "UPDATE clues SET label = 'Dagger' WHERE id = 3",
    ]))
    .unwrap();
    assert_eq!(
      sb.scalar("SELECT label FROM clues WHERE id = 3").unwrap(),
      "Dagger"
    );
  }

  #[test]
  fn destructive_history_is_never_replayed() {
    let sb = Sandbox::build(&case(), &at(2, &[
      "DROP TABLE clues",
      "drop table suspects",
      "ALTER TABLE clues RENAME TO evidence",
      "DELETE FROM clues WHERE id = 1",
    ]))
    .unwrap();
    assert_eq!(table_names(&sb), ["clues", "suspects"]);
    assert_eq!(sb.scalar("SELECT COUNT(*) FROM clues").unwrap(), "1");
  }

  #[test]
  fn failing_history_entry_is_skipped() {
    let sb = Sandbox::build(&case(), &at(1, &[
      "INSERT INTO nowhere VALUES (1)",
      "INSERT INTO clues VALUES (3, 'Knife')",
    ]))
    .unwrap();
    assert_eq!(sb.scalar("SELECT COUNT(*) FROM clues").unwrap(), "3");
  }

  #[test]
  fn broken_schema_is_an_error() {
    let mut c = case();
    c.schemas[1].create_sql = "CREATE TABLE (".into();
    let err = Sandbox::build(&c, &at(2, &[])).err().unwrap();
    assert!(matches!(err, Error::Schema { puzzle: 2, .. }));
  }

  #[test]
  fn destructive_detection_uses_whole_words() {
    assert!(is_destructive("DROP TABLE clues"));
    assert!(is_destructive("insert into t values (1); vacuum"));
    assert!(is_destructive("ATTACH DATABASE 'x.db' AS x"));
    assert!(!is_destructive("UPDATE clues SET dropped_at = 1"));
    assert!(!is_destructive("INSERT INTO alterations VALUES (1)"));
  }

  #[test]
  fn rows_serialize_as_column_maps() {
    let sb = Sandbox::build(&case(), &at(1, &[])).unwrap();
    let rows = sb
      .query_rows("SELECT id, label, 1.5 AS weight, NULL AS note FROM clues ORDER BY id")
      .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["label"], "Gun");
    assert_eq!(rows[0]["weight"], 1.5);
    assert!(rows[0]["note"].is_null());
    assert_eq!(rows[1]["label"], "Rope");
  }

  #[test]
  fn scalar_of_empty_result_is_empty() {
    let sb = Sandbox::build(&case(), &at(1, &[])).unwrap();
    assert_eq!(sb.scalar("SELECT id FROM clues WHERE id = 99").unwrap(), "");
  }
}
