//! SQL schema for the Dossier SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Authored cases are stored whole; the engine only ever reads them back.
CREATE TABLE IF NOT EXISTS cases (
    case_id     TEXT PRIMARY KEY,
    sort_order  INTEGER NOT NULL DEFAULT 0,
    body_json   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS progressions (
    user_id         TEXT NOT NULL,
    case_id         TEXT NOT NULL REFERENCES cases(case_id),
    current_puzzle  INTEGER NOT NULL,
    current_focus   TEXT NOT NULL DEFAULT 'none',
    completed       INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at      TEXT NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (user_id, case_id)
);

-- Append-only, except that a reset deletes a progression's rows.
-- Replay order is history_id order.
CREATE TABLE IF NOT EXISTS sql_history (
    history_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       TEXT NOT NULL,
    case_id       TEXT NOT NULL,
    query         TEXT NOT NULL,
    puzzle_state  INTEGER NOT NULL,
    focus_state   TEXT NOT NULL,
    recorded_at   TEXT NOT NULL,
    FOREIGN KEY (user_id, case_id) REFERENCES progressions(user_id, case_id)
);

CREATE INDEX IF NOT EXISTS sql_history_owner_idx ON sql_history(user_id, case_id);
CREATE INDEX IF NOT EXISTS cases_order_idx       ON cases(sort_order, case_id);

PRAGMA user_version = 1;
";
