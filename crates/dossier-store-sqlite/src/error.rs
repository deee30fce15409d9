//! Error type for `dossier-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dossier_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A progression or history write referenced a case that is not stored.
  #[error("case not found: {0}")]
  CaseNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
