//! Error type for `dossier-engine`.
//!
//! Only sandbox construction can fail a call. Everything the player did wrong
//! comes back as a [`GameResponse`](dossier_core::response::GameResponse).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to open sandbox database: {0}")]
  Open(#[source] rusqlite::Error),

  /// A schema fragment of the case did not apply.
  #[error("schema for puzzle {puzzle} ({table:?}) failed to apply: {source}")]
  Schema {
    puzzle: u32,
    table:  String,
    #[source]
    source: rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
