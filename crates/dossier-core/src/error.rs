//! Error types for `dossier-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The case document is structurally unusable.
  #[error("invalid case {case_id:?}: {reason}")]
  InvalidCase { case_id: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
