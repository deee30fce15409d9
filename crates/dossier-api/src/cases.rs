//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | Summaries; the caller's progressions when identified |
//! | `GET`  | `/cases/{id}` | Full case and the caller's progression; 404 if not found |
//! | `POST` | `/cases/initialize` | Body: `{"case_id":"..."}`; creates the progression if absent |

use axum::{
  Json,
  extract::{Path, State},
};
use dossier_core::{
  case::{Case, CaseSummary},
  progression::Progression,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Store, error::ApiError, player::Player};

/// Fetch a case or fail with 404.
pub(crate) async fn load_case<S: Store>(store: &S, case_id: &str) -> Result<Case, ApiError> {
  store
    .get_case(case_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("case {case_id} not found")))
}

/// The player's progression for `case`, created at the starting puzzle and
/// persisted if this is their first visit.
pub(crate) async fn load_or_start<S: Store>(
  store: &S,
  player: &Player,
  case: &Case,
) -> Result<Progression, ApiError> {
  if let Some(progression) = store
    .get_progression(&player.0, &case.id)
    .await
    .map_err(ApiError::store)?
  {
    return Ok(progression);
  }

  let progression = Progression::start(player.0.clone(), case);
  store.upsert_progression(&progression).await.map_err(ApiError::store)?;
  tracing::info!(player = %player.0, case = %case.id, "progression started");
  Ok(progression)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CaseList {
  pub cases:        Vec<CaseSummary>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub progressions: Vec<Progression>,
}

/// `GET /cases`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  player: Option<Player>,
) -> Result<Json<CaseList>, ApiError> {
  let cases = state.store.list_cases().await.map_err(ApiError::store)?;

  let progressions = match player {
    Some(player) => state
      .store
      .list_progressions(&player.0)
      .await
      .map_err(ApiError::store)?,
    None => Vec::new(),
  };

  Ok(Json(CaseList {
    cases: cases.iter().map(Case::summary).collect(),
    progressions,
  }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CaseDetail {
  pub case:        Case,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub progression: Option<Progression>,
}

/// `GET /cases/{id}`
pub async fn get_one<S: Store>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  player: Option<Player>,
) -> Result<Json<CaseDetail>, ApiError> {
  let case = load_case(state.store.as_ref(), &id).await?;

  let progression = match player {
    Some(player) => state
      .store
      .get_progression(&player.0, &id)
      .await
      .map_err(ApiError::store)?,
    None => None,
  };

  Ok(Json(CaseDetail { case, progression }))
}

// ─── Initialize ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InitializeBody {
  pub case_id: String,
}

/// `POST /cases/initialize` with body `{"case_id":"..."}`
pub async fn initialize<S: Store>(
  State(state): State<AppState<S>>,
  player: Player,
  Json(body): Json<InitializeBody>,
) -> Result<Json<CaseDetail>, ApiError> {
  let _turn = state.locks.acquire(&player.0, &body.case_id).await;

  let case = load_case(state.store.as_ref(), &body.case_id).await?;
  let progression = load_or_start(state.store.as_ref(), &player, &case).await?;

  Ok(Json(CaseDetail { case, progression: Some(progression) }))
}
