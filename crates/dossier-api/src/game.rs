//! Handlers for `/game` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/game/execute` | Body: `{"case_id":"...","sql":"..."}`; 400 when the move is rejected |
//! | `GET`  | `/game/progress` | The caller's progressions |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use dossier_core::{
  RESET_COMMAND,
  case::Case,
  progression::Progression,
  response::GameResponse,
};
use dossier_engine::Outcome;
use serde::Deserialize;

use crate::{
  AppState, Store,
  cases::{load_case, load_or_start},
  error::ApiError,
  player::Player,
};

// ─── Execute ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
  pub case_id: String,
  /// A narrative command, a SQL statement or `RESET`.
  pub sql:     String,
}

/// `POST /game/execute`
pub async fn execute<S: Store>(
  State(state): State<AppState<S>>,
  player: Player,
  Json(body): Json<ExecuteBody>,
) -> Result<(StatusCode, Json<GameResponse>), ApiError> {
  let _turn = state.locks.acquire(&player.0, &body.case_id).await;
  let store = state.store.as_ref();

  let case = load_case(store, &body.case_id).await?;
  let mut progression = load_or_start(store, &player, &case).await?;

  if body.sql.trim().eq_ignore_ascii_case(RESET_COMMAND) {
    let starting = case.starting_puzzle();
    store
      .reset_progression(&player.0, &case.id, starting)
      .await
      .map_err(ApiError::store)?;
    tracing::info!(player = %player.0, case = %case.id, "progression reset");

    return Ok((StatusCode::OK, Json(dossier_engine::reset_response(&case))));
  }

  let outcome = {
    let case = case.clone();
    let snapshot = progression.clone();
    let input = body.sql.clone();
    tokio::task::spawn_blocking(move || {
      dossier_engine::process_command(&case, &snapshot, &input)
    })
    .await??
  };

  if outcome.response.success {
    persist(store, &case, &mut progression, &outcome).await?;
  }

  let status = if outcome.response.success {
    StatusCode::OK
  } else {
    StatusCode::BAD_REQUEST
  };
  Ok((status, Json(outcome.response)))
}

/// Write back the new puzzle and focus, then the statement history.
async fn persist<S: Store>(
  store: &S,
  case: &Case,
  progression: &mut Progression,
  outcome: &Outcome,
) -> Result<(), ApiError> {
  let before = progression.current_puzzle;
  progression.apply_state(case, &outcome.response.state);
  if progression.current_puzzle != before {
    tracing::info!(
      player = %progression.user_id,
      case = %case.id,
      from = before,
      to = progression.current_puzzle,
      completed = progression.completed,
      "puzzle advanced"
    );
  }

  store.upsert_progression(progression).await.map_err(ApiError::store)?;

  if let Some(item) = outcome.persistable_history() {
    store
      .append_history(&progression.user_id, &progression.case_id, item)
      .await
      .map_err(ApiError::store)?;
  }
  Ok(())
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// `GET /game/progress`
pub async fn progress<S: Store>(
  State(state): State<AppState<S>>,
  player: Player,
) -> Result<Json<Vec<Progression>>, ApiError> {
  let progressions = state
    .store
    .list_progressions(&player.0)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(progressions))
}
