//! JSON API for Dossier.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`CaseStore`] and [`ProgressionStore`]. Auth, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dossier_api::api_router(store.clone()))
//! ```

pub mod cases;
pub mod error;
pub mod game;
pub mod player;

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use axum::{
  Json, Router,
  routing::{get, post},
};
use dossier_core::store::{CaseStore, ProgressionStore};
use serde_json::{Value, json};
use tokio::sync::OwnedMutexGuard;

pub use error::ApiError;
pub use player::Player;

/// Everything the handlers need from storage.
pub trait Store: CaseStore + ProgressionStore + Send + Sync + 'static {}

impl<T> Store for T where T: CaseStore + ProgressionStore + Send + Sync + 'static {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  locks:     Arc<PlayerLocks>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), locks: self.locks.clone() }
  }
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, locks: Arc::default() }
  }
}

/// One async mutex per (player, case), so a player's read, process and
/// write-back steps never interleave with another request of theirs.
#[derive(Default)]
struct PlayerLocks {
  inner: Mutex<HashMap<(String, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl PlayerLocks {
  async fn acquire(&self, player: &str, case_id: &str) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries only the map still references are idle.
      map.retain(|_, lock| Arc::strong_count(lock) > 1);
      map
        .entry((player.to_owned(), case_id.to_owned()))
        .or_default()
        .clone()
    };
    lock.lock_owned().await
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Store>(store: Arc<S>) -> Router<()> {
  Router::new()
    .route("/health", get(health))
    // Cases
    .route("/cases", get(cases::list::<S>))
    .route("/cases/initialize", post(cases::initialize::<S>))
    .route("/cases/{id}", get(cases::get_one::<S>))
    // Game
    .route("/game/execute", post(game::execute::<S>))
    .route("/game/progress", get(game::progress::<S>))
    .with_state(AppState::new(store))
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
