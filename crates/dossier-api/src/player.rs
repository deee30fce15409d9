//! The [`Player`] extractor: who is playing.
//!
//! Identity comes from the `X-Player-Id` header, or `X-Guest-Id` for guests.
//! Nothing is verified; authentication belongs in front of this router.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, request::Parts},
};

use crate::error::ApiError;

pub const PLAYER_HEADER: &str = "x-player-id";
pub const GUEST_HEADER: &str = "x-guest-id";

/// The id progressions are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player(pub String);

impl Player {
  fn from_headers(headers: &HeaderMap) -> Option<Self> {
    [PLAYER_HEADER, GUEST_HEADER].into_iter().find_map(|name| {
      headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| Player(id.to_owned()))
    })
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Player {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Self::from_headers(&parts.headers).ok_or_else(|| {
      ApiError::BadRequest(format!("missing {PLAYER_HEADER} or {GUEST_HEADER} header"))
    })
  }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Player {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Option<Self>, Self::Rejection> {
    Ok(Self::from_headers(&parts.headers))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(*k, HeaderValue::from_static(v));
    }
    map
  }

  #[test]
  fn player_header_wins_over_guest() {
    let h = headers(&[(PLAYER_HEADER, "alice"), (GUEST_HEADER, "guest-1")]);
    assert_eq!(Player::from_headers(&h), Some(Player("alice".into())));
  }

  #[test]
  fn guest_header_is_a_fallback() {
    let h = headers(&[(GUEST_HEADER, "guest-1")]);
    assert_eq!(Player::from_headers(&h), Some(Player("guest-1".into())));
  }

  #[test]
  fn blank_or_missing_is_none() {
    assert_eq!(Player::from_headers(&headers(&[])), None);
    assert_eq!(Player::from_headers(&headers(&[(PLAYER_HEADER, "  ")])), None);
  }
}
