//! The engine's reply to a single player input.

use serde::{Deserialize, Serialize};

use crate::case::Case;

/// One result row: column name → value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// What the player can see after a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
  pub case_id:        String,
  pub current_puzzle: u32,
  pub current_focus:  String,
  pub tables:         Vec<String>,
  pub commands:       Vec<String>,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub narrative:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_key:      Option<String>,
}

impl GameState {
  /// Derive the visible state for `puzzle` from the case definition.
  ///
  /// A puzzle number the case does not declare yields empty tables and
  /// commands.
  pub fn compute(case: &Case, puzzle: u32, focus: &str) -> Self {
    let mut state = Self {
      case_id: case.id.clone(),
      current_puzzle: puzzle,
      current_focus: focus.to_owned(),
      ..Self::default()
    };
    if let Some(p) = case.puzzle(puzzle) {
      state.tables.clone_from(&p.tables);
      state.commands.clone_from(&p.commands);
      state.narrative.clone_from(&p.narrative);
      state.image_key.clone_from(&p.image_key);
    }
    state
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResponse {
  pub success:           bool,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub narrative:         String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data:              Option<Vec<Row>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:             Option<String>,
  pub state:             GameState,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub is_reset:          bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_key:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success_image_key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failure_image_key: Option<String>,
}

impl GameResponse {
  /// A successful move with narrative text.
  pub fn narrative(text: impl Into<String>, state: GameState) -> Self {
    Self {
      success:           true,
      narrative:         text.into(),
      data:              None,
      error:             None,
      state,
      is_reset:          false,
      image_key:         None,
      success_image_key: None,
      failure_image_key: None,
    }
  }

  /// A rejected move; the state is whatever the player already had.
  pub fn rejected(error: impl Into<String>, state: GameState) -> Self {
    Self {
      success: false,
      error: Some(error.into()),
      ..Self::narrative(String::new(), state)
    }
  }

  pub fn with_data(mut self, data: Option<Vec<Row>>) -> Self {
    self.data = data;
    self
  }

  pub fn with_image(mut self, image_key: Option<String>) -> Self {
    self.image_key = image_key;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn case() -> Case {
    serde_json::from_value(serde_json::json!({
      "id": "c1",
      "title": "Case",
      "puzzles": [
        { "number": 1, "narrative": "Start", "tables": ["clues"], "commands": ["OLHAR"], "image_key": "room" }
      ]
    }))
    .unwrap()
  }

  #[test]
  fn compute_reads_the_puzzle() {
    let s = GameState::compute(&case(), 1, "desk");
    assert_eq!(s.tables, ["clues"]);
    assert_eq!(s.commands, ["OLHAR"]);
    assert_eq!(s.narrative, "Start");
    assert_eq!(s.image_key.as_deref(), Some("room"));
    assert_eq!(s.current_focus, "desk");
  }

  #[test]
  fn compute_for_undeclared_puzzle_is_empty() {
    let s = GameState::compute(&case(), 9, "none");
    assert_eq!(s.current_puzzle, 9);
    assert!(s.tables.is_empty());
    assert!(s.narrative.is_empty());
  }

  #[test]
  fn rejected_response_serializes_error_only() {
    let r = GameResponse::rejected("nope", GameState::compute(&case(), 1, "none"));
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "nope");
    assert!(json.get("narrative").is_none());
    assert!(json.get("is_reset").is_none());
  }
}
