//! An offline play session: one case, one in-memory progression.
//!
//! Applies engine outcomes with the same rules the server uses, so a case can
//! be played through end to end without a store.

use dossier_core::{
  RESET_COMMAND,
  case::Case,
  progression::Progression,
  response::{GameResponse, GameState},
};

pub struct Session {
  case:        Case,
  progression: Progression,
}

impl Session {
  pub fn new(case: Case) -> Self {
    let progression = Progression::start("local", &case);
    Self { case, progression }
  }

  pub fn case(&self) -> &Case { &self.case }

  pub fn progression(&self) -> &Progression { &self.progression }

  /// The state shown before the first command.
  pub fn opening(&self) -> GameState {
    GameState::compute(
      &self.case,
      self.progression.current_puzzle,
      &self.progression.current_focus,
    )
  }

  /// Run one line of input and fold the outcome into the progression.
  pub fn play(&mut self, input: &str) -> dossier_engine::Result<GameResponse> {
    if input.trim().eq_ignore_ascii_case(RESET_COMMAND) {
      let starting = self.case.starting_puzzle();
      self.progression.reset(starting);
      tracing::debug!(case = %self.case.id, "session reset");
      return Ok(dossier_engine::reset_response(&self.case));
    }

    let outcome = dossier_engine::process_command(&self.case, &self.progression, input)?;
    if outcome.response.success {
      self.progression.apply_state(&self.case, &outcome.response.state);
      if let Some(item) = outcome.persistable_history() {
        self.progression.sql_history.push(item.clone());
      }
    }
    Ok(outcome.response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn case() -> Case {
    serde_json::from_value(serde_json::json!({
      "id": "c1",
      "title": "Case",
      "puzzles": [{ "number": 1, "narrative": "Start." }, { "number": 2, "narrative": "End." }],
      "schemas": [
        { "puzzle": 1, "table_name": "clues", "create_sql": "CREATE TABLE clues(id INT, label TEXT)" }
      ],
      "validations": [
        { "puzzle": 1, "check_sql": "SELECT COUNT(*) FROM clues WHERE label = 'Gun'",
          "expect_value": "1", "success_narrative": "Found it.",
          "unlocks_next": true, "next_puzzle": 2 }
      ]
    }))
    .unwrap()
  }

  #[test]
  fn plays_to_completion() {
    let mut s = Session::new(case());
    assert_eq!(s.opening().narrative, "Start.");

    let r = s.play("INSERT INTO clues VALUES (1, 'GUN')").unwrap();
    assert_eq!(r.narrative, "Found it.");
    assert_eq!(s.progression().current_puzzle, 2);
    assert!(s.progression().completed);
    assert_eq!(s.progression().sql_history.len(), 1);
  }

  #[test]
  fn bundled_case_is_solvable() {
    let case = Case::from_json(include_str!("../../../cases/o-caso-da-arma.json")).unwrap();
    case.validate().unwrap();
    let mut s = Session::new(case);

    let r = s.play("INSERT INTO clues (label) VALUES ('Arma')").unwrap();
    assert_eq!(r.state.current_puzzle, 2);

    let r = s.play("UPDATE suspects SET guilty = 1 WHERE name = 'bruno'").unwrap();
    assert!(!r.success);

    let r = s.play("olhar arquivo").unwrap();
    assert_eq!(r.state.current_focus, "arquivo");

    let r = s.play("UPDATE suspects SET guilty = 1 WHERE name = 'bruno'").unwrap();
    assert!(r.success);
    assert_eq!(r.success_image_key.as_deref(), Some("bruno"));
    assert!(s.progression().completed);
  }

  #[test]
  fn failed_statement_leaves_progression_alone() {
    let mut s = Session::new(case());
    let r = s.play("INSERT INTO nowhere VALUES (1)").unwrap();
    assert!(!r.success);
    assert!(s.progression().sql_history.is_empty());
  }

  #[test]
  fn reset_starts_over() {
    let mut s = Session::new(case());
    s.play("INSERT INTO clues VALUES (1, 'gun')").unwrap();
    let r = s.play("reset").unwrap();
    assert!(r.is_reset);
    assert_eq!(s.progression().current_puzzle, 1);
    assert!(s.progression().sql_history.is_empty());

    let r = s.play("SELECT COUNT(*) AS n FROM clues").unwrap();
    assert_eq!(r.data.unwrap()[0]["n"], 0);
  }
}
