//! [`process_command`]: one player input in, one [`GameResponse`] out.
//!
//! ```text
//! dispatch ─┬─ narrative match ─────────────────────────────┐
//!           └─ focus check ─ sandbox ─ execute ─ evaluate ──┴─ respond
//! ```
//!
//! The progression is never mutated here. The response state carries the
//! new puzzle and focus and [`Outcome::history`] carries the statement to
//! record; persisting both is the caller's job.

use chrono::Utc;
use dossier_core::{
  NO_FOCUS, RESET_CASE_SENTINEL,
  case::{Case, Validation},
  progression::{Progression, SqlHistoryItem},
  response::{GameResponse, GameState, Row},
};

use crate::{
  Result, focus,
  narrative::{self, Phrase},
  normalize::normalize,
  sandbox::Sandbox,
};

/// Narrative for a statement that ran but matched no validation rule.
pub const EXECUTED_NARRATIVE: &str = "Query executed successfully.";

/// Narrative for blank input.
pub const EMPTY_COMMAND: &str = "Type a command or a SQL statement.";

/// Narrative returned for a `RESET`.
pub const RESET_NARRATIVE: &str = "Progress reset.";

/// The response to a `RESET`: the starting puzzle, no focus.
///
/// Clearing the stored progression is the caller's job.
pub fn reset_response(case: &Case) -> GameResponse {
  let mut response = GameResponse::narrative(
    RESET_NARRATIVE,
    GameState::compute(case, case.starting_puzzle(), NO_FOCUS),
  );
  response.is_reset = true;
  response
}

/// The result of processing one input.
#[derive(Debug, Clone)]
pub struct Outcome {
  pub response: GameResponse,
  /// Set for every non-`SELECT` statement that executed.
  pub history:  Option<SqlHistoryItem>,
}

impl Outcome {
  fn respond(response: GameResponse) -> Self { Self { response, history: None } }

  /// The history item the caller should persist, if any.
  ///
  /// Only successful responses record history, and the reset sentinel is
  /// never recorded.
  pub fn persistable_history(&self) -> Option<&SqlHistoryItem> {
    self
      .history
      .as_ref()
      .filter(|_| self.response.success)
      .filter(|item| item.query.trim() != RESET_CASE_SENTINEL)
  }
}

/// Interpret `input` for a player at `progression` in `case`.
///
/// Rejected moves (a focus requirement, invalid SQL, a failed puzzle check)
/// come back as responses. The only error is failure to build the sandbox.
pub fn process_command(
  case: &Case,
  progression: &Progression,
  input: &str,
) -> Result<Outcome> {
  let upper = input.trim().to_uppercase();
  let phrase = Phrase::new(&upper);

  if phrase.is_empty() {
    return Ok(Outcome::respond(GameResponse::rejected(
      EMPTY_COMMAND,
      current_state(case, progression),
    )));
  }

  if let Some(response) = narrative::respond(case, progression, &phrase) {
    return Ok(Outcome::respond(response));
  }

  if let Err(rejection) = focus::check(case, progression, input) {
    tracing::debug!(
      case = %case.id,
      required = %rejection.required_focus,
      "statement needs a different focus"
    );
    return Ok(Outcome::respond(GameResponse::rejected(
      rejection.message,
      current_state(case, progression),
    )));
  }

  let is_query = upper.starts_with("SELECT");
  tracing::debug!(case = %case.id, is_query, "dispatching as SQL");
  execute(case, progression, input, is_query)
}

fn execute(
  case: &Case,
  progression: &Progression,
  input: &str,
  is_query: bool,
) -> Result<Outcome> {
  let sandbox = Sandbox::build(case, progression)?;
  let statement = normalize(input);

  let (data, history) = if is_query {
    match sandbox.query_rows(&statement) {
      Ok(rows) => (Some(rows), None),
      Err(e) => return Ok(engine_error(case, progression, &e)),
    }
  } else {
    match sandbox.execute(&statement) {
      Ok(()) => (None, Some(SqlHistoryItem {
        timestamp:    Utc::now(),
        query:        input.to_owned(),
        puzzle_state: progression.current_puzzle,
        focus_state:  progression.current_focus.clone(),
      })),
      Err(e) => return Ok(engine_error(case, progression, &e)),
    }
  };

  let response = evaluate(case, progression, &sandbox, data);
  Ok(Outcome { response, history })
}

fn engine_error(
  case: &Case,
  progression: &Progression,
  error: &rusqlite::Error,
) -> Outcome {
  tracing::debug!(case = %case.id, %error, "statement failed");
  Outcome::respond(GameResponse::rejected(
    error.to_string(),
    current_state(case, progression),
  ))
}

/// Scan the current puzzle's validation rules against the post-statement
/// database.
///
/// The first passing rule wins. When none passes, the first failing rule
/// that carries a failure narrative answers instead. Check queries go
/// through the same case-insensitive rewrite as player SQL.
fn evaluate(
  case: &Case,
  progression: &Progression,
  sandbox: &Sandbox,
  data: Option<Vec<Row>>,
) -> GameResponse {
  let puzzle = progression.current_puzzle;
  let mut failed: Option<(&Validation, &str)> = None;

  for rule in case.validations_for(puzzle).filter(|v| v.kind.is_evaluated()) {
    if check_passes(case, sandbox, rule) {
      return unlock(case, progression, rule, data);
    }
    if failed.is_none() {
      failed = rule
        .failure_narrative
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|failure| (rule, failure));
    }
  }

  match failed {
    Some((rule, failure)) => {
      let mut response =
        GameResponse::narrative(failure, current_state(case, progression)).with_data(data);
      response.failure_image_key.clone_from(&rule.failure_image_key);
      response.image_key.clone_from(&rule.failure_image_key);
      response
    }
    None => GameResponse::narrative(EXECUTED_NARRATIVE, current_state(case, progression))
      .with_data(data),
  }
}

fn check_passes(case: &Case, sandbox: &Sandbox, rule: &Validation) -> bool {
  match sandbox.scalar(&normalize(&rule.check_sql)) {
    Ok(value) => value == rule.expect_value,
    Err(error) => {
      tracing::warn!(
        case = %case.id,
        puzzle = rule.puzzle,
        check = %rule.check_sql,
        %error,
        "validation check failed to run"
      );
      false
    }
  }
}

fn unlock(
  case: &Case,
  progression: &Progression,
  rule: &Validation,
  data: Option<Vec<Row>>,
) -> GameResponse {
  let state = if rule.unlocks_next {
    let next = rule.next_puzzle.max(progression.current_puzzle);
    tracing::info!(
      case = %case.id,
      from = progression.current_puzzle,
      to = next,
      "puzzle unlocked"
    );
    GameState::compute(case, next, NO_FOCUS)
  } else {
    current_state(case, progression)
  };

  let mut response =
    GameResponse::narrative(rule.success_narrative.clone(), state).with_data(data);
  response.success_image_key.clone_from(&rule.success_image_key);
  response.image_key.clone_from(&rule.success_image_key);
  response
}

fn current_state(case: &Case, progression: &Progression) -> GameState {
  GameState::compute(case, progression.current_puzzle, &progression.current_focus)
}
