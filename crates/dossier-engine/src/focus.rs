//! Focus requirements: "to run an `UPDATE` here you must be looking at the
//! desk".

use dossier_core::{case::Case, progression::Progression};
use thiserror::Error;

/// A statement rejected before execution because the player's focus is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FocusRequired {
  pub required_focus: String,
  /// The authored message shown to the player.
  pub message:        String,
}

/// Check `command` against every focus requirement of the current puzzle.
///
/// A requirement applies when the command contains any of its statement-type
/// keywords, compared case-insensitively. The first applicable requirement
/// whose focus does not match rejects the command.
pub fn check(
  case: &Case,
  progression: &Progression,
  command: &str,
) -> Result<(), FocusRequired> {
  let upper = command.to_uppercase();

  for req in case.focus_requirements_for(progression.current_puzzle) {
    let applies = req
      .command_types
      .iter()
      .any(|kw| !kw.is_empty() && upper.contains(&kw.to_uppercase()));

    if applies && progression.current_focus != req.required_focus {
      return Err(FocusRequired {
        required_focus: req.required_focus.clone(),
        message:        req.error_message.clone(),
      });
    }
  }
  Ok(())
}
