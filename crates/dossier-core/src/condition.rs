//! Conditions guarding authored command-response rules.
//!
//! On the wire a condition is a `condition` tag plus a string `value`, e.g.
//! `{"condition": "puzzle_state_less", "value": "3"}`. In memory it is a
//! closed set of variants; tags the engine does not know are kept verbatim in
//! [`Condition::Unknown`] and never hold.

use serde::{Deserialize, Serialize};

use crate::NO_FOCUS;

/// A predicate over the player's current puzzle and focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
  #[default]
  Always,
  PuzzleEq(u32),
  PuzzleNeq(u32),
  PuzzleLt(u32),
  PuzzleGt(u32),
  FocusNone,
  Unknown { tag: String, value: String },
}

impl Condition {
  /// Evaluate the condition against a player's position in a case.
  pub fn holds(&self, puzzle: u32, focus: &str) -> bool {
    match self {
      Self::Always => true,
      Self::PuzzleEq(n) => puzzle == *n,
      Self::PuzzleNeq(n) => puzzle != *n,
      Self::PuzzleLt(n) => puzzle < *n,
      Self::PuzzleGt(n) => puzzle > *n,
      Self::FocusNone => focus == NO_FOCUS,
      Self::Unknown { .. } => false,
    }
  }
}

// ─── Wire form ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCondition {
  #[serde(default = "default_tag")]
  condition: String,
  #[serde(default)]
  value:     String,
}

fn default_tag() -> String { "always".to_owned() }

impl From<RawCondition> for Condition {
  fn from(raw: RawCondition) -> Self {
    let parsed = raw.value.trim().parse::<u32>().ok();
    // Comparisons against a malformed bound fall back to 0, except equality,
    // which can then never hold.
    let bound = parsed.unwrap_or(0);
    match raw.condition.as_str() {
      "always" => Self::Always,
      "puzzle_state" => match parsed {
        Some(n) => Self::PuzzleEq(n),
        None => Self::Unknown { tag: raw.condition, value: raw.value },
      },
      "puzzle_state_not" => Self::PuzzleNeq(bound),
      "puzzle_state_less" => Self::PuzzleLt(bound),
      "puzzle_state_greater" => Self::PuzzleGt(bound),
      "current_focus_none" => Self::FocusNone,
      _ => Self::Unknown { tag: raw.condition, value: raw.value },
    }
  }
}

impl From<Condition> for RawCondition {
  fn from(c: Condition) -> Self {
    let (condition, value) = match c {
      Condition::Always => ("always".to_owned(), String::new()),
      Condition::PuzzleEq(n) => ("puzzle_state".to_owned(), n.to_string()),
      Condition::PuzzleNeq(n) => ("puzzle_state_not".to_owned(), n.to_string()),
      Condition::PuzzleLt(n) => ("puzzle_state_less".to_owned(), n.to_string()),
      Condition::PuzzleGt(n) => {
        ("puzzle_state_greater".to_owned(), n.to_string())
      }
      Condition::FocusNone => ("current_focus_none".to_owned(), String::new()),
      Condition::Unknown { tag, value } => (tag, value),
    };
    Self { condition, value }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(tag: &str, value: &str) -> Condition {
    serde_json::from_value(serde_json::json!({ "condition": tag, "value": value }))
      .unwrap()
  }

  #[test]
  fn parses_known_tags() {
    assert_eq!(parse("always", ""), Condition::Always);
    assert_eq!(parse("puzzle_state", "2"), Condition::PuzzleEq(2));
    assert_eq!(parse("puzzle_state_not", "2"), Condition::PuzzleNeq(2));
    assert_eq!(parse("puzzle_state_less", " 3 "), Condition::PuzzleLt(3));
    assert_eq!(parse("puzzle_state_greater", "1"), Condition::PuzzleGt(1));
    assert_eq!(parse("current_focus_none", ""), Condition::FocusNone);
  }

  #[test]
  fn unknown_tag_never_holds() {
    let c = parse("moon_phase", "full");
    assert!(matches!(c, Condition::Unknown { .. }));
    assert!(!c.holds(1, NO_FOCUS));
  }

  #[test]
  fn malformed_equality_never_holds() {
    let c = parse("puzzle_state", "two");
    assert!(!c.holds(2, NO_FOCUS));
    assert!(!c.holds(0, NO_FOCUS));
  }

  #[test]
  fn malformed_ordering_bound_is_zero() {
    assert!(parse("puzzle_state_greater", "x").holds(1, NO_FOCUS));
    assert!(!parse("puzzle_state_less", "x").holds(1, NO_FOCUS));
  }

  #[test]
  fn evaluates_against_puzzle_and_focus() {
    assert!(Condition::PuzzleLt(3).holds(2, "desk"));
    assert!(!Condition::PuzzleLt(3).holds(3, "desk"));
    assert!(Condition::PuzzleGt(1).holds(2, "desk"));
    assert!(Condition::PuzzleNeq(1).holds(2, "desk"));
    assert!(Condition::FocusNone.holds(1, NO_FOCUS));
    assert!(!Condition::FocusNone.holds(1, "desk"));
  }

  #[test]
  fn missing_tag_defaults_to_always() {
    let c: Condition = serde_json::from_str("{}").unwrap();
    assert_eq!(c, Condition::Always);
  }

  #[test]
  fn serializes_back_to_tag_and_value() {
    let json = serde_json::to_value(Condition::PuzzleLt(4)).unwrap();
    assert_eq!(json["condition"], "puzzle_state_less");
    assert_eq!(json["value"], "4");
  }
}
