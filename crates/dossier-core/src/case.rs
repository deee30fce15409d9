//! Case types: the authored, read-only definition of a detective story.
//!
//! A case is pure data: the puzzles a player moves through, the schema that
//! becomes visible at each puzzle, and the rule lists the engine scans in
//! authored order. Nothing in here is mutated while a case is played.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, condition::Condition};

// ─── Case ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
  pub id:                 String,
  #[serde(default)]
  pub title:              String,
  #[serde(default)]
  pub description:        String,
  #[serde(default)]
  pub difficulty:         String,
  /// Position in case listings.
  #[serde(default)]
  pub order:              i64,
  #[serde(default)]
  pub version:            i64,
  #[serde(default)]
  pub created_at:         Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:         Option<DateTime<Utc>>,
  #[serde(default)]
  pub config:             CaseConfig,
  #[serde(default)]
  pub puzzles:            Vec<Puzzle>,
  #[serde(default)]
  pub schemas:            Vec<Schema>,
  #[serde(default)]
  pub command_responses:  Vec<CommandResponse>,
  #[serde(default)]
  pub validations:        Vec<Validation>,
  #[serde(default)]
  pub focus_requirements: Vec<FocusRequirement>,
  #[serde(default)]
  pub sql_functions:      Vec<SqlFunction>,
  #[serde(default)]
  pub help_texts:         Vec<HelpText>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
  #[serde(default = "first_puzzle")]
  pub starting_puzzle: u32,
  /// Objects the player can `OLHAR` at; informational for clients.
  #[serde(default)]
  pub interactables:   Vec<String>,
}

impl Default for CaseConfig {
  fn default() -> Self {
    Self { starting_puzzle: first_puzzle(), interactables: Vec::new() }
  }
}

fn first_puzzle() -> u32 { 1 }

/// Listing entry for a case; omits everything that would spoil it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
  pub id:          String,
  pub title:       String,
  pub description: String,
  pub difficulty:  String,
}

// ─── Puzzles and schema ──────────────────────────────────────────────────────

/// A numbered stage of a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
  pub number:    u32,
  #[serde(default)]
  pub narrative: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_key: Option<String>,
  /// Tables the player is told about at this stage.
  #[serde(default)]
  pub tables:    Vec<String>,
  /// Verbs the player is told about at this stage.
  #[serde(default)]
  pub commands:  Vec<String>,
}

/// A schema fragment, active from `puzzle` onwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
  pub puzzle:     u32,
  #[serde(default)]
  pub table_name: String,
  pub create_sql: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub insert_sql: Option<String>,
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// A narrative response to a fixed verb phrase such as `OLHAR MESA`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
  pub command:   String,
  #[serde(flatten)]
  pub condition: Condition,
  pub response:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_key: Option<String>,
}

/// How a validation rule is checked. Only the known kinds are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
  ResultCheck,
  TableCheck,
  TableCompleteCheck,
  #[default]
  SqlCheck,
  #[serde(other)]
  Other,
}

impl ValidationKind {
  pub fn is_evaluated(self) -> bool { !matches!(self, Self::Other) }
}

/// A puzzle-completion check run after every successful statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
  pub puzzle:            u32,
  #[serde(rename = "type", default)]
  pub kind:              ValidationKind,
  /// Query whose first column of the first row is compared to
  /// `expect_value`.
  pub check_sql:         String,
  pub expect_value:      String,
  #[serde(default)]
  pub success_narrative: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub success_image_key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failure_narrative: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failure_image_key: Option<String>,
  #[serde(default)]
  pub unlocks_next:      bool,
  #[serde(default)]
  pub next_puzzle:       u32,
}

/// Statements containing any of `command_types` need `required_focus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusRequirement {
  pub puzzle:         u32,
  pub command_types:  Vec<String>,
  pub required_focus: String,
  pub error_message:  String,
}

/// Reference card for a SQL function, shown to players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlFunction {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub example:     String,
}

/// Help topic; puzzle `0` makes it available everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpText {
  #[serde(default)]
  pub puzzle:  u32,
  pub topic:   String,
  pub content: String,
}

impl HelpText {
  pub fn applies_to(&self, puzzle: u32) -> bool {
    self.puzzle == 0 || self.puzzle == puzzle
  }
}

// ─── Queries over a case ─────────────────────────────────────────────────────

impl Case {
  pub fn starting_puzzle(&self) -> u32 { self.config.starting_puzzle }

  pub fn puzzle(&self, number: u32) -> Option<&Puzzle> {
    self.puzzles.iter().find(|p| p.number == number)
  }

  /// Schema fragments visible at `puzzle`, in declared order.
  pub fn schemas_through(&self, puzzle: u32) -> impl Iterator<Item = &Schema> {
    self.schemas.iter().filter(move |s| s.puzzle <= puzzle)
  }

  pub fn validations_for(&self, puzzle: u32) -> impl Iterator<Item = &Validation> {
    self.validations.iter().filter(move |v| v.puzzle == puzzle)
  }

  pub fn focus_requirements_for(
    &self,
    puzzle: u32,
  ) -> impl Iterator<Item = &FocusRequirement> {
    self.focus_requirements.iter().filter(move |r| r.puzzle == puzzle)
  }

  /// First help entry whose topic matches case-insensitively and which is in
  /// scope for `puzzle`.
  pub fn help_for(&self, topic: &str, puzzle: u32) -> Option<&HelpText> {
    self
      .help_texts
      .iter()
      .find(|h| h.topic.eq_ignore_ascii_case(topic) && h.applies_to(puzzle))
  }

  /// Whether a player at `puzzle` has finished the case.
  pub fn is_complete_at(&self, puzzle: u32) -> bool {
    usize::try_from(puzzle).is_ok_and(|p| p >= self.puzzles.len())
  }

  pub fn summary(&self) -> CaseSummary {
    CaseSummary {
      id:          self.id.clone(),
      title:       self.title.clone(),
      description: self.description.clone(),
      difficulty:  self.difficulty.clone(),
    }
  }

  /// Reject cases that cannot be played at all.
  pub fn validate(&self) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidCase {
      case_id: self.id.clone(),
      reason:  reason.to_owned(),
    };

    if self.id.trim().is_empty() {
      return Err(invalid("missing id"));
    }
    if self.title.trim().is_empty() {
      return Err(invalid("missing title"));
    }
    if self.puzzles.is_empty() {
      return Err(invalid("no puzzles"));
    }
    if self.puzzles.iter().any(|p| p.number < 1) {
      return Err(invalid("puzzle numbers start at 1"));
    }
    if self.starting_puzzle() < 1 {
      return Err(invalid("starting puzzle must be at least 1"));
    }
    Ok(())
  }

  /// Parse a case from its JSON document form.
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CASE_JSON: &str = r#"{
    "id": "biblioteca",
    "title": "O Caso da Biblioteca",
    "puzzles": [
      { "number": 1, "narrative": "A biblioteca está fechada.", "tables": ["livros"] },
      { "number": 2, "narrative": "Alguém mentiu.", "tables": ["livros", "funcionarios"] }
    ],
    "schemas": [
      { "puzzle": 1, "table_name": "livros", "create_sql": "CREATE TABLE livros (id INT)" },
      { "puzzle": 2, "table_name": "funcionarios", "create_sql": "CREATE TABLE funcionarios (id INT)" }
    ],
    "command_responses": [
      { "command": "OLHAR MESA", "condition": "puzzle_state", "value": "1", "response": "Uma mesa." },
      { "command": "SAIR", "response": "Você se afasta." }
    ],
    "validations": [
      { "puzzle": 1, "type": "result_check", "check_sql": "SELECT 1", "expect_value": "1",
        "success_narrative": "Bom.", "unlocks_next": true, "next_puzzle": 2 },
      { "puzzle": 2, "type": "mystery", "check_sql": "SELECT 1", "expect_value": "1" }
    ],
    "help_texts": [
      { "puzzle": 0, "topic": "select", "content": "SELECT lê dados." },
      { "puzzle": 2, "topic": "join", "content": "JOIN junta tabelas." }
    ]
  }"#;

  fn case() -> Case { Case::from_json(CASE_JSON).unwrap() }

  #[test]
  fn parses_authored_document() {
    let c = case();
    assert_eq!(c.starting_puzzle(), 1);
    assert_eq!(c.command_responses[0].condition, Condition::PuzzleEq(1));
    assert_eq!(c.command_responses[1].condition, Condition::Always);
    assert_eq!(c.validations[0].kind, ValidationKind::ResultCheck);
    assert_eq!(c.validations[1].kind, ValidationKind::Other);
    assert!(!c.validations[1].kind.is_evaluated());
  }

  #[test]
  fn schemas_are_cumulative() {
    let c = case();
    assert_eq!(c.schemas_through(1).count(), 1);
    assert_eq!(c.schemas_through(2).count(), 2);
    assert_eq!(c.schemas_through(7).count(), 2);
  }

  #[test]
  fn help_scoping() {
    let c = case();
    assert!(c.help_for("SELECT", 1).is_some());
    assert!(c.help_for("join", 1).is_none());
    assert_eq!(c.help_for("Join", 2).unwrap().content, "JOIN junta tabelas.");
  }

  #[test]
  fn completion_is_puzzle_count() {
    let c = case();
    assert!(!c.is_complete_at(1));
    assert!(c.is_complete_at(2));
  }

  #[test]
  fn validate_rejects_unplayable_cases() {
    assert!(case().validate().is_ok());

    let mut c = case();
    c.title = "  ".into();
    assert!(matches!(c.validate(), Err(Error::InvalidCase { .. })));

    let mut c = case();
    c.puzzles.clear();
    assert!(c.validate().is_err());

    let mut c = case();
    c.puzzles[0].number = 0;
    assert!(c.validate().is_err());
  }

  #[test]
  fn command_response_round_trips_condition_fields() {
    let c = case();
    let json = serde_json::to_value(&c.command_responses[0]).unwrap();
    assert_eq!(json["condition"], "puzzle_state");
    assert_eq!(json["value"], "1");
    assert_eq!(json["command"], "OLHAR MESA");
  }
}
