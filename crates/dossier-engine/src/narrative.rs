//! Narrative commands: help topics and authored command-response rules.

use dossier_core::{
  NO_FOCUS,
  case::{Case, CommandResponse, HelpText},
  progression::Progression,
  response::{GameResponse, GameState},
};

const HELP_VERBS: &[&str] = &["AJUDA", "HELP", "/AJUDA", "/HELP"];
const LOOK_VERBS: &[&str] = &["OLHAR", "LOOK"];
const EXIT_VERBS: &[&str] = &["SAIR", "FECHAR", "PARAR", "QUIT", "CLOSE", "STOP"];

/// An input split into uppercase whitespace-separated tokens.
pub(crate) struct Phrase<'a> {
  tokens: Vec<&'a str>,
}

impl<'a> Phrase<'a> {
  /// `upper` must already be trimmed and uppercased.
  pub(crate) fn new(upper: &'a str) -> Self {
    Self { tokens: upper.split_whitespace().collect() }
  }

  pub(crate) fn is_empty(&self) -> bool { self.tokens.is_empty() }

  fn verb(&self) -> &'a str { self.tokens.first().copied().unwrap_or_default() }

  fn argument(&self) -> Option<&'a str> { self.tokens.get(1).copied() }

  fn rest(&self) -> Option<String> {
    (self.tokens.len() > 1).then(|| self.tokens[1..].join(" "))
  }

  fn text(&self) -> String { self.tokens.join(" ") }
}

/// Answer `phrase` as a narrative command, or `None` to treat it as SQL.
pub(crate) fn respond(
  case: &Case,
  progression: &Progression,
  phrase: &Phrase<'_>,
) -> Option<GameResponse> {
  let puzzle = progression.current_puzzle;
  let focus = progression.current_focus.as_str();

  if HELP_VERBS.contains(&phrase.verb())
    && let Some(help) = help_topic(case, phrase, puzzle)
  {
    return Some(GameResponse::narrative(
      help.content.clone(),
      GameState::compute(case, puzzle, focus),
    ));
  }

  let rule = find_rule(case, progression, phrase)?;

  let verb = phrase.verb();
  let new_focus = if LOOK_VERBS.contains(&verb)
    && let Some(target) = phrase.argument()
  {
    target.to_lowercase()
  } else if EXIT_VERBS.contains(&verb) {
    NO_FOCUS.to_owned()
  } else {
    focus.to_owned()
  };

  tracing::debug!(command = %phrase.text(), focus = %new_focus, "narrative command");
  Some(
    GameResponse::narrative(
      rule.response.clone(),
      GameState::compute(case, puzzle, &new_focus),
    )
    .with_image(rule.image_key.clone()),
  )
}

/// The topic is the first argument; multi-word topics match the whole rest.
fn help_topic<'c>(case: &'c Case, phrase: &Phrase<'_>, puzzle: u32) -> Option<&'c HelpText> {
  phrase
    .argument()
    .and_then(|topic| case.help_for(topic, puzzle))
    .or_else(|| phrase.rest().and_then(|topic| case.help_for(&topic, puzzle)))
}

/// Exact phrase matches win; multi-word input then falls back to the verb.
/// Within each pass the first rule in authored order whose condition holds
/// is chosen.
fn find_rule<'c>(
  case: &'c Case,
  progression: &Progression,
  phrase: &Phrase<'_>,
) -> Option<&'c CommandResponse> {
  let first_matching = |wanted: &str| {
    case.command_responses.iter().find(|rule| {
      canonical(&rule.command) == wanted
        && rule
          .condition
          .holds(progression.current_puzzle, &progression.current_focus)
    })
  };

  first_matching(&phrase.text()).or_else(|| {
    if phrase.tokens.len() > 1 {
      first_matching(phrase.verb())
    } else {
      None
    }
  })
}

fn canonical(command: &str) -> String {
  command.split_whitespace().map(str::to_uppercase).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn case() -> Case {
    serde_json::from_value(serde_json::json!({
      "id": "c1",
      "title": "Case",
      "puzzles": [
        { "number": 1, "narrative": "Escritório", "tables": ["clues"] },
        { "number": 2, "narrative": "Porão", "tables": ["clues", "suspects"] }
      ],
      "command_responses": [
        { "command": "OLHAR MESA", "condition": "puzzle_state", "value": "2", "response": "A mesa do porão." },
        { "command": "olhar mesa", "condition": "always", "response": "Uma mesa velha.", "image_key": "desk" },
        { "command": "OLHAR", "condition": "current_focus_none", "response": "Você olha em volta." },
        { "command": "OLHAR", "condition": "always", "response": "Você já está olhando algo." },
        { "command": "SAIR", "condition": "always", "response": "Você se afasta." },
        { "command": "AJUDA", "condition": "always", "response": "Comandos: OLHAR, SAIR." },
        { "command": "DORMIR", "condition": "full_moon", "response": "Zzz." }
      ],
      "help_texts": [
        { "puzzle": 0, "topic": "select", "content": "Use SELECT para ler." },
        { "puzzle": 2, "topic": "join", "content": "Use JOIN." },
        { "puzzle": 0, "topic": "group by", "content": "GROUP BY agrupa linhas." }
      ]
    }))
    .unwrap()
  }

  fn at(puzzle: u32, focus: &str) -> Progression {
    let mut p = Progression::start("u1", &case());
    p.current_puzzle = puzzle;
    p.current_focus = focus.into();
    p
  }

  fn run(p: &Progression, input: &str) -> Option<GameResponse> {
    let upper = input.trim().to_uppercase();
    respond(&case(), p, &Phrase::new(&upper))
  }

  #[test]
  fn exact_match_respects_authored_order_and_conditions() {
    let r = run(&at(1, "none"), "olhar mesa").unwrap();
    assert_eq!(r.narrative, "Uma mesa velha.");
    assert_eq!(r.image_key.as_deref(), Some("desk"));

    let r = run(&at(2, "none"), "OLHAR MESA").unwrap();
    assert_eq!(r.narrative, "A mesa do porão.");
  }

  #[test]
  fn look_sets_focus_to_argument() {
    let r = run(&at(1, "none"), "OLHAR   Mesa").unwrap();
    assert_eq!(r.state.current_focus, "mesa");
    assert!(r.success);
  }

  #[test]
  fn verb_fallback_for_unknown_argument() {
    let r = run(&at(1, "none"), "OLHAR QUADRO").unwrap();
    assert_eq!(r.narrative, "Você olha em volta.");
    assert_eq!(r.state.current_focus, "quadro");

    let r = run(&at(1, "mesa"), "OLHAR QUADRO").unwrap();
    assert_eq!(r.narrative, "Você já está olhando algo.");
  }

  #[test]
  fn single_word_has_no_fallback() {
    assert!(run(&at(1, "none"), "CORRER").is_none());
  }

  #[test]
  fn exit_resets_focus() {
    let r = run(&at(1, "desk"), "SAIR").unwrap();
    assert_eq!(r.narrative, "Você se afasta.");
    assert_eq!(r.state.current_focus, NO_FOCUS);
  }

  #[test]
  fn other_commands_keep_focus() {
    let r = run(&at(1, "desk"), "ajuda").unwrap();
    assert_eq!(r.narrative, "Comandos: OLHAR, SAIR.");
    assert_eq!(r.state.current_focus, "desk");
  }

  #[test]
  fn help_topic_is_scoped() {
    let r = run(&at(1, "none"), "AJUDA select").unwrap();
    assert_eq!(r.narrative, "Use SELECT para ler.");

    let r = run(&at(2, "none"), "/help JOIN").unwrap();
    assert_eq!(r.narrative, "Use JOIN.");
  }

  #[test]
  fn help_topic_is_the_first_argument() {
    let r = run(&at(1, "none"), "AJUDA SELECT agora").unwrap();
    assert_eq!(r.narrative, "Use SELECT para ler.");

    let r = run(&at(1, "none"), "ajuda group by").unwrap();
    assert_eq!(r.narrative, "GROUP BY agrupa linhas.");
  }

  #[test]
  fn unknown_help_topic_falls_back_to_help_rule() {
    let r = run(&at(1, "none"), "AJUDA JOIN").unwrap();
    assert_eq!(r.narrative, "Comandos: OLHAR, SAIR.");
  }

  #[test]
  fn unknown_condition_never_matches() {
    assert!(run(&at(1, "none"), "DORMIR").is_none());
  }

  #[test]
  fn sql_is_not_narrative() {
    assert!(run(&at(1, "none"), "SELECT * FROM clues").is_none());
  }

  #[test]
  fn state_reflects_current_puzzle() {
    let r = run(&at(2, "none"), "SAIR").unwrap();
    assert_eq!(r.state.current_puzzle, 2);
    assert_eq!(r.state.tables, ["clues", "suspects"]);
    assert_eq!(r.state.narrative, "Porão");
  }
}
