//! `dossier`: offline tools for Dossier case files.
//!
//! # Usage
//!
//! ```
//! dossier check cases/*.json
//! dossier play cases/o-caso-da-arma.json
//! ```

mod session;

use std::{
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dossier_core::{case::Case, response::GameResponse};
use session::Session;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dossier", about = "Offline tools for Dossier case files")]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Parse and validate case files.
  Check {
    #[arg(required = true, value_name = "CASE")]
    files: Vec<PathBuf>,
  },
  /// Play a case from stdin with a throwaway progression.
  Play {
    #[arg(value_name = "CASE")]
    file: PathBuf,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  match Args::parse().command {
    Command::Check { files } => Ok(check(&files)),
    Command::Play { file } => play(&file).map(|()| ExitCode::SUCCESS),
  }
}

fn load(path: &Path) -> Result<Case> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading case file {}", path.display()))?;
  let case = Case::from_json(&raw).context("parsing case document")?;
  case.validate()?;
  Ok(case)
}

// ─── check ───────────────────────────────────────────────────────────────────

fn check(files: &[PathBuf]) -> ExitCode {
  let mut failed = 0usize;
  for path in files {
    match load(path) {
      Ok(case) => println!(
        "{}: ok ({}, {} puzzles)",
        path.display(),
        case.id,
        case.puzzles.len()
      ),
      Err(e) => {
        failed += 1;
        println!("{}: {e:#}", path.display());
      }
    }
  }
  if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// ─── play ────────────────────────────────────────────────────────────────────

fn play(path: &Path) -> Result<()> {
  let mut session = Session::new(load(path)?);
  let stdout = io::stdout();
  let mut out = stdout.lock();

  writeln!(out, "── {} ──", session.case().title)?;
  let opening = session.opening();
  writeln!(out, "{}", opening.narrative)?;

  for line in io::stdin().lock().lines() {
    let line = line.context("reading stdin")?;
    if line.trim().is_empty() {
      continue;
    }
    let response = session.play(&line)?;
    print_response(&mut out, &response)?;
    if session.progression().completed {
      writeln!(out, "── case solved ──")?;
      break;
    }
  }
  Ok(())
}

fn print_response(out: &mut impl Write, response: &GameResponse) -> Result<()> {
  if let Some(error) = &response.error {
    writeln!(out, "! {error}")?;
  }
  if !response.narrative.is_empty() {
    writeln!(out, "{}", response.narrative)?;
  }
  if let Some(rows) = &response.data {
    writeln!(out, "{}", serde_json::to_string_pretty(rows)?)?;
  }
  writeln!(
    out,
    "[puzzle {} · focus {}]",
    response.state.current_puzzle, response.state.current_focus
  )?;
  Ok(())
}
