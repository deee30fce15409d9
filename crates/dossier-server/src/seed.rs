//! Startup seeding of authored case files into the store.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dossier_core::{case::Case, store::CaseStore};

/// Upsert every valid `*.json` case under `dir`, in file-name order.
///
/// Files that fail to parse or validate are logged and skipped. Returns the
/// number of cases stored.
pub async fn seed_cases<S>(store: &S, dir: &Path) -> anyhow::Result<usize>
where
  S: CaseStore,
{
  let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
    .with_context(|| format!("failed to read cases directory {}", dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
    .collect();
  files.sort();

  let mut stored = 0;
  for path in files {
    let case = match read_case(&path) {
      Ok(case) => case,
      Err(e) => {
        tracing::warn!(file = %path.display(), error = %format!("{e:#}"), "skipping case file");
        continue;
      }
    };
    store
      .put_case(&case)
      .await
      .with_context(|| format!("failed to store case {}", case.id))?;
    tracing::info!(case = %case.id, file = %path.display(), "case loaded");
    stored += 1;
  }
  Ok(stored)
}

fn read_case(path: &Path) -> anyhow::Result<Case> {
  let raw = std::fs::read_to_string(path).context("unreadable")?;
  let case = Case::from_json(&raw).context("not a case document")?;
  case.validate()?;
  Ok(case)
}
