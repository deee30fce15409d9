//! Case-insensitive string comparisons in player SQL.
//!
//! Players type `WHERE nome = 'Maria'` and expect it to find `MARIA`. The
//! rewrite is textual: everything from the first `WHERE` onwards has its
//! `=`, `!=`/`<>` and `[NOT] LIKE` comparisons against string literals
//! wrapped in `LOWER(...)`. Literals containing escaped quotes, comparisons
//! written literal-first and `WHERE` inside an earlier string literal are not
//! handled.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

// Bare or table-qualified column name.
const IDENT: &str = r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)?";

static WHERE_KEYWORD: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid regex"));

static EQ: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"\b({IDENT})\s*=\s*'([^']*)'")).expect("valid regex")
});

static NEQ: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"\b({IDENT})\s*(!=|<>)\s*'([^']*)'")).expect("valid regex")
});

static LIKE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"(?i)\b({IDENT})(\s+NOT)?\s+LIKE\s+'([^']*)'"))
    .expect("valid regex")
});

/// Rewrite the `WHERE` clause of `query` so string comparisons ignore case.
///
/// Queries without `WHERE` are returned borrowed and unchanged. Running the
/// rewrite on its own output changes nothing.
pub fn normalize(query: &str) -> Cow<'_, str> {
  let Some(at) = WHERE_KEYWORD.find(query).map(|m| m.start()) else {
    return Cow::Borrowed(query);
  };
  let (head, tail) = query.split_at(at);

  let eq = EQ.replace_all(tail, "LOWER(${1}) = LOWER('${2}')");
  let neq = NEQ.replace_all(&eq, "LOWER(${1}) ${2} LOWER('${3}')");
  let rewritten = LIKE.replace_all(&neq, "LOWER(${1})${2} LIKE LOWER('${3}')");

  if rewritten == tail {
    return Cow::Borrowed(query);
  }
  Cow::Owned(format!("{head}{rewritten}"))
}
