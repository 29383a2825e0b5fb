use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::IfcResult;

// word runs, single non-word non-space characters, and whitespace runs;
// together these partition the input with no gaps
fn lexeme_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\w+|[^\w\s]|\s+").expect("lexeme regex"))
}

/// Streams the lexemes of the file at `path` through `f`, line by line,
/// without materializing a token list.
///
/// Invalid UTF-8 decodes to U+FFFD. Calling this again replays the exact
/// same lexeme sequence, which is what lets the streaming encoder make two
/// passes over the input.
pub fn for_each_lexeme<F>(path: &Path, mut f: F) -> IfcResult<()>
where
  F: FnMut(&str) -> IfcResult<()>,
{
  let file = File::open(path)?;
  let mut reader = BufReader::new(file);
  let mut buf = Vec::new();
  loop {
    buf.clear();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
      break;
    }
    let line = String::from_utf8_lossy(&buf);
    for m in lexeme_regex().find_iter(&line) {
      f(m.as_str())?;
    }
  }
  Ok(())
}

/// Text tokens reconstruct by concatenation; every key is its own lexeme.
pub fn reconstruct(keys: &[String]) -> String {
  keys.concat()
}
