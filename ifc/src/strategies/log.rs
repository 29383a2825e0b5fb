use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::delta_encoding;
use crate::errors::{IfcError, IfcResult};
use crate::token::{unexpected, Token, TokenCursor};

/// Log transform: leading timestamps become a delta-encoded sequence,
/// severity words are interned as small codes, and the message remainder is
/// carried as a literal. Lines without a parseable timestamp pass through
/// raw.
///
/// Timestamps are interpreted as UTC on both sides and carried with second
/// precision; sub-second digits, timezone offsets, and the original position
/// of the severity word are not preserved.
#[derive(Default)]
pub struct LogStrategy;

const SEVERITY_WORDS: [(&str, u8); 5] = [
  ("DEBUG", 0),
  ("INFO", 1),
  ("WARN", 2),
  ("WARNING", 2),
  ("ERROR", 3),
];

fn severity_word(code: u8) -> &'static str {
  match code {
    0 => "DEBUG",
    1 => "INFO",
    2 => "WARNING",
    3 => "ERROR",
    _ => "UNKNOWN",
  }
}

fn timestamp_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").expect("timestamp regex")
  })
}

fn whitespace_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn parse_timestamp(raw: &str) -> Option<i64> {
  let normalized = raw.replace('T', " ");
  NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
    .ok()
    .map(|dt| dt.and_utc().timestamp())
}

// earliest match wins; on a position tie the longer word wins, so WARNING
// is not clipped to WARN
fn find_severity(remainder: &str) -> Option<(usize, &'static str, u8)> {
  let mut best: Option<(usize, &'static str, u8)> = None;
  for (word, code) in SEVERITY_WORDS {
    if let Some(pos) = remainder.find(word) {
      let better = match best {
        None => true,
        Some((best_pos, best_word, _)) => {
          pos < best_pos || (pos == best_pos && word.len() > best_word.len())
        }
      };
      if better {
        best = Some((pos, word, code));
      }
    }
  }
  best
}

enum LogLine {
  Stamped {
    severity: Option<u8>,
    message: String,
  },
  Raw(String),
}

impl LogStrategy {
  pub fn new() -> Self {
    LogStrategy
  }

  pub fn parse(path: &Path) -> IfcResult<Vec<String>> {
    let bytes = fs::read(path)?;
    let raw = String::from_utf8_lossy(&bytes);
    Ok(raw.lines().map(|line| line.to_string()).collect())
  }

  pub fn tokenize(&mut self, lines: &[String]) -> Vec<Token> {
    let mut entries = Vec::with_capacity(lines.len());
    let mut timestamps = Vec::new();

    for line in lines {
      let stamped = timestamp_regex().find(line).and_then(|m| {
        let ts = parse_timestamp(m.as_str())?;
        let mut remainder = line[m.end()..].trim().to_string();
        let severity = find_severity(&remainder).map(|(pos, word, code)| {
          remainder.replace_range(pos..pos + word.len(), "");
          code
        });
        Some((ts, severity, remainder))
      });

      match stamped {
        Some((ts, severity, message)) => {
          timestamps.push(ts);
          entries.push(LogLine::Stamped {
            severity,
            message,
          });
        }
        None => entries.push(LogLine::Raw(line.trim().to_string())),
      }
    }

    let deltas = delta_encoding::encode(&timestamps);
    let mut delta_iter = deltas.into_iter();
    let mut tokens = Vec::new();
    for entry in entries {
      match entry {
        LogLine::Stamped {
          severity,
          message,
        } => {
          // one delta per stamped line, by construction
          tokens.push(Token::Delta(delta_iter.next().unwrap()));
          tokens.push(Token::Severity(severity));
          tokens.push(Token::Message(message));
        }
        LogLine::Raw(line) => tokens.push(Token::Raw(line)),
      }
    }
    tokens
  }

  pub fn token_from_key(key: &str) -> IfcResult<Token> {
    let malformed =
      || IfcError::malformed_token_stream(format!("{} is not a log strategy token", key));

    if let Some(rest) = key.strip_prefix("SEV:") {
      if rest == "UNKNOWN" {
        return Ok(Token::Severity(None));
      }
      return Ok(Token::Severity(Some(rest.parse().map_err(|_| malformed())?)));
    }
    if let Some(rest) = key.strip_prefix("MSG:") {
      return Ok(Token::Message(rest.to_string()));
    }
    if let Some(rest) = key.strip_prefix("RAW:") {
      return Ok(Token::Raw(rest.to_string()));
    }
    if let Some(rest) = key.strip_prefix('D') {
      return Ok(Token::Delta(rest.parse().map_err(|_| malformed())?));
    }
    Err(malformed())
  }

  pub fn reconstruct(&self, cursor: &mut TokenCursor) -> IfcResult<String> {
    let mut lines = Vec::new();
    let mut current_ts: i64 = 0;

    while let Some(token) = cursor.advance() {
      match token {
        Token::Delta(delta) => {
          current_ts = current_ts.wrapping_add(delta);
          let ts_str = DateTime::from_timestamp(current_ts, 0)
            .ok_or_else(|| {
              IfcError::malformed_token_stream(format!(
                "timestamp {} is out of range",
                current_ts
              ))
            })?
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

          let severity = match cursor.advance() {
            Some(Token::Severity(code)) => code,
            other => return Err(unexpected("expected a severity", other.as_ref())),
          };
          let message = match cursor.advance() {
            Some(Token::Message(message)) => message,
            other => return Err(unexpected("expected a message", other.as_ref())),
          };

          let severity_str = match severity {
            Some(code) => severity_word(code),
            None => "",
          };
          let line = format!("{} {} {}", ts_str, severity_str, message);
          let line = whitespace_regex().replace_all(line.trim(), " ");
          lines.push(line.into_owned());
        }
        Token::Raw(line) => lines.push(line),
        other => return Err(unexpected("expected a timestamp delta or raw line", Some(&other))),
      }
    }

    Ok(lines.join("\n"))
  }
}
