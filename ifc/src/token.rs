use crate::errors::IfcError;

/// A tagged value emitted by a strategy and consumed by the entropy coder.
///
/// Every token has a stable textual key, its identity for frequency counting
/// and codebook lookup. The key is derived only at the entropy-coder
/// boundary; strategies work with the variants. Unique key prefixes keep the
/// key space of tokens coexisting in one payload disjoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
  ObjectBegin,
  ObjectEnd,
  ArrayBegin,
  ArrayEnd,
  /// Dictionary reference, by id.
  Key(u64),
  Str(String),
  Int(i64),
  Bool(bool),
  Null,
  /// Marks an array encoded as a delta sequence.
  DeltaRun,
  /// One delta value of a delta-encoded sequence.
  Delta(i64),
  Headers,
  Data,
  /// Marks a columnar run of deltas for column `i`.
  IntColumn(usize),
  /// Marks a columnar run of dictionary ids for column `i`.
  StrColumn(usize),
  EndColumn,
  /// A raw lexeme: a CSV header literal or a text token. Its key is the
  /// lexeme itself.
  Literal(String),
  /// Log severity code, or `None` when no known severity word was found.
  Severity(Option<u8>),
  /// Log message remainder.
  Message(String),
  /// A log line carried verbatim.
  Raw(String),
}

impl Token {
  /// The stable string key of this token.
  pub fn key(&self) -> String {
    match self {
      Token::ObjectBegin => "{".to_string(),
      Token::ObjectEnd => "}".to_string(),
      Token::ArrayBegin => "[".to_string(),
      Token::ArrayEnd => "]".to_string(),
      Token::Key(id) => format!("K{}", id),
      Token::Str(s) => format!("S:{}", s),
      Token::Int(x) => format!("I:{}", x),
      Token::Bool(b) => format!("B:{}", if *b { "True" } else { "False" }),
      Token::Null => "NULL".to_string(),
      Token::DeltaRun => "DELTA_INT_SEQ".to_string(),
      Token::Delta(d) => format!("D{}", d),
      Token::Headers => "HEADERS".to_string(),
      Token::Data => "DATA".to_string(),
      Token::IntColumn(i) => format!("COL_INT_{}", i),
      Token::StrColumn(i) => format!("COL_STR_{}", i),
      Token::EndColumn => "END_COL".to_string(),
      Token::Literal(s) => s.clone(),
      Token::Severity(Some(code)) => format!("SEV:{}", code),
      Token::Severity(None) => "SEV:UNKNOWN".to_string(),
      Token::Message(s) => format!("MSG:{}", s),
      Token::Raw(s) => format!("RAW:{}", s),
    }
  }
}

pub(crate) fn unexpected(context: &str, token: Option<&Token>) -> IfcError {
  match token {
    Some(t) => {
      IfcError::malformed_token_stream(format!("{}: unexpected token {}", context, t.key()))
    }
    None => IfcError::malformed_token_stream(format!("{}: token stream ended early", context)),
  }
}

/// An indexable buffer over a decoded token sequence, giving reconstruction
/// the one-token lookahead it needs.
pub struct TokenCursor {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenCursor {
  pub fn new(tokens: Vec<Token>) -> Self {
    TokenCursor {
      tokens,
      pos: 0,
    }
  }

  pub fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  pub fn advance(&mut self) -> Option<Token> {
    let res = self.tokens.get(self.pos).cloned();
    if res.is_some() {
      self.pos += 1;
    }
    res
  }

  pub fn is_empty(&self) -> bool {
    self.pos >= self.tokens.len()
  }
}
