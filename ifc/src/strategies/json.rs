use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::delta_encoding;
use crate::dictionary::DictionaryCodec;
use crate::errors::{IfcError, IfcResult};
use crate::token::{unexpected, Token, TokenCursor};

/// Structural JSON transform: object keys go through a dictionary,
/// monotonic integer arrays become delta runs, everything else becomes
/// literal tokens in document order.
#[derive(Default)]
pub struct JsonStrategy {
  keys: DictionaryCodec,
}

impl JsonStrategy {
  pub fn new() -> Self {
    JsonStrategy {
      keys: DictionaryCodec::new(),
    }
  }

  pub fn from_metadata(dict_main: &BTreeMap<String, String>) -> IfcResult<Self> {
    Ok(JsonStrategy {
      keys: DictionaryCodec::from_map(dict_main)?,
    })
  }

  pub fn parse(path: &Path) -> IfcResult<Value> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
      .map_err(|e| IfcError::invalid_argument(format!("input is not valid JSON: {}", e)))
  }

  pub fn key_dict(&self) -> &DictionaryCodec {
    &self.keys
  }

  pub fn tokenize(&mut self, value: &Value) -> IfcResult<Vec<Token>> {
    let mut tokens = Vec::new();
    self.traverse(value, &mut tokens)?;
    Ok(tokens)
  }

  fn traverse(&mut self, value: &Value, tokens: &mut Vec<Token>) -> IfcResult<()> {
    match value {
      Value::Object(obj) => {
        tokens.push(Token::ObjectBegin);
        for (key, val) in obj {
          tokens.push(Token::Key(self.keys.get_id(key)));
          self.traverse(val, tokens)?;
        }
        tokens.push(Token::ObjectEnd);
      }
      Value::Array(arr) => {
        tokens.push(Token::ArrayBegin);
        if let Some(run) = monotonic_ints(arr) {
          tokens.push(Token::DeltaRun);
          for delta in delta_encoding::encode(&run) {
            tokens.push(Token::Delta(delta));
          }
        } else {
          for item in arr {
            self.traverse(item, tokens)?;
          }
        }
        tokens.push(Token::ArrayEnd);
      }
      Value::String(s) => tokens.push(Token::Str(s.clone())),
      Value::Number(n) => {
        let x = n.as_i64().ok_or_else(|| {
          IfcError::invalid_argument(format!("number {} is not a supported integer", n))
        })?;
        tokens.push(Token::Int(x));
      }
      Value::Bool(b) => tokens.push(Token::Bool(*b)),
      Value::Null => tokens.push(Token::Null),
    }
    Ok(())
  }

  pub fn token_from_key(key: &str) -> IfcResult<Token> {
    let malformed =
      || IfcError::malformed_token_stream(format!("{} is not a JSON strategy token", key));

    match key {
      "{" => return Ok(Token::ObjectBegin),
      "}" => return Ok(Token::ObjectEnd),
      "[" => return Ok(Token::ArrayBegin),
      "]" => return Ok(Token::ArrayEnd),
      "NULL" => return Ok(Token::Null),
      "DELTA_INT_SEQ" => return Ok(Token::DeltaRun),
      _ => (),
    }
    if let Some(rest) = key.strip_prefix("S:") {
      Ok(Token::Str(rest.to_string()))
    } else if let Some(rest) = key.strip_prefix("I:") {
      Ok(Token::Int(rest.parse().map_err(|_| malformed())?))
    } else if let Some(rest) = key.strip_prefix("B:") {
      match rest {
        "True" => Ok(Token::Bool(true)),
        "False" => Ok(Token::Bool(false)),
        _ => Err(malformed()),
      }
    } else if let Some(rest) = key.strip_prefix('K') {
      Ok(Token::Key(rest.parse().map_err(|_| malformed())?))
    } else if let Some(rest) = key.strip_prefix('D') {
      Ok(Token::Delta(rest.parse().map_err(|_| malformed())?))
    } else {
      Err(malformed())
    }
  }

  pub fn reconstruct(&self, cursor: &mut TokenCursor) -> IfcResult<Value> {
    self.parse_value(cursor)
  }

  fn parse_value(&self, cursor: &mut TokenCursor) -> IfcResult<Value> {
    let token = cursor.advance();
    match token {
      Some(Token::ObjectBegin) => self.parse_object(cursor),
      Some(Token::ArrayBegin) => self.parse_array(cursor),
      Some(Token::Str(s)) => Ok(Value::String(s)),
      Some(Token::Int(x)) => Ok(Value::from(x)),
      Some(Token::Bool(b)) => Ok(Value::Bool(b)),
      Some(Token::Null) => Ok(Value::Null),
      other => Err(unexpected("expected a JSON value", other.as_ref())),
    }
  }

  fn parse_object(&self, cursor: &mut TokenCursor) -> IfcResult<Value> {
    let mut obj = Map::new();
    loop {
      match cursor.advance() {
        Some(Token::ObjectEnd) => return Ok(Value::Object(obj)),
        Some(Token::Key(id)) => {
          let key = self
            .keys
            .get_value(id)
            .ok_or_else(|| {
              IfcError::dictionary_miss(format!("object key id {} is not in the dictionary", id))
            })?
            .to_string();
          let value = self.parse_value(cursor)?;
          obj.insert(key, value);
        }
        other => return Err(unexpected("expected an object key or }", other.as_ref())),
      }
    }
  }

  fn parse_array(&self, cursor: &mut TokenCursor) -> IfcResult<Value> {
    if cursor.peek() == Some(&Token::DeltaRun) {
      cursor.advance();
      let mut deltas = Vec::new();
      loop {
        match cursor.advance() {
          Some(Token::ArrayEnd) => break,
          Some(Token::Delta(d)) => deltas.push(d),
          other => return Err(unexpected("expected a delta value or ]", other.as_ref())),
        }
      }
      let values = delta_encoding::decode(&deltas);
      return Ok(Value::Array(values.into_iter().map(Value::from).collect()));
    }

    let mut arr = Vec::new();
    loop {
      if cursor.peek() == Some(&Token::ArrayEnd) {
        cursor.advance();
        return Ok(Value::Array(arr));
      }
      if cursor.peek().is_none() {
        return Err(unexpected("expected an array element or ]", None));
      }
      arr.push(self.parse_value(cursor)?);
    }
  }
}

// Some(values) iff the array is a strictly increasing integer run of at
// least 3 elements.
fn monotonic_ints(arr: &[Value]) -> Option<Vec<i64>> {
  if arr.len() < 3 {
    return None;
  }
  let mut values = Vec::with_capacity(arr.len());
  for item in arr {
    values.push(item.as_i64()?);
  }
  if values.windows(2).all(|w| w[0] < w[1]) {
    Some(values)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::JsonStrategy;
  use crate::errors::{ErrorKind, IfcResult};
  use crate::token::{Token, TokenCursor};

  fn keys_of(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(|t| t.key()).collect()
  }

  fn round_trip(value: serde_json::Value) -> IfcResult<serde_json::Value> {
    let mut strategy = JsonStrategy::new();
    let tokens = strategy.tokenize(&value)?;
    let mut cursor = TokenCursor::new(tokens);
    strategy.reconstruct(&mut cursor)
  }

  #[test]
  fn test_monotonic_array_tokens() -> IfcResult<()> {
    let value = json!([100, 101, 102, 103]);
    let mut strategy = JsonStrategy::new();
    let tokens = strategy.tokenize(&value)?;
    assert_eq!(
      keys_of(&tokens),
      vec!["[", "DELTA_INT_SEQ", "D100", "D1", "D1", "D1", "]"]
    );
    let mut cursor = TokenCursor::new(tokens);
    assert_eq!(strategy.reconstruct(&mut cursor)?, value);
    Ok(())
  }

  #[test]
  fn test_short_or_unsorted_arrays_stay_literal() -> IfcResult<()> {
    let mut strategy = JsonStrategy::new();
    let tokens = strategy.tokenize(&json!([1, 2]))?;
    assert_eq!(keys_of(&tokens), vec!["[", "I:1", "I:2", "]"]);

    let tokens = strategy.tokenize(&json!([3, 2, 1]))?;
    assert_eq!(keys_of(&tokens), vec!["[", "I:3", "I:2", "I:1", "]"]);
    Ok(())
  }

  #[test]
  fn test_object_tokens_and_dictionary() -> IfcResult<()> {
    let value = json!({"name": "Alice", "role": "admin"});
    let mut strategy = JsonStrategy::new();
    let tokens = strategy.tokenize(&value)?;
    assert_eq!(
      keys_of(&tokens),
      vec!["{", "K1", "S:Alice", "K2", "S:admin", "}"]
    );

    let dict = strategy.key_dict().to_map();
    assert_eq!(dict.get("1").map(|s| s.as_str()), Some("name"));
    assert_eq!(dict.get("2").map(|s| s.as_str()), Some("role"));

    let mut cursor = TokenCursor::new(tokens);
    assert_eq!(strategy.reconstruct(&mut cursor)?, value);
    Ok(())
  }

  #[test]
  fn test_nested_round_trip() -> IfcResult<()> {
    let value = json!({
      "id": 7,
      "tags": ["a", "b"],
      "flags": {"active": true, "deleted": false},
      "parent": null,
      "range": [10, 20, 30, 40],
    });
    assert_eq!(round_trip(value.clone())?, value);
    Ok(())
  }

  #[test]
  fn test_rejects_floats() {
    let mut strategy = JsonStrategy::new();
    let err = strategy.tokenize(&serde_json::json!(1.5)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
  }

  #[test]
  fn test_dictionary_miss() {
    let strategy = JsonStrategy::new();
    let mut cursor = TokenCursor::new(vec![
      Token::ObjectBegin,
      Token::Key(5),
      Token::Null,
      Token::ObjectEnd,
    ]);
    let err = strategy.reconstruct(&mut cursor).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DictionaryMiss);
  }

  #[test]
  fn test_malformed_stream() {
    let strategy = JsonStrategy::new();
    let mut cursor = TokenCursor::new(vec![Token::ObjectBegin, Token::Str("x".to_string())]);
    let err = strategy.reconstruct(&mut cursor).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedTokenStream);
  }

  #[test]
  fn test_token_from_key() -> IfcResult<()> {
    assert_eq!(JsonStrategy::token_from_key("K12")?, Token::Key(12));
    assert_eq!(JsonStrategy::token_from_key("D-3")?, Token::Delta(-3));
    assert_eq!(
      JsonStrategy::token_from_key("S:a:b")?,
      Token::Str("a:b".to_string())
    );
    assert_eq!(
      JsonStrategy::token_from_key("DELTA_INT_SEQ")?,
      Token::DeltaRun
    );
    assert!(JsonStrategy::token_from_key("garbage").is_err());
    Ok(())
  }
}
