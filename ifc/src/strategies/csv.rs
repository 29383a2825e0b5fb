use std::collections::BTreeMap;
use std::path::Path;

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::delta_encoding;
use crate::dictionary::DictionaryCodec;
use crate::errors::{IfcError, IfcResult};
use crate::token::{unexpected, Token, TokenCursor};

/// Columnar CSV transform: the table is transposed, then each column is
/// classified as integers (delta run) or strings (per-column dictionary).
#[derive(Default)]
pub struct CsvStrategy {
  cols: BTreeMap<usize, DictionaryCodec>,
}

impl CsvStrategy {
  pub fn new() -> Self {
    CsvStrategy {
      cols: BTreeMap::new(),
    }
  }

  pub fn from_metadata(
    dict_cols: &BTreeMap<String, BTreeMap<String, String>>,
  ) -> IfcResult<Self> {
    let mut cols = BTreeMap::new();
    for (idx_str, data) in dict_cols {
      let idx = idx_str.parse::<usize>().map_err(|_| {
        IfcError::invalid_container(format!("column index {} is not an integer", idx_str))
      })?;
      cols.insert(idx, DictionaryCodec::from_map(data)?);
    }
    Ok(CsvStrategy {
      cols,
    })
  }

  /// Reads all rows; the first row is the header row. Quoted fields are
  /// handled by the CSV parser.
  pub fn parse(path: &Path) -> IfcResult<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .from_path(path)
      .map_err(|e| IfcError::invalid_argument(format!("cannot read CSV: {}", e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
      let record =
        record.map_err(|e| IfcError::invalid_argument(format!("cannot read CSV: {}", e)))?;
      rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
  }

  pub fn col_dicts(&self) -> Option<BTreeMap<String, BTreeMap<String, String>>> {
    if self.cols.is_empty() {
      return None;
    }
    Some(
      self
        .cols
        .iter()
        .map(|(idx, dict)| (idx.to_string(), dict.to_map()))
        .collect(),
    )
  }

  pub fn tokenize(&mut self, rows: &[Vec<String>]) -> IfcResult<Vec<Token>> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }

    let headers = &rows[0];
    let data_rows = &rows[1..];
    for (r, row) in data_rows.iter().enumerate() {
      if row.len() != headers.len() {
        return Err(IfcError::column_length_mismatch(format!(
          "row {} has {} fields but the header has {}",
          r + 2,
          row.len(),
          headers.len(),
        )));
      }
    }

    let mut tokens = vec![Token::Headers];
    for header in headers {
      tokens.push(Token::Literal(header.clone()));
    }
    tokens.push(Token::Data);

    for i in 0..headers.len() {
      let column: Vec<&str> = data_rows.iter().map(|row| row[i].as_str()).collect();
      match parse_int_column(&column) {
        Some(ints) => {
          tokens.push(Token::IntColumn(i));
          for delta in delta_encoding::encode(&ints) {
            tokens.push(Token::Delta(delta));
          }
        }
        None => {
          tokens.push(Token::StrColumn(i));
          let dict = self.cols.entry(i).or_default();
          for value in &column {
            tokens.push(Token::Key(dict.get_id(value)));
          }
        }
      }
      tokens.push(Token::EndColumn);
    }
    Ok(tokens)
  }

  /// Keys with no marker or reference prefix are header literals.
  pub fn token_from_key(key: &str) -> Token {
    match key {
      "HEADERS" => return Token::Headers,
      "DATA" => return Token::Data,
      "END_COL" => return Token::EndColumn,
      _ => (),
    }
    if let Some(rest) = key.strip_prefix("COL_INT_") {
      if let Ok(idx) = rest.parse() {
        return Token::IntColumn(idx);
      }
    }
    if let Some(rest) = key.strip_prefix("COL_STR_") {
      if let Ok(idx) = rest.parse() {
        return Token::StrColumn(idx);
      }
    }
    if let Some(rest) = key.strip_prefix('K') {
      if let Ok(id) = rest.parse() {
        return Token::Key(id);
      }
    }
    if let Some(rest) = key.strip_prefix('D') {
      if let Ok(delta) = rest.parse() {
        return Token::Delta(delta);
      }
    }
    Token::Literal(key.to_string())
  }

  pub fn reconstruct(&self, cursor: &mut TokenCursor) -> IfcResult<String> {
    if cursor.is_empty() {
      // an empty input tokenizes to nothing
      return Ok(String::new());
    }

    match cursor.advance() {
      Some(Token::Headers) => (),
      other => return Err(unexpected("expected HEADERS", other.as_ref())),
    }
    let mut headers = Vec::new();
    loop {
      match cursor.advance() {
        Some(Token::Data) => break,
        Some(token) => headers.push(token.key()),
        None => return Err(unexpected("expected DATA", None)),
      }
    }

    let mut columns: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    loop {
      let idx = match cursor.peek() {
        Some(&Token::IntColumn(idx)) | Some(&Token::StrColumn(idx)) => idx,
        _ => break,
      };
      let marker = cursor.advance();
      let column = match marker {
        Some(Token::IntColumn(_)) => {
          let mut deltas = Vec::new();
          loop {
            match cursor.advance() {
              Some(Token::EndColumn) => break,
              Some(Token::Delta(d)) => deltas.push(d),
              other => return Err(unexpected("expected a delta value or END_COL", other.as_ref())),
            }
          }
          delta_encoding::decode(&deltas)
            .into_iter()
            .map(|x| x.to_string())
            .collect()
        }
        _ => {
          let dict = self.cols.get(&idx).ok_or_else(|| {
            IfcError::dictionary_miss(format!("no dictionary for column {}", idx))
          })?;
          let mut values = Vec::new();
          loop {
            match cursor.advance() {
              Some(Token::EndColumn) => break,
              Some(Token::Key(id)) => {
                let value = dict.get_value(id).ok_or_else(|| {
                  IfcError::dictionary_miss(format!(
                    "id {} is not in the dictionary for column {}",
                    id, idx,
                  ))
                })?;
                values.push(value.to_string());
              }
              other => return Err(unexpected("expected a value id or END_COL", other.as_ref())),
            }
          }
          values
        }
      };
      columns.insert(idx, column);
    }

    let n_rows = columns.get(&0).map(|col| col.len()).unwrap_or(0);
    for i in 0..headers.len() {
      match columns.get(&i) {
        None => {
          return Err(IfcError::malformed_token_stream(format!(
            "no column markers for column {}",
            i
          )))
        }
        Some(col) if col.len() != n_rows => {
          return Err(IfcError::column_length_mismatch(format!(
            "column {} has {} rows but column 0 has {}",
            i,
            col.len(),
            n_rows,
          )))
        }
        Some(_) => (),
      }
    }

    emit_rows(&headers, &columns, n_rows)
  }
}

// integer column iff every field parses; empty columns count as integers
fn parse_int_column(column: &[&str]) -> Option<Vec<i64>> {
  column.iter().map(|field| field.parse().ok()).collect()
}

fn emit_rows(
  headers: &[String],
  columns: &BTreeMap<usize, Vec<String>>,
  n_rows: usize,
) -> IfcResult<String> {
  let mut writer = WriterBuilder::new()
    .terminator(Terminator::Any(b'\n'))
    .from_writer(Vec::new());
  writer
    .write_record(headers)
    .map_err(|e| IfcError::invalid_argument(format!("cannot write CSV: {}", e)))?;
  for r in 0..n_rows {
    let row: Vec<&str> = (0..headers.len())
      .map(|i| columns[&i][r].as_str())
      .collect();
    writer
      .write_record(&row)
      .map_err(|e| IfcError::invalid_argument(format!("cannot write CSV: {}", e)))?;
  }
  let bytes = writer
    .into_inner()
    .map_err(|e| IfcError::invalid_argument(format!("cannot write CSV: {}", e)))?;
  String::from_utf8(bytes)
    .map_err(|e| IfcError::invalid_argument(format!("cannot write CSV: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::CsvStrategy;
  use crate::errors::{ErrorKind, IfcResult};
  use crate::token::{Token, TokenCursor};

  fn rows(table: &[&[&str]]) -> Vec<Vec<String>> {
    table
      .iter()
      .map(|row| row.iter().map(|s| s.to_string()).collect())
      .collect()
  }

  #[test]
  fn test_mixed_column_tokens() -> IfcResult<()> {
    let table = rows(&[&["id", "cat"], &["10", "A"], &["11", "B"], &["12", "A"]]);
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&table)?;
    let keys: Vec<String> = tokens.iter().map(|t| t.key()).collect();
    assert_eq!(
      keys,
      vec![
        "HEADERS", "id", "cat", "DATA", "COL_INT_0", "D10", "D1", "D1", "END_COL", "COL_STR_1",
        "K1", "K2", "K1", "END_COL",
      ]
    );

    let dicts = strategy.col_dicts().unwrap();
    let col1 = dicts.get("1").unwrap();
    assert_eq!(col1.get("1").map(|s| s.as_str()), Some("A"));
    assert_eq!(col1.get("2").map(|s| s.as_str()), Some("B"));

    let mut cursor = TokenCursor::new(tokens);
    let restored = strategy.reconstruct(&mut cursor)?;
    assert_eq!(restored, "id,cat\n10,A\n11,B\n12,A\n");
    Ok(())
  }

  #[test]
  fn test_negative_and_unsorted_ints_still_delta() -> IfcResult<()> {
    let table = rows(&[&["x"], &["5"], &["-3"], &["10"]]);
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&table)?;
    let keys: Vec<String> = tokens.iter().map(|t| t.key()).collect();
    assert_eq!(
      keys,
      vec!["HEADERS", "x", "DATA", "COL_INT_0", "D5", "D-8", "D13", "END_COL"]
    );
    Ok(())
  }

  #[test]
  fn test_quoting_round_trip() -> IfcResult<()> {
    let table = rows(&[
      &["name", "note"],
      &["a,b", "plain"],
      &["q\"q", "multi\nline"],
    ]);
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&table)?;
    let mut cursor = TokenCursor::new(tokens);
    let restored = strategy.reconstruct(&mut cursor)?;
    assert_eq!(
      restored,
      "name,note\n\"a,b\",plain\n\"q\"\"q\",\"multi\nline\"\n"
    );
    Ok(())
  }

  #[test]
  fn test_empty_input() -> IfcResult<()> {
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&[])?;
    assert!(tokens.is_empty());
    let mut cursor = TokenCursor::new(tokens);
    assert_eq!(strategy.reconstruct(&mut cursor)?, "");
    Ok(())
  }

  #[test]
  fn test_headers_only() -> IfcResult<()> {
    let table = rows(&[&["a", "b"]]);
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&table)?;
    let mut cursor = TokenCursor::new(tokens);
    assert_eq!(strategy.reconstruct(&mut cursor)?, "a,b\n");
    Ok(())
  }

  #[test]
  fn test_ragged_rows_rejected() {
    let table = rows(&[&["a", "b"], &["1"]]);
    let mut strategy = CsvStrategy::new();
    let err = strategy.tokenize(&table).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ColumnLengthMismatch);
  }

  #[test]
  fn test_reused_ids_and_metadata_restore() -> IfcResult<()> {
    let table = rows(&[&["cat"], &["A"], &["B"], &["A"]]);
    let mut strategy = CsvStrategy::new();
    let tokens = strategy.tokenize(&table)?;

    let restored_strategy = CsvStrategy::from_metadata(&strategy.col_dicts().unwrap())?;
    let mut cursor = TokenCursor::new(tokens);
    assert_eq!(restored_strategy.reconstruct(&mut cursor)?, "cat\nA\nB\nA\n");
    Ok(())
  }

  #[test]
  fn test_token_from_key_fallback() {
    assert_eq!(CsvStrategy::token_from_key("COL_INT_2"), Token::IntColumn(2));
    assert_eq!(CsvStrategy::token_from_key("K9"), Token::Key(9));
    assert_eq!(
      CsvStrategy::token_from_key("city"),
      Token::Literal("city".to_string())
    );
    // a bare K or COL marker with no number is just a header literal
    assert_eq!(
      CsvStrategy::token_from_key("Kind"),
      Token::Literal("Kind".to_string())
    );
  }
}
