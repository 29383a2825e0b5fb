use std::fs;
use std::path::Path;

use tracing::debug;

use crate::bit_reader::BitReader;
use crate::container;
use crate::detect::FileKind;
use crate::errors::{IfcError, IfcResult};
use crate::huffman_decoding;
use crate::strategies::csv::CsvStrategy;
use crate::strategies::json::JsonStrategy;
use crate::strategies::log::LogStrategy;
use crate::strategies::text;
use crate::token::TokenCursor;

/// Decompresses the IFC1 container at `input`, writing the restored file to
/// `output`.
///
/// JSON is re-serialized pretty-printed with 2-space indent, CSV with `\n`
/// line terminators, logs newline-joined with normalized whitespace, and
/// text byte-for-byte. On failure no partial output is left behind.
pub fn decompress(input: &Path, output: &Path) -> IfcResult<()> {
  let res = decompress_inner(input, output);
  if res.is_err() {
    let _ = fs::remove_file(output);
  }
  res
}

fn decompress_inner(input: &Path, output: &Path) -> IfcResult<()> {
  let container = container::read(input)?;
  let kind = FileKind::from_strategy_id(container.strategy_id)?;
  debug!(input = %input.display(), ?kind, "decompressing");

  let mut reader = BitReader::new(&container.payload);
  let limit = container.metadata.token_count.map(|c| c as usize);
  let keys = huffman_decoding::decode(&mut reader, &container.metadata.huffman_tree, limit)?;
  debug!(tokens = keys.len(), "decoded token stream");

  let restored = match kind {
    FileKind::Json => {
      let strategy = match &container.metadata.dict_main {
        Some(dict_main) => JsonStrategy::from_metadata(dict_main)?,
        None => JsonStrategy::new(),
      };
      let tokens = keys
        .iter()
        .map(|key| JsonStrategy::token_from_key(key))
        .collect::<IfcResult<Vec<_>>>()?;
      let value = strategy.reconstruct(&mut TokenCursor::new(tokens))?;
      serde_json::to_string_pretty(&value)
        .map_err(|e| IfcError::invalid_argument(format!("cannot serialize JSON: {}", e)))?
    }
    FileKind::Csv => {
      let strategy = match &container.metadata.dict_cols {
        Some(dict_cols) => CsvStrategy::from_metadata(dict_cols)?,
        None => CsvStrategy::new(),
      };
      let tokens = keys
        .iter()
        .map(|key| CsvStrategy::token_from_key(key))
        .collect();
      strategy.reconstruct(&mut TokenCursor::new(tokens))?
    }
    FileKind::Log => {
      let strategy = LogStrategy::new();
      let tokens = keys
        .iter()
        .map(|key| LogStrategy::token_from_key(key))
        .collect::<IfcResult<Vec<_>>>()?;
      strategy.reconstruct(&mut TokenCursor::new(tokens))?
    }
    FileKind::Text => text::reconstruct(&keys),
  };

  fs::write(output, restored)?;
  Ok(())
}
