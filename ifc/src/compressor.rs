use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::bit_writer::BitWriter;
use crate::container::{self, Metadata};
use crate::detect::{self, FileKind};
use crate::errors::IfcResult;
use crate::huffman_encoding::HuffmanCodec;
use crate::strategies::csv::CsvStrategy;
use crate::strategies::json::JsonStrategy;
use crate::strategies::log::LogStrategy;
use crate::strategies::text;
use crate::token::Token;

/// Compresses the file at `input` into an IFC1 container at `output`.
///
/// The strategy is chosen by file extension. On failure no partial output is
/// left behind: `output` is deleted.
pub fn compress(input: &Path, output: &Path) -> IfcResult<()> {
  let res = compress_inner(input, output);
  if res.is_err() {
    let _ = fs::remove_file(output);
  }
  res
}

fn compress_inner(input: &Path, output: &Path) -> IfcResult<()> {
  let kind = detect::detect(input)?;
  debug!(input = %input.display(), ?kind, "compressing");

  match kind {
    FileKind::Json => {
      let value = JsonStrategy::parse(input)?;
      let mut strategy = JsonStrategy::new();
      let tokens = strategy.tokenize(&value)?;
      let dict = strategy.key_dict();
      let dict_main = (!dict.is_empty()).then(|| dict.to_map());
      write_tokens(kind, &tokens, dict_main, None, output)
    }
    FileKind::Csv => {
      let rows = CsvStrategy::parse(input)?;
      let mut strategy = CsvStrategy::new();
      let tokens = strategy.tokenize(&rows)?;
      write_tokens(kind, &tokens, None, strategy.col_dicts(), output)
    }
    FileKind::Log => {
      let lines = LogStrategy::parse(input)?;
      let mut strategy = LogStrategy::new();
      let tokens = strategy.tokenize(&lines);
      write_tokens(kind, &tokens, None, None, output)
    }
    FileKind::Text => compress_text(input, output),
  }
}

// materialized-token path: the whole container is assembled in memory and
// written in one shot
fn write_tokens(
  kind: FileKind,
  tokens: &[Token],
  dict_main: Option<BTreeMap<String, String>>,
  dict_cols: Option<BTreeMap<String, BTreeMap<String, String>>>,
  output: &Path,
) -> IfcResult<()> {
  let codec = HuffmanCodec::train(tokens.iter().map(|t| t.key()));
  let metadata = Metadata {
    huffman_tree: codec.codebook(),
    token_count: Some(tokens.len() as u64),
    dict_main,
    dict_cols,
  };

  let mut writer = BitWriter::new(Vec::new());
  for token in tokens {
    codec.encode_key(&token.key(), &mut writer)?;
  }
  let payload = writer.finish()?;
  debug!(
    tokens = tokens.len(),
    payload_bytes = payload.len(),
    "encoded token stream"
  );

  container::write(output, kind.strategy_id(), &metadata, &payload)
}

// two-pass streaming path: pass 1 builds the codebook and token count, then
// the header goes out and pass 2 streams bits straight into the file
fn compress_text(input: &Path, output: &Path) -> IfcResult<()> {
  let mut counts: IndexMap<String, usize> = IndexMap::new();
  text::for_each_lexeme(input, |lexeme| {
    if let Some(count) = counts.get_mut(lexeme) {
      *count += 1;
    } else {
      counts.insert(lexeme.to_string(), 1);
    }
    Ok(())
  })?;
  let codec = HuffmanCodec::from_counts(counts);
  let metadata = Metadata {
    huffman_tree: codec.codebook(),
    token_count: Some(codec.token_count() as u64),
    dict_main: None,
    dict_cols: None,
  };
  debug!(tokens = codec.token_count(), "trained streaming codebook");

  let mut sink = BufWriter::new(File::create(output)?);
  container::write_header(&mut sink, FileKind::Text.strategy_id(), &metadata)?;

  let mut writer = BitWriter::new(sink);
  text::for_each_lexeme(input, |lexeme| codec.encode_key(lexeme, &mut writer))?;
  let mut sink = writer.finish()?;
  sink.flush()?;
  Ok(())
}
