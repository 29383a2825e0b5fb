//! The IFC1 on-disk container.
//!
//! ```text
//! offset  size      field
//! 0       4         MAGIC = "IFC1"
//! 4       1         VERSION = 1
//! 5       1         STRATEGY_ID (1=JSON, 2=CSV, 3=LOG, 4=TEXT)
//! 6       4         META_LEN (u32, big-endian)
//! 10      META_LEN  META (UTF-8 JSON object)
//! 10+ML   ..        PAYLOAD (bit-packed Huffman output)
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{IfcError, IfcResult};

pub const MAGIC: [u8; 4] = *b"IFC1";
pub const VERSION: u8 = 1;

const HEADER_SIZE: usize = 10;

/// The JSON sidecar persisted between header and payload.
///
/// `huffman_tree` maps each bit-string code to its token key and is always
/// present. `token_count` bounds decoding so padding bits never decode into
/// phantom tokens; it is required for streamed payloads and written for all
/// payloads here. The dictionaries are strategy-specific.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  pub huffman_tree: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token_count: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dict_main: Option<BTreeMap<String, String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dict_cols: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

/// A fully read container.
#[derive(Debug)]
pub struct Container {
  pub strategy_id: u8,
  pub metadata: Metadata,
  pub meta_len: usize,
  pub payload: Vec<u8>,
}

/// Writes the fixed header and metadata sidecar to `sink`, leaving it
/// positioned for the payload. Used directly by the streaming path.
pub fn write_header<W: Write>(sink: &mut W, strategy_id: u8, metadata: &Metadata) -> IfcResult<()> {
  let meta_bytes = serde_json::to_vec(metadata)
    .map_err(|e| IfcError::invalid_argument(format!("cannot serialize metadata: {}", e)))?;
  if meta_bytes.len() > u32::MAX as usize {
    return Err(IfcError::invalid_argument(format!(
      "metadata of {} bytes exceeds the container limit",
      meta_bytes.len()
    )));
  }

  sink.write_all(&MAGIC)?;
  sink.write_all(&[VERSION, strategy_id])?;
  sink.write_all(&(meta_bytes.len() as u32).to_be_bytes())?;
  sink.write_all(&meta_bytes)?;
  Ok(())
}

/// Writes a complete container in one shot.
pub fn write(path: &Path, strategy_id: u8, metadata: &Metadata, payload: &[u8]) -> IfcResult<()> {
  let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
  write_header(&mut bytes, strategy_id, metadata)?;
  bytes.extend_from_slice(payload);
  fs::write(path, bytes)?;
  Ok(())
}

/// Reads and validates a container from `path`.
pub fn read(path: &Path) -> IfcResult<Container> {
  let bytes = fs::read(path)?;
  from_bytes(&bytes)
}

pub fn from_bytes(bytes: &[u8]) -> IfcResult<Container> {
  if bytes.len() < HEADER_SIZE {
    return Err(IfcError::invalid_container(format!(
      "file of {} bytes is shorter than the container header",
      bytes.len()
    )));
  }
  if bytes[0..4] != MAGIC {
    return Err(IfcError::invalid_container("magic bytes are not IFC1"));
  }
  let version = bytes[4];
  if version != VERSION {
    return Err(IfcError::unsupported_version(format!(
      "container version {} is not supported (expected {})",
      version, VERSION,
    )));
  }

  let strategy_id = bytes[5];
  let meta_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
  if bytes.len() < HEADER_SIZE + meta_len {
    return Err(IfcError::invalid_container(format!(
      "metadata of {} bytes is truncated",
      meta_len
    )));
  }

  let metadata: Metadata = serde_json::from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + meta_len])
    .map_err(|e| IfcError::invalid_container(format!("metadata is not valid JSON: {}", e)))?;
  let payload = bytes[HEADER_SIZE + meta_len..].to_vec();

  Ok(Container {
    strategy_id,
    metadata,
    meta_len,
    payload,
  })
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;
  use crate::errors::ErrorKind;

  fn sample_metadata() -> Metadata {
    let mut huffman_tree = BTreeMap::new();
    huffman_tree.insert("0".to_string(), "a".to_string());
    Metadata {
      huffman_tree,
      token_count: Some(3),
      dict_main: None,
      dict_cols: None,
    }
  }

  #[test]
  fn test_round_trip() -> IfcResult<()> {
    let metadata = sample_metadata();
    let mut bytes = Vec::new();
    write_header(&mut bytes, 4, &metadata)?;
    bytes.push(0x00);

    let container = from_bytes(&bytes)?;
    assert_eq!(container.strategy_id, 4);
    assert_eq!(container.metadata, metadata);
    assert_eq!(container.payload, vec![0x00]);
    assert_eq!(container.meta_len, bytes.len() - 10 - 1);
    Ok(())
  }

  #[test]
  fn test_rejects_bad_magic() {
    let err = from_bytes(b"XXXX\x01\x04\x00\x00\x00\x02{}").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidContainer);
  }

  #[test]
  fn test_rejects_bad_version() {
    let err = from_bytes(b"IFC1\x02\x04\x00\x00\x00\x02{}").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedVersion);
  }

  #[test]
  fn test_rejects_truncation() {
    assert_eq!(
      from_bytes(b"IFC1").unwrap_err().kind,
      ErrorKind::InvalidContainer
    );
    // meta_len runs past the end of the file
    assert_eq!(
      from_bytes(b"IFC1\x01\x01\x00\x00\x00\xff{}").unwrap_err().kind,
      ErrorKind::InvalidContainer
    );
  }

  #[test]
  fn test_optional_keys_omitted() -> IfcResult<()> {
    let metadata = Metadata {
      huffman_tree: BTreeMap::new(),
      token_count: None,
      dict_main: None,
      dict_cols: None,
    };
    let json = serde_json::to_string(&metadata)
      .map_err(|e| IfcError::invalid_argument(e.to_string()))?;
    assert_eq!(json, r#"{"huffman_tree":{}}"#);
    Ok(())
  }
}
