use std::collections::BTreeMap;

use crate::bit_reader::BitReader;
use crate::errors::{ErrorKind, IfcError, IfcResult};

/// Reads token keys back out of a bit stream using the persisted codebook
/// (bit string mapped to key).
///
/// Because the codes are prefix-free, extending a running code bit by bit
/// and emitting on the first match is correct. Decoding stops after `limit`
/// tokens when one is given; without a limit it stops when the payload runs
/// out, which may include tokens decoded from padding bits.
pub fn decode(
  reader: &mut BitReader,
  codebook: &BTreeMap<String, String>,
  limit: Option<usize>,
) -> IfcResult<Vec<String>> {
  let max_code_len = codebook.keys().map(|code| code.len()).max().unwrap_or(0);
  let mut decoded = Vec::new();
  let mut current = String::new();

  loop {
    if let Some(limit) = limit {
      if decoded.len() >= limit {
        break;
      }
    }

    let bit = match reader.read_one() {
      Ok(bit) => bit,
      Err(e) if e.kind == ErrorKind::EndOfStream => {
        if limit.is_some() {
          return Err(IfcError::malformed_token_stream(format!(
            "payload ended after {} of {} tokens",
            decoded.len(),
            limit.unwrap(),
          )));
        }
        break;
      }
      Err(e) => return Err(e),
    };

    current.push(if bit { '1' } else { '0' });
    if let Some(key) = codebook.get(&current) {
      decoded.push(key.clone());
      current.clear();
    } else if current.len() > max_code_len {
      return Err(IfcError::malformed_token_stream(format!(
        "no codebook entry matches bit sequence {} at bit idx {}",
        current,
        reader.bit_idx(),
      )));
    }
  }

  Ok(decoded)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::decode;
  use crate::bit_reader::BitReader;
  use crate::bit_writer::BitWriter;
  use crate::errors::{ErrorKind, IfcResult};
  use crate::huffman_encoding::HuffmanCodec;

  fn recovered(keys: &[&str], limit: Option<usize>) -> IfcResult<Vec<String>> {
    let codec = HuffmanCodec::train(keys.iter().map(|k| k.to_string()));
    let mut writer = BitWriter::new(Vec::new());
    for key in keys {
      codec.encode_key(key, &mut writer)?;
    }
    let bytes = writer.finish()?;
    let mut reader = BitReader::new(&bytes);
    decode(&mut reader, &codec.codebook(), limit)
  }

  #[test]
  fn test_recovers_with_limit() -> IfcResult<()> {
    let keys = vec!["a", "b", "a", "c", "a", "a", "b"];
    let decoded = recovered(&keys, Some(keys.len()))?;
    assert_eq!(decoded, keys);
    Ok(())
  }

  #[test]
  fn test_degenerate_with_limit() -> IfcResult<()> {
    // payload is a single zero byte; the limit keeps padding bits from
    // decoding into phantom tokens
    let decoded = recovered(&["a", "a", "a"], Some(3))?;
    assert_eq!(decoded, vec!["a", "a", "a"]);
    Ok(())
  }

  #[test]
  fn test_truncated_payload() {
    let mut codebook = BTreeMap::new();
    codebook.insert("00".to_string(), "x".to_string());
    codebook.insert("01".to_string(), "y".to_string());
    codebook.insert("1".to_string(), "z".to_string());
    let bytes = vec![0b00011000];
    let mut reader = BitReader::new(&bytes);
    let err = decode(&mut reader, &codebook, Some(100)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedTokenStream);
  }

  #[test]
  fn test_garbage_bits() {
    let mut codebook = BTreeMap::new();
    codebook.insert("00".to_string(), "x".to_string());
    let bytes = vec![0b11111111];
    let mut reader = BitReader::new(&bytes);
    let err = decode(&mut reader, &codebook, Some(1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedTokenStream);
  }

  #[test]
  fn test_empty_payload() -> IfcResult<()> {
    let codebook = BTreeMap::new();
    let bytes = Vec::new();
    let mut reader = BitReader::new(&bytes);
    assert_eq!(decode(&mut reader, &codebook, Some(0))?, Vec::<String>::new());
    Ok(())
  }
}
