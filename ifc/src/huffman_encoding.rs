use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BinaryHeap;
use std::io::Write;

use indexmap::IndexMap;

use crate::bit_writer::BitWriter;
use crate::bits;
use crate::errors::{IfcError, IfcResult};

#[derive(Clone, PartialEq, Eq, Debug)]
struct HuffmanItem {
  id: usize,
  weight: usize,
  left_id: Option<usize>,
  right_id: Option<usize>,
  leaf_id: Option<usize>,
  bits: Vec<bool>,
}

impl HuffmanItem {
  fn new(weight: usize, id: usize) -> HuffmanItem {
    HuffmanItem {
      id,
      weight,
      left_id: None,
      right_id: None,
      leaf_id: Some(id),
      bits: Vec::new(),
    }
  }

  fn new_parent_of(tree0: &HuffmanItem, tree1: &HuffmanItem, id: usize) -> HuffmanItem {
    HuffmanItem {
      id,
      weight: tree0.weight + tree1.weight,
      left_id: Some(tree0.id),
      right_id: Some(tree1.id),
      leaf_id: None,
      bits: Vec::new(),
    }
  }

  fn create_bits(&self, item_idx: &mut [HuffmanItem], leaf_codes: &mut [Vec<bool>]) {
    self.create_bits_from(Vec::new(), item_idx, leaf_codes);
  }

  fn create_bits_from(
    &self,
    bits: Vec<bool>,
    item_idx: &mut [HuffmanItem],
    leaf_codes: &mut [Vec<bool>],
  ) {
    item_idx[self.id].bits = bits.clone();
    if let Some(leaf_id) = self.leaf_id {
      leaf_codes[leaf_id] = bits;
    } else {
      let mut left_bits = bits.clone();
      left_bits.push(false);
      let mut right_bits = bits;
      right_bits.push(true);
      item_idx[self.left_id.unwrap()]
        .clone()
        .create_bits_from(left_bits, item_idx, leaf_codes);
      item_idx[self.right_id.unwrap()]
        .clone()
        .create_bits_from(right_bits, item_idx, leaf_codes);
    }
  }
}

impl Ord for HuffmanItem {
  fn cmp(&self, other: &Self) -> Ordering {
    other.weight.cmp(&self.weight) // flipped order to make it a min heap
  }
}

impl PartialOrd for HuffmanItem {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

/// Assigns prefix-free codes to token keys based on their frequencies.
///
/// Tie breaks among equal weights follow heap order: deterministic for a
/// given run, but not specified across implementations. The persisted
/// codebook is what makes decoding unambiguous.
pub struct HuffmanCodec {
  codes: IndexMap<String, Vec<bool>>,
  n_tokens: usize,
}

impl HuffmanCodec {
  /// Counts key frequencies in first-appearance order and builds the code.
  pub fn train<I>(keys: I) -> HuffmanCodec
  where
    I: IntoIterator<Item = String>,
  {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for key in keys {
      *counts.entry(key).or_insert(0) += 1;
    }
    Self::from_counts(counts)
  }

  pub fn from_counts(counts: IndexMap<String, usize>) -> HuffmanCodec {
    let n_tokens = counts.values().sum();
    let n_leaves = counts.len();
    let mut codes = IndexMap::with_capacity(n_leaves);

    if n_leaves == 0 {
      return HuffmanCodec {
        codes,
        n_tokens,
      };
    }
    if n_leaves == 1 {
      // a degenerate tree still needs a nonempty code
      for (key, _) in counts {
        codes.insert(key, vec![false]);
      }
      return HuffmanCodec {
        codes,
        n_tokens,
      };
    }

    let mut heap = BinaryHeap::with_capacity(n_leaves);
    let mut items = Vec::with_capacity(2 * n_leaves);
    let mut keys = Vec::with_capacity(n_leaves);
    for (i, (key, weight)) in counts.into_iter().enumerate() {
      let item = HuffmanItem::new(weight, i);
      heap.push(item.clone());
      items.push(item);
      keys.push(key);
    }

    let mut id = n_leaves;
    for _ in 0..(n_leaves - 1) {
      let small0 = heap.pop().unwrap();
      let small1 = heap.pop().unwrap();
      let new_item = HuffmanItem::new_parent_of(&small0, &small1, id);
      id += 1;
      heap.push(new_item.clone());
      items.push(new_item);
    }

    let head_node = heap.pop().unwrap();
    let mut leaf_codes = vec![Vec::new(); n_leaves];
    head_node.create_bits(&mut items, &mut leaf_codes);

    for (key, code) in keys.into_iter().zip(leaf_codes) {
      codes.insert(key, code);
    }
    HuffmanCodec {
      codes,
      n_tokens,
    }
  }

  /// The number of tokens seen while training.
  pub fn token_count(&self) -> usize {
    self.n_tokens
  }

  /// Pushes the code for `key` to the writer. Keys not seen during training
  /// are an error: the streaming path relies on both passes emitting the
  /// same key multiset.
  pub fn encode_key<W: Write>(&self, key: &str, writer: &mut BitWriter<W>) -> IfcResult<()> {
    let code = self
      .codes
      .get(key)
      .ok_or_else(|| IfcError::unknown_token(format!("token {} is absent from the codebook", key)))?;
    writer.write(code)
  }

  /// The reverse map persisted in container metadata: bit string to key.
  pub fn codebook(&self) -> BTreeMap<String, String> {
    self
      .codes
      .iter()
      .map(|(key, code)| (bits::bits_to_string(code), key.clone()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::HuffmanCodec;
  use crate::bit_writer::BitWriter;
  use crate::errors::{ErrorKind, IfcResult};

  fn codec_of(keys: &[&str]) -> HuffmanCodec {
    HuffmanCodec::train(keys.iter().map(|k| k.to_string()))
  }

  #[test]
  fn test_code_lengths_follow_weights() {
    let codec = codec_of(&["a", "a", "a", "a", "b", "b", "c"]);
    let codebook = codec.codebook();
    assert_eq!(codebook.len(), 3);
    let len_of = |key: &str| {
      codebook
        .iter()
        .find(|(_, k)| k.as_str() == key)
        .map(|(code, _)| code.len())
        .unwrap()
    };
    assert!(len_of("a") <= len_of("b"));
    assert!(len_of("b") <= len_of("c"));
    assert_eq!(codec.token_count(), 7);
  }

  #[test]
  fn test_degenerate_single_symbol() -> IfcResult<()> {
    let codec = codec_of(&["a", "a", "a"]);
    let codebook = codec.codebook();
    assert_eq!(codebook.len(), 1);
    assert_eq!(codebook.get("0").map(|s| s.as_str()), Some("a"));

    // three bits 000, padded to one zero byte
    let mut writer = BitWriter::new(Vec::new());
    for _ in 0..3 {
      codec.encode_key("a", &mut writer)?;
    }
    assert_eq!(writer.finish()?, vec![0x00]);
    Ok(())
  }

  #[test]
  fn test_empty() {
    let codec = codec_of(&[]);
    assert!(codec.codebook().is_empty());
    assert_eq!(codec.token_count(), 0);
  }

  #[test]
  fn test_unknown_token() {
    let codec = codec_of(&["a", "b"]);
    let mut writer = BitWriter::new(Vec::new());
    let err = codec.encode_key("c", &mut writer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownToken);
  }
}
