use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::errors::{IfcError, IfcResult};

/// Ordered bijection between string values and small integer ids.
///
/// Ids start at 1 and increase with first-insertion order. The codec is
/// mutated only while tokenizing; at encode time it is frozen into the
/// metadata sidecar via [`to_map`][DictionaryCodec::to_map].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryCodec {
  forward: IndexMap<String, u64>,
  reverse: BTreeMap<u64, String>,
  next_id: u64,
}

impl Default for DictionaryCodec {
  fn default() -> Self {
    Self::new()
  }
}

impl DictionaryCodec {
  pub fn new() -> Self {
    DictionaryCodec {
      forward: IndexMap::new(),
      reverse: BTreeMap::new(),
      next_id: 1,
    }
  }

  /// Returns the id for `value`, assigning the next free id on first sight.
  pub fn get_id(&mut self, value: &str) -> u64 {
    if let Some(&id) = self.forward.get(value) {
      return id;
    }
    let id = self.next_id;
    self.next_id += 1;
    self.forward.insert(value.to_string(), id);
    self.reverse.insert(id, value.to_string());
    id
  }

  pub fn get_value(&self, id: u64) -> Option<&str> {
    self.reverse.get(&id).map(|s| s.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.forward.is_empty()
  }

  /// Serialization form: string-form id mapped to value.
  pub fn to_map(&self) -> BTreeMap<String, String> {
    self
      .reverse
      .iter()
      .map(|(id, value)| (id.to_string(), value.clone()))
      .collect()
  }

  /// Restores a codec from its serialization form, with `next_id` picking up
  /// after the largest restored id.
  pub fn from_map(data: &BTreeMap<String, String>) -> IfcResult<Self> {
    let mut res = Self::new();
    for (id_str, value) in data {
      let id = id_str.parse::<u64>().map_err(|_| {
        IfcError::invalid_container(format!("dictionary id {} is not an integer", id_str))
      })?;
      res.forward.insert(value.clone(), id);
      res.reverse.insert(id, value.clone());
      res.next_id = res.next_id.max(id + 1);
    }
    Ok(res)
  }
}
