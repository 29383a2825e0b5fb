//! First-order delta coding for integer sequences.
//!
//! A non-empty sequence `[v0, v1, ..., vn]` becomes
//! `[v0, v1 - v0, ..., vn - v(n-1)]`. Arithmetic wraps, so round trips are
//! exact on the full `i64` range.

pub fn encode(values: &[i64]) -> Vec<i64> {
  if values.is_empty() {
    return Vec::new();
  }

  let mut deltas = Vec::with_capacity(values.len());
  deltas.push(values[0]);
  for i in 1..values.len() {
    deltas.push(values[i].wrapping_sub(values[i - 1]));
  }
  deltas
}

pub fn decode(deltas: &[i64]) -> Vec<i64> {
  if deltas.is_empty() {
    return Vec::new();
  }

  let mut values = Vec::with_capacity(deltas.len());
  values.push(deltas[0]);
  for i in 1..deltas.len() {
    values.push(values[i - 1].wrapping_add(deltas[i]));
  }
  values
}
