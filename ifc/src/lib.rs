//! Content-aware lossless compression for JSON, CSV, log, and plain text
//! files.
//!
//! The compressor detects the structural kind of an input by extension,
//! applies a format-specific token transform (structural flattening,
//! columnar transpose, timestamp deltas, or lexical splitting), entropy
//! codes the tokens with a Huffman code, and packs everything into a
//! self-describing IFC1 container that [`decompress`] inverts.

pub use compressor::compress;
pub use decompressor::decompress;
pub use detect::{detect, FileKind};

pub mod container;
pub mod errors;

mod bit_reader;
mod bit_writer;
mod bits;
mod compressor;
mod decompressor;
mod delta_encoding;
mod detect;
mod dictionary;
mod huffman_decoding;
mod huffman_encoding;
mod strategies;
mod token;

#[cfg(test)]
mod tests;
