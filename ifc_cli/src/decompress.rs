use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

/// Decompress a `<file>.ifc` container into `<file>.restored`.
#[derive(Clone, Debug, Parser)]
pub struct DecompressOpt {
  pub path: PathBuf,
}

pub fn decompress(opt: DecompressOpt) -> Result<()> {
  if opt.path.extension().map(|e| e != "ifc").unwrap_or(true) {
    return Err(anyhow!("input file must have the .ifc extension"));
  }
  let output = opt.path.with_extension("restored");

  ifc::decompress(&opt.path, &output)?;
  println!("wrote {}", output.display());
  Ok(())
}
