use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Compress a file into `<file>.ifc` next to it.
#[derive(Clone, Debug, Parser)]
pub struct CompressOpt {
  pub path: PathBuf,
}

pub fn compress(opt: CompressOpt) -> Result<()> {
  let mut output = opt.path.clone().into_os_string();
  output.push(".ifc");
  let output = PathBuf::from(output);

  ifc::compress(&opt.path, &output)?;
  println!("wrote {}", output.display());
  Ok(())
}
