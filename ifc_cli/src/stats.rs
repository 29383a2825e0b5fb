use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Print layout statistics of a `.ifc` container.
#[derive(Clone, Debug, Parser)]
pub struct StatsOpt {
  pub path: PathBuf,
}

pub fn stats(opt: StatsOpt) -> Result<()> {
  let container = ifc::container::read(&opt.path)?;
  let total_size = fs::metadata(&opt.path)?.len();

  println!("strategy id:   {}", container.strategy_id);
  println!("total size:    {} bytes", total_size);
  println!("payload size:  {} bytes", container.payload.len());
  println!("metadata size: {} bytes", container.meta_len);
  Ok(())
}
