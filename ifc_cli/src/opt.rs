use clap::{Parser, Subcommand};

use crate::compress::CompressOpt;
use crate::decompress::DecompressOpt;
use crate::stats::StatsOpt;

#[derive(Clone, Debug, Parser)]
#[command(about = "compress, decompress, and inspect .ifc files")]
pub struct OptWrapper {
  #[command(subcommand)]
  pub opt: Opt,
  /// Print debug-level progress events.
  #[arg(long, global = true)]
  pub verbose: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Opt {
  Compress(CompressOpt),
  Decompress(DecompressOpt),
  Stats(StatsOpt),
}
