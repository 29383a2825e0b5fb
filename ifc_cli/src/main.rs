use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use crate::opt::{Opt, OptWrapper};

mod compress;
mod decompress;
mod opt;
mod stats;

fn main() -> Result<()> {
  let wrapper = OptWrapper::parse();
  let level = if wrapper.verbose {
    LevelFilter::DEBUG
  } else {
    LevelFilter::WARN
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_target(false)
    .init();

  match wrapper.opt {
    Opt::Compress(compress_opt) => compress::compress(compress_opt),
    Opt::Decompress(decompress_opt) => decompress::decompress(decompress_opt),
    Opt::Stats(stats_opt) => stats::stats(stats_opt),
  }
}
