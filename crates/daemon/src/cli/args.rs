pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "twinrelay")]
#[command(about = "Proxy re-encryption relay between digital twins")]
pub struct Args {
    /// Path to the twinrelay state directory (defaults to ~/.twinrelay)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
