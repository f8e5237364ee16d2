use crate::commands::Commands;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "fpctl")]
#[command(about = "Control panel for the florida server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Panel config directory (defaults to FP_CONFIG_DIR, then the OS config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}
