use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "subsurface-cloud-download")]
#[command(about = "Download drilling, production and monthly reports from the subsurface cloud file service")]
#[command(version)]
pub struct Cli {
    /// Path to the XML download configuration
    #[arg(short, long)]
    pub configuration: PathBuf,

    /// Directory for the per-run log file
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,
}
