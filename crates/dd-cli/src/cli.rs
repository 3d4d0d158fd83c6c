use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dd_types::Version;

#[derive(Parser)]
#[command(
    name = "diffdragon",
    about = "DiffDragon: forward diff bundles for versioned asset releases",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    #[arg(long, global = true)]
    pub download_root: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download every release since the floor and write one diff bundle per release
    Run(RunArgs),
    /// Diff two already extracted releases
    Diff(DiffArgs),
    /// List the releases a run would process
    Versions(VersionsArgs),
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Oldest release to process; raises the configured minimum
    #[arg(long)]
    pub from: Option<Version>,
    /// Read the version log from a local JSON file instead of the network
    #[arg(long)]
    pub versions_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub history: HistoryArgs,
    /// Releases downloaded concurrently per batch
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Args)]
pub struct DiffArgs {
    #[arg(long, requires = "prev_folder")]
    pub prev_version: Option<Version>,
    #[arg(long, requires = "prev_version")]
    pub prev_folder: Option<PathBuf>,
    #[arg(long)]
    pub next_version: Version,
    #[arg(long)]
    pub next_folder: PathBuf,
}

#[derive(Args)]
pub struct VersionsArgs {
    #[command(flatten)]
    pub history: HistoryArgs,
}
