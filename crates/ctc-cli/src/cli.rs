use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ctc",
    about = "C-Terminal Community server: posts, projects, comments and likes over HTTP",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; missing files fall back to defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Persist records and uploads under this directory
    #[arg(long, conflicts_with = "memory")]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory
    #[arg(long)]
    pub memory: bool,

    /// Directory holding the front-end bundle
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
