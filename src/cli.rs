use clap::Parser;
use std::path::PathBuf;

/// Blockform - form editing and validation server for list blocks
#[derive(Parser, Debug, Clone)]
#[command(name = "blockform", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "BLOCKFORM_CONFIG", default_value = "blockform.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "BLOCKFORM_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "BLOCKFORM_PORT")]
    pub port: Option<u16>,

    /// Validate the configuration and block definitions, then exit
    #[arg(long)]
    pub check: bool,
}
