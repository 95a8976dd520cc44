use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_DATA_DIR, ENV_DEBUG, ENV_HOST, ENV_MAX_JOBS, ENV_PORT};

#[derive(Parser)]
#[command(name = "tracegraph")]
#[command(version, about = "Trace log filtering and dataflow graphs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Data directory (uploads live under <data-dir>/uploads)
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<String>,

    /// Maximum number of filter jobs running at once
    #[arg(long, global = true, env = ENV_MAX_JOBS)]
    pub max_jobs: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Filter one raw log into its processed_logs counterpart
    Filter {
        /// Raw log path; must lie under a raw_logs directory
        raw_path: PathBuf,
        /// Filter in `column@@@regex[@@@column@@@regex...]` form (repeatable)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
    },
    /// Build the dataflow graph of filtered logs and print it as JSON
    Graph {
        /// Filtered logs, in log index order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub data_dir: Option<String>,
    pub max_jobs: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        data_dir: cli.data_dir,
        max_jobs: cli.max_jobs,
    };
    (config, cli.command)
}
