use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tracks",
    version,
    about = "Upload iTunes library exports and follow their import"
)]
pub struct Cli {
    /// RON config file (defaults to ./tracks_client.ron when present).
    #[arg(long, global = true, env = "TRACKS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the track library server.
    #[arg(long, global = true, env = "TRACKS_SERVER")]
    pub server: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the track list.
    List {
        /// Only tracks without a release year.
        #[arg(long)]
        missing: bool,
    },
    /// Upload a library file and follow the import until it finishes.
    Upload { path: Option<PathBuf> },
    /// Ask the server to infer the year of every track that lacks one.
    InferAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
