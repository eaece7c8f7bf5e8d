//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Pack and unpack CI pipeline caches
///
/// Run once per pipeline stage: init, pre-restore, post-restore, pre-save.
/// State is passed between stages through pipeline variables.
#[derive(Parser, Debug)]
#[command(name = "cache-pack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Lifecycle stage: init, pre-restore, post-restore or pre-save
    #[arg(value_name = "STAGE")]
    pub stage: Option<String>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "CACHE_PACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, env = "CACHE_PACK_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// JSON lines
    Json,
}
