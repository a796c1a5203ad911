//! CLI argument parsing for the threadline runner.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Threadline
///
/// Splits chat history into conversation topics, one channel at a time.
#[derive(Parser, Debug)]
#[command(name = "threadline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/threadline/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Runner commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a JSON-lines message file into topics
    Classify(ClassifyArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Similarity decision procedure
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Size-dependent thresholds over the most recent topics
    Elastic,
    /// Single global centroid-similarity threshold
    Threshold,
}

/// Options for `classify`
#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// JSON-lines input, one message per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum topics kept per channel window
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Topics compared against each message
    #[arg(long)]
    pub max_active_topics: Option<usize>,

    /// Decision procedure
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Similarity threshold for the threshold policy
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Append messages arriving within this many seconds to the latest topic
    #[arg(long)]
    pub time_decay_secs: Option<u64>,

    /// Disable grammatical reply detection
    #[arg(long)]
    pub no_replies: bool,

    /// Stop after this many messages per channel
    #[arg(long)]
    pub max_messages: Option<usize>,

    /// Drop messages with fewer words
    #[arg(long)]
    pub min_words: Option<usize>,

    /// Word vector file (GloVe text format)
    #[arg(long)]
    pub vectors: Option<String>,

    /// Include topics evicted from the window in the report
    #[arg(long)]
    pub include_evicted: bool,

    /// Omit topics with fewer messages from the report
    #[arg(long, default_value = "1")]
    pub min_topic_size: usize,
}
