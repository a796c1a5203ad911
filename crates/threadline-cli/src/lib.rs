//! Threadline runner library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `settings`: Layered configuration (defaults, files, environment)
//! - `extract`: JSON-lines message extraction
//! - `commands`: Command implementations (classify, config)

pub mod cli;
pub mod commands;
pub mod extract;
pub mod settings;

pub use cli::{ClassifyArgs, Cli, Commands, PolicyArg};
pub use commands::{
    apply_overrides, build_classifier, classify_channel, handle_classify, handle_config,
    run_classify, ChannelReport, RunReport, TopicReport,
};
pub use extract::{ExtractError, JsonLinesExtractor};
pub use settings::Settings;
