//! Threadline
//!
//! Splits chat history into conversation topics.
//!
//! # Usage
//!
//! ```bash
//! threadline classify --input history.jsonl [--policy elastic|threshold] [--capacity N]
//! threadline config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/threadline/config.toml)
//! 3. `--config` file
//! 4. Environment variables (THREADLINE_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use threadline_cli::{handle_classify, handle_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify(args) => {
            handle_classify(cli.config.as_deref(), cli.log_level.as_deref(), args).await?;
        }
        Commands::Config => {
            handle_config(cli.config.as_deref())?;
        }
    }

    Ok(())
}
