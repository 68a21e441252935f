// src/cli.rs

//! Shared command-line surface of the entrypoint binaries.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::error::Result;

/// Arguments accepted by every entrypoint.
#[derive(Parser, Debug)]
#[command(version, about = "Inven board crawler")]
pub struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Initialize logging based on verbosity flag.
///
/// `RUST_LOG` wins when set. Output goes to stderr.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
