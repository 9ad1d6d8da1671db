//! CLI command definitions for todo-api
//!
//! This module defines the CLI structure using clap's derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Task-tracking HTTP service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (falls back to $CONFIG_PATH)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long, global = true)]
    pub address: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,

    /// Create the database file and schema, then exit
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_with_stderr_logging() {
        let cli = Cli::try_parse_from(["todo-api"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "todo-api",
            "init",
            "--database",
            "/tmp/t.db",
            "--address",
            "0.0.0.0:9000",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Init));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(cli.address.as_deref(), Some("0.0.0.0:9000"));
    }
}
