//! Tracing subscriber setup.
//!
//! Output goes to stdout, stderr or an append-mode file, selected by the
//! `--log` flag. `RUST_LOG` overrides the level chosen from `--verbose` and
//! the configured environment.

use crate::config::Env;
use anyhow::Result;
use std::fs::OpenOptions;
use tracing_subscriber::EnvFilter;

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(String),
}

impl LogTarget {
    /// Parse the `--log` flag value.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(filename.to_string()),
        }
    }
}

/// Default directive when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool, env: Env) -> &'static str {
    if verbose || env == Env::Local {
        "debug"
    } else {
        "info"
    }
}

fn build_filter(verbose: bool, env: Env) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, env)))
}

/// Install the global tracing subscriber.
pub fn init(target: &LogTarget, verbose: bool, env: Env) -> Result<()> {
    let filter = build_filter(verbose, env);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            tracing::subscriber::set_global_default(
                builder.with_writer(std::io::stdout).finish(),
            )?;
        }
        LogTarget::Stderr => {
            tracing::subscriber::set_global_default(
                builder.with_writer(std::io::stderr).finish(),
            )?;
        }
        LogTarget::File(filename) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            tracing::subscriber::set_global_default(
                builder.with_writer(file).with_ansi(false).finish(),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_flag() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("2"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("server.log"),
            LogTarget::File("server.log".to_string())
        );
    }

    #[test]
    fn local_env_logs_debug() {
        assert_eq!(default_directive(false, Env::Local), "debug");
        assert_eq!(default_directive(false, Env::Prod), "info");
        assert_eq!(default_directive(true, Env::Prod), "debug");
    }
}
