//! Configuration types.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deployment environment; selects the default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Local,
    Dev,
    Prod,
}

impl std::str::FromStr for Env {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "prod" => Ok(Env::Prod),
            other => bail!("unknown env '{}': expected local, dev or prod", other),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub env: Env,

    /// Path to the SQLite database file.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Env::default(),
            storage_path: default_storage_path(),
            http_server: HttpServerConfig::default(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Listen address, e.g. `127.0.0.1:8080`.
    #[serde(default = "default_address")]
    pub address: String,

    /// Deadline for a whole request: body read plus store calls.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Close a connection after this long without reading or writing.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// How long in-flight requests may run after a shutdown signal.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout_ms: default_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl HttpServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid http_server.address '{}': {}", self.address, e))
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("storage/tasks.db")
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    4_000
}

fn default_idle_timeout_ms() -> u64 {
    60_000
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.http_server.socket_addr()?;
        if self.http_server.timeout_ms == 0 {
            bail!("http_server.timeout_ms must be greater than zero");
        }
        // Idle limit must not undercut the request deadline
        if self.http_server.idle_timeout_ms < self.http_server.timeout_ms {
            bail!("http_server.idle_timeout_ms must be at least http_server.timeout_ms");
        }
        if self.http_server.shutdown_grace_ms == 0 {
            bail!("http_server.shutdown_grace_ms must be greater than zero");
        }
        if self.storage_path.as_os_str().is_empty() {
            bail!("storage_path must not be empty");
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.storage_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.env, Env::Local);
        assert_eq!(config.http_server.timeout(), Duration::from_secs(4));
        assert_eq!(config.http_server.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.http_server.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn idle_timeout_reads_from_yaml_and_must_cover_request_timeout() {
        let config: Config = serde_yaml::from_str(
            "http_server:\n  timeout_ms: 1000\n  idle_timeout_ms: 30000\n",
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.http_server.idle_timeout(), Duration::from_secs(30));

        let mut config = Config::default();
        config.http_server.idle_timeout_ms = config.http_server.timeout_ms - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "env: prod\nhttp_server:\n  address: 0.0.0.0:9000\n",
        )
        .unwrap();
        assert_eq!(config.env, Env::Prod);
        assert_eq!(config.http_server.address, "0.0.0.0:9000");
        assert_eq!(config.http_server.timeout_ms, 4_000);
        assert_eq!(config.storage_path, PathBuf::from("storage/tasks.db"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<Config, _> = serde_yaml::from_str("storage: ./x.db\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_address_and_zero_timeout() {
        let mut config = Config::default();
        config.http_server.address = "localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http_server.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Env>().unwrap(), Env::Prod);
        assert!("staging".parse::<Env>().is_err());
    }
}
