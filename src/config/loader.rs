//! Configuration loader.
//!
//! Layers, lowest to highest priority: built-in defaults, the YAML config
//! file, environment variables. CLI flags are applied afterwards by the
//! caller through [`ConfigLoader::config_mut`].

use super::types::{Config, Env};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::debug;

/// Env var naming the config file when no `--config` flag is given.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";
pub const STORAGE_PATH_VAR: &str = "TODO_API_STORAGE_PATH";
pub const ADDRESS_VAR: &str = "TODO_API_ADDRESS";
pub const ENV_VAR: &str = "TODO_API_ENV";

/// Where the effective configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file; defaults plus environment.
    Defaults,
    /// A YAML file named by `--config` or `CONFIG_PATH`.
    File,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Defaults => write!(f, "defaults"),
            ConfigSource::File => write!(f, "file"),
        }
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    config_path: Option<PathBuf>,
    source: ConfigSource,
}

impl ConfigLoader {
    /// Load configuration from the process environment.
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup.
    pub fn load_with_env<F>(explicit_path: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = explicit_path.or_else(|| {
            env(CONFIG_PATH_VAR)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });

        let (mut config, source) = match &path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file does not exist: {}", path.display());
                }
                let config = Config::load(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                debug!(path = %path.display(), "Loaded config file");
                (config, ConfigSource::File)
            }
            None => (Config::default(), ConfigSource::Defaults),
        };

        if let Some(storage_path) = env(STORAGE_PATH_VAR) {
            config.storage_path = PathBuf::from(storage_path);
        }
        if let Some(address) = env(ADDRESS_VAR) {
            config.http_server.address = address;
        }
        if let Some(value) = env(ENV_VAR) {
            config.env = value
                .parse::<Env>()
                .with_context(|| format!("invalid {}", ENV_VAR))?;
        }

        Ok(Self {
            config,
            config_path: path,
            source,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access for applying CLI overrides.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Validate and return the final configuration.
    pub fn into_config(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn no_path_uses_defaults() {
        let loader = ConfigLoader::load_with_env(None, env_of(&[])).unwrap();
        assert_eq!(loader.source(), ConfigSource::Defaults);
        assert!(loader.config_path().is_none());
        assert_eq!(loader.config().http_server.address, "127.0.0.1:8080");
    }

    #[test]
    fn config_path_var_names_the_file() {
        let file = write_config("storage_path: /tmp/from-file.db\n");
        let path = file.path().to_string_lossy().to_string();

        let loader =
            ConfigLoader::load_with_env(None, env_of(&[(CONFIG_PATH_VAR, &path)])).unwrap();
        assert_eq!(loader.source(), ConfigSource::File);
        assert_eq!(
            loader.config().storage_path,
            PathBuf::from("/tmp/from-file.db")
        );
    }

    #[test]
    fn explicit_path_wins_over_env_var() {
        let explicit = write_config("env: dev\n");
        let from_env = write_config("env: prod\n");
        let env_path = from_env.path().to_string_lossy().to_string();

        let loader = ConfigLoader::load_with_env(
            Some(explicit.path().to_path_buf()),
            env_of(&[(CONFIG_PATH_VAR, &env_path)]),
        )
        .unwrap();
        assert_eq!(loader.config().env, Env::Dev);
    }

    #[test]
    fn env_overrides_file_values() {
        let file = write_config("storage_path: a.db\nhttp_server:\n  address: 127.0.0.1:1\n");
        let loader = ConfigLoader::load_with_env(
            Some(file.path().to_path_buf()),
            env_of(&[
                (STORAGE_PATH_VAR, "b.db"),
                (ADDRESS_VAR, "127.0.0.1:2"),
                (ENV_VAR, "prod"),
            ]),
        )
        .unwrap();

        let config = loader.into_config().unwrap();
        assert_eq!(config.storage_path, PathBuf::from("b.db"));
        assert_eq!(config.http_server.address, "127.0.0.1:2");
        assert_eq!(config.env, Env::Prod);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = ConfigLoader::load_with_env(
            Some(PathBuf::from("/definitely/not/here.yaml")),
            env_of(&[]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("http_server: [not, a, map]\n");
        let result = ConfigLoader::load_with_env(Some(file.path().to_path_buf()), env_of(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn into_config_validates() {
        let loader =
            ConfigLoader::load_with_env(None, env_of(&[(ADDRESS_VAR, "not-an-address")])).unwrap();
        assert!(loader.into_config().is_err());
    }
}
