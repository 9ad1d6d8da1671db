//! Configuration system.
//!
//! Settings come from three layers, later layers overriding earlier ones:
//! 1. **Defaults** - built into [`Config::default`]
//! 2. **File** - YAML named by `--config` or `CONFIG_PATH`
//! 3. **Environment** - `TODO_API_STORAGE_PATH`, `TODO_API_ADDRESS`, `TODO_API_ENV`
//!
//! CLI flags (`--database`, `--address`) are applied last by `main`.
//!
//! ```yaml
//! env: local
//! storage_path: ./storage/tasks.db
//! http_server:
//!   address: 127.0.0.1:8080
//!   timeout_ms: 4000
//!   idle_timeout_ms: 60000
//!   shutdown_grace_ms: 5000
//! ```

mod loader;
mod types;

pub use loader::{
    ADDRESS_VAR, CONFIG_PATH_VAR, ConfigLoader, ConfigSource, ENV_VAR, STORAGE_PATH_VAR,
};
pub use types::*;
