//! Layered configuration for the catalogue.
//!
//! Three layers, later ones overriding earlier: compiled-in defaults, a
//! `biblio.toml` file, then `BIBLIO_*` environment variables (nested keys
//! separated by a double underscore, e.g. `BIBLIO_DATABASE__PATH`).

pub mod error;

use crate::error::{ErrorKind, Result};
use biblio_store::Database;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "BIBLIO_";
const CONFIG_FILENAME: &str = "biblio.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Location of the SQLite database file.
    pub path: PathBuf,
    /// Upper bound on concurrently open connections.
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { database: DatabaseConfig::default() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path(), max_connections: 5 }
    }
}

impl Config {
    /// Loads configuration from the platform-standard config file location
    /// plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_file())
    }

    /// Loads configuration layering `path` (if it exists) over the defaults
    /// and environment overrides over both.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        debug!(database = %config.database.path.display(), "configuration loaded");
        Ok(config)
    }

    /// Opens the configured database, creating the file and running
    /// migrations as needed.
    pub async fn connect(&self) -> biblio_store::error::Result<Database> {
        Database::connect_with(&self.database.path, self.database.max_connections).await
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::OutOfRange("database.max_connections must be at least 1"));
        }
        Ok(())
    }
}

/// The platform-standard location of `biblio.toml`, falling back to the
/// working directory when no home is resolvable.
pub fn default_config_file() -> PathBuf {
    ProjectDirs::from("", "", "biblio")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "biblio")
        .map(|dirs| dirs.data_dir().join("catalogue.db"))
        .unwrap_or_else(|| PathBuf::from("catalogue.db"))
}
