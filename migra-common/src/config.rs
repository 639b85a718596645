//! Configuration loading and environment resolution
//!
//! Settings resolve through a three-tier priority ladder:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MIGRA_*`)
//! 3. TOML config file (`migra.{env}.toml` in the working directory)
//!
//! The environment selector (`dev`/`prod`) picks which TOML file is read. It
//! defaults to `dev` when unset; an unrecognized value is a config error.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Deployment environment selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    /// Resolve from an optional CLI value, falling back to `MIGRA_ENV`.
    /// Unset selects `dev`; a typo must not silently run against dev config.
    pub fn resolve(cli_arg: Option<&str>) -> Result<Environment> {
        let raw = cli_arg
            .map(|s| s.to_string())
            .or_else(|| std::env::var("MIGRA_ENV").ok());

        match raw.as_deref() {
            Some(s) => s.parse(),
            None => Ok(Environment::Dev),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(Error::Config(format!("unknown environment '{}'", other))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `migra.{env}.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub database_url: Option<String>,
    pub census_api_key: Option<String>,
    pub data_root: Option<PathBuf>,
}

impl TomlConfig {
    /// Load the config file for an environment from a directory.
    /// A missing file is not an error; all tiers fall through.
    pub fn load_from(dir: &Path, environment: Environment) -> Result<TomlConfig> {
        let path = dir.join(format!("migra.{}.toml", environment));
        if !path.exists() {
            return Ok(TomlConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Resolved settings shared by the pipeline and the dashboard
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    /// SQLite connection string, e.g. `sqlite://data/migra.db`
    pub database_url: String,
    /// Census statistical API key. Required by the pipeline only.
    pub census_api_key: Option<String>,
    /// Root directory for raw and processed data files
    pub data_root: PathBuf,
}

impl Settings {
    /// Resolve settings for the given environment from CLI values, the
    /// process environment, and the TOML config file, in that order.
    ///
    /// `require_api_key` is set by the pipeline; the dashboard only needs
    /// the database URL.
    pub fn resolve(
        environment: Environment,
        cli_database_url: Option<&str>,
        require_api_key: bool,
    ) -> Result<Settings> {
        let toml_config = TomlConfig::load_from(Path::new("."), environment)?;

        let database_url = resolve_value(
            cli_database_url,
            "MIGRA_DATABASE_URL",
            toml_config.database_url.as_deref(),
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "database_url not set; provide --database-url, MIGRA_DATABASE_URL, \
                 or database_url in migra.{}.toml",
                environment
            ))
        })?;

        let census_api_key = resolve_value(
            None,
            "MIGRA_CENSUS_API_KEY",
            toml_config.census_api_key.as_deref(),
        );
        if require_api_key && census_api_key.is_none() {
            return Err(Error::Config(format!(
                "census_api_key not set; provide MIGRA_CENSUS_API_KEY \
                 or census_api_key in migra.{}.toml",
                environment
            )));
        }

        let data_root = std::env::var("MIGRA_DATA_ROOT")
            .map(PathBuf::from)
            .ok()
            .or(toml_config.data_root)
            .unwrap_or_else(|| PathBuf::from("./data"));

        Ok(Settings {
            environment,
            database_url,
            census_api_key,
            data_root,
        })
    }

    /// Settings for tests and in-process fixtures
    pub fn for_tests(database_url: impl Into<String>, data_root: impl Into<PathBuf>) -> Settings {
        Settings {
            environment: Environment::Dev,
            database_url: database_url.into(),
            census_api_key: None,
            data_root: data_root.into(),
        }
    }
}

/// Three-tier value resolution: CLI argument, environment variable, TOML.
/// Warns when more than one tier supplies a value.
fn resolve_value(cli_arg: Option<&str>, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.is_empty());

    let mut sources = Vec::new();
    if cli_arg.is_some() {
        sources.push("command line");
    }
    if env_value.is_some() {
        sources.push("environment");
    }
    if toml_value.is_some() {
        sources.push("TOML");
    }
    if sources.len() > 1 {
        warn!(
            "{} set in multiple sources: {}. Using {} (highest priority).",
            env_var,
            sources.join(", "),
            sources[0]
        );
    }

    cli_arg
        .map(str::to_string)
        .or(env_value)
        .or_else(|| toml_value.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_known_values() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(Environment::resolve(Some("nonsense")).is_err());
        assert_eq!(
            Environment::resolve(Some("prod")).unwrap(),
            Environment::Prod
        );
    }

    #[test]
    fn cli_argument_wins_over_toml() {
        let resolved = resolve_value(Some("sqlite://cli.db"), "MIGRA_TEST_UNSET_VAR", Some("sqlite://toml.db"));
        assert_eq!(resolved.as_deref(), Some("sqlite://cli.db"));
    }

    #[test]
    fn toml_is_last_resort() {
        let resolved = resolve_value(None, "MIGRA_TEST_UNSET_VAR", Some("sqlite://toml.db"));
        assert_eq!(resolved.as_deref(), Some("sqlite://toml.db"));
    }

    #[test]
    fn missing_toml_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TomlConfig::load_from(dir.path(), Environment::Dev).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.census_api_key.is_none());
    }

    #[test]
    fn toml_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("migra.prod.toml"),
            "database_url = \"sqlite://prod.db\"\ncensus_api_key = \"abc123\"\n",
        )
        .unwrap();
        let config = TomlConfig::load_from(dir.path(), Environment::Prod).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite://prod.db"));
        assert_eq!(config.census_api_key.as_deref(), Some("abc123"));
    }
}
