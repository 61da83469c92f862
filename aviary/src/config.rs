//! Server configuration.
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`, `AVIARY_CONFIG`)
//! 3. environment variables (`AVIARY_PORT`, `AVIARY_DB_URL`, ...)
//! 4. command-line flags
//!
//! Environment variables and flags are handled together by [`Cli`]: clap reads the
//! variable when the flag is absent.
//!
//! ```toml
//! port = 3000
//!
//! [db]
//! url = "mongodb://localhost:27017/aviary"
//! server_selection_timeout_ms = 5000
//!
//! [log]
//! format = "json"
//! filter = "info,aviary=debug"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("unsupported store address {0:?}: expected memory://, mongodb:// or mongodb+srv://")]
    UnsupportedStore(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,
    /// Port to bind to (default: 3000)
    pub port: u16,
    pub db: DbConfig,
    pub log: LogConfig,
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Store address. `memory://` selects the in-memory store.
    pub url: String,
    /// Database name; defaults to the one named in `url`.
    pub name: Option<String>,
    /// How long a store call may wait for a usable server.
    pub server_selection_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db: DbConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017/aviary".to_string(),
            name: None,
            server_selection_timeout_ms: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "info,tower_http=debug".to_string(),
        }
    }
}

impl DbConfig {
    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Parses a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str, path: &str) -> ConfigResult<Self> {
        toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Loads the configuration file at `path`, or the defaults when there is none.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let display = path.display().to_string();
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        Self::from_toml_str(&input, &display)
    }

    /// Builds the effective configuration from parsed command-line arguments.
    pub fn from_cli(cli: &Cli) -> ConfigResult<Self> {
        let mut config = Self::load(cli.config.as_deref())?;
        cli.apply(&mut config);
        Ok(config)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Command-line flags; each also reads an `AVIARY_*` environment variable.
#[derive(Debug, Default, Parser)]
#[command(name = "aviary", version, about = "Serve the birds collection over HTTP")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "AVIARY_CONFIG")]
    pub config: Option<PathBuf>,
    /// Host to bind to
    #[arg(long, env = "AVIARY_HOST")]
    pub host: Option<String>,
    /// Port to listen on
    #[arg(long, env = "AVIARY_PORT")]
    pub port: Option<u16>,
    /// Document store address
    #[arg(long = "db-url", env = "AVIARY_DB_URL")]
    pub db_url: Option<String>,
    /// Database name
    #[arg(long = "db-name", env = "AVIARY_DB_NAME")]
    pub db_name: Option<String>,
    /// Log output format
    #[arg(long = "log-format", env = "AVIARY_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.db_url {
            config.db.url = url.clone();
        }
        if let Some(name) = &self.db_name {
            config.db.name = Some(name.clone());
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.socket_addr(), "0.0.0.0:3000");
        assert_eq!(config.db.url, "mongodb://localhost:27017/aviary");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            port = 8080

            [db]
            url = "memory://"
            server_selection_timeout_ms = 250
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.db.url, "memory://");
        assert_eq!(
            config.db.server_selection_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_sample_file_parses() {
        let config =
            Config::from_toml_str(include_str!("../../aviary.toml"), "aviary.toml").unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.db.server_selection_timeout_ms, Some(5000));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = Config::from_toml_str("prot = 80", "inline");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080\n[db]\nurl = \"memory://\"").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "aviary",
            "--config",
            path,
            "--port",
            "9090",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.db.url, "memory://");
        assert_eq!(config.log.format, LogFormat::Json);
    }
}
