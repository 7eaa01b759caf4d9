//! # Configuration Module
//!
//! Listen options for [`Server::listen`](crate::Server::listen), loaded from the
//! environment, a TOML string or a TOML file.
//!
//! ## Environment Variables
//!
//! | Variable                | Field        | Example            |
//! |-------------------------|--------------|--------------------|
//! | `ROUTECHAIN_HOST`       | `host`       | `127.0.0.1`        |
//! | `ROUTECHAIN_PORT`       | `port`       | `3000`             |
//! | `ROUTECHAIN_STACK_SIZE` | `stack_size` | `0x8000` or `32768`|
//! | `ROUTECHAIN_WORKERS`    | `workers`    | `4`                |
//! | `ROUTECHAIN_LOG_FORMAT` | `log_format` | `plain` or `json`  |
//!
//! Unset variables keep their defaults. The stack size is the coroutine stack used
//! for every request, so it bounds how deep a handler chain can go.
//!
//! ## TOML
//!
//! ```rust
//! use routechain::config::{ListenOptions, LogFormat};
//!
//! let options = ListenOptions::from_toml_str(r#"
//!     port = 3000
//!     stack_size = 0x8000
//!     log_format = "json"
//! "#).unwrap();
//! assert_eq!(options.port, 3000);
//! assert_eq!(options.stack_size, 0x8000);
//! assert_eq!(options.log_format, LogFormat::Json);
//! assert_eq!(options.host, "0.0.0.0");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
/// 64 KB coroutine stacks
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Errors raised while loading or validating [`ListenOptions`]
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    InvalidEnv { var: &'static str, value: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Toml(err) => write!(f, "invalid config: {err}"),
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "invalid value {value:?} for {var}")
            }
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err)
    }
}

/// Where and how to serve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenOptions {
    pub host: String,
    pub port: u16,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// Worker threads of the coroutine scheduler; `None` keeps the runtime default
    pub workers: Option<usize>,
    pub log_format: LogFormat,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            stack_size: DEFAULT_STACK_SIZE,
            workers: None,
            log_format: LogFormat::Plain,
        }
    }
}

impl ListenOptions {
    /// Load options from `ROUTECHAIN_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load options through `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a value is unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn invalid(var: &'static str, value: &str) -> ConfigError {
            ConfigError::InvalidEnv {
                var,
                value: value.to_string(),
            }
        }

        let mut options = Self::default();
        if let Some(host) = lookup("ROUTECHAIN_HOST") {
            options.host = host;
        }
        if let Some(port) = lookup("ROUTECHAIN_PORT") {
            options.port = port
                .trim()
                .parse()
                .map_err(|_| invalid("ROUTECHAIN_PORT", &port))?;
        }
        if let Some(size) = lookup("ROUTECHAIN_STACK_SIZE") {
            options.stack_size =
                parse_size(&size).ok_or_else(|| invalid("ROUTECHAIN_STACK_SIZE", &size))?;
        }
        if let Some(workers) = lookup("ROUTECHAIN_WORKERS") {
            options.workers = Some(
                workers
                    .trim()
                    .parse()
                    .map_err(|_| invalid("ROUTECHAIN_WORKERS", &workers))?,
            );
        }
        if let Some(format) = lookup("ROUTECHAIN_LOG_FORMAT") {
            options.log_format = format
                .parse()
                .map_err(|()| invalid("ROUTECHAIN_LOG_FORMAT", &format))?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Parse options from TOML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed TOML or unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero stack size, zero workers or an
    /// empty host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.stack_size == 0 {
            return Err(ConfigError::Invalid("stack_size must be positive".to_string()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port`
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply the stack size and worker count to the coroutine runtime
    pub fn apply_runtime(&self) {
        let config = may::config();
        config.set_stack_size(self.stack_size);
        if let Some(workers) = self.workers {
            config.set_workers(workers);
        }
    }
}

/// Parse a size in decimal or `0x` hexadecimal
fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let options = ListenOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(options, ListenOptions::default());
        assert_eq!(options.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_env_overrides() {
        let options = ListenOptions::from_lookup(lookup(&[
            ("ROUTECHAIN_HOST", "127.0.0.1"),
            ("ROUTECHAIN_PORT", "3000"),
            ("ROUTECHAIN_STACK_SIZE", "0x8000"),
            ("ROUTECHAIN_WORKERS", "2"),
            ("ROUTECHAIN_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(options.addr(), "127.0.0.1:3000");
        assert_eq!(options.stack_size, 0x8000);
        assert_eq!(options.workers, Some(2));
        assert_eq!(options.log_format, LogFormat::Json);
    }

    #[test]
    fn test_decimal_stack_size() {
        let options =
            ListenOptions::from_lookup(lookup(&[("ROUTECHAIN_STACK_SIZE", "32768")])).unwrap();
        assert_eq!(options.stack_size, 32768);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = ListenOptions::from_lookup(lookup(&[("ROUTECHAIN_PORT", "eighty")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: "ROUTECHAIN_PORT", .. }
        ));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ListenOptions::from_lookup(lookup(&[("ROUTECHAIN_WORKERS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        assert!(matches!(
            ListenOptions::from_toml_str("prot = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size(" 16384 "), Some(16384));
        assert_eq!(parse_size("0xZZ"), None);
    }
}
