use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::probe_config::ProbeConfig;

pub const DEFAULT_CONFIG_FILE: &str = "rangeprobe.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {name}")]
    InvalidOverride { name: &'static str, value: String },
}

pub struct AppConfig {
    pub config: ProbeConfig,
    /// The file the config was read from, `None` when running on defaults.
    pub config_file: Option<PathBuf>,
}

impl AppConfig {
    /// Where the settings came from, for log lines.
    pub fn source(&self) -> String {
        match &self.config_file {
            Some(path) => path.display().to_string(),
            None => "defaults".to_string(),
        }
    }
}

/// Load the probe configuration from a YAML file and environment variables.
///
/// A `.env` file is honoured if present. The file named by `CONFIG_FILE`
/// (default `rangeprobe.yml`) is read when it exists; naming a file that
/// does not exist is an error, while a missing default file just means
/// defaults. `PROBE_CONCURRENCY`, `PROBE_TIMEOUT_SECONDS` and
/// `PROBE_USER_AGENT` override the file.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let _ = dotenvy::dotenv();

    let explicit = env::var("CONFIG_FILE").ok();
    let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));

    let (config, config_file) = if explicit.is_some() || path.exists() {
        (read_config_file(&path)?, Some(path))
    } else {
        (ProbeConfig::default(), None)
    };

    let config = apply_env_overrides(config, |name| env::var(name).ok())?;

    let app_config = AppConfig {
        config,
        config_file,
    };
    log::info!("Using config from {}", app_config.source());
    Ok(app_config)
}

pub fn read_config_file(path: &Path) -> Result<ProbeConfig, ConfigError> {
    let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&config_str).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(yaml: &str) -> Result<ProbeConfig, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(ProbeConfig::default());
    }
    serde_yaml::from_str(yaml)
}

pub fn apply_env_overrides(
    mut config: ProbeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProbeConfig, ConfigError> {
    if let Some(value) = lookup("PROBE_CONCURRENCY") {
        config.concurrency = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOverride {
                name: "PROBE_CONCURRENCY",
                value,
            })?;
    }
    if let Some(value) = lookup("PROBE_TIMEOUT_SECONDS") {
        config.timeout_seconds =
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    name: "PROBE_TIMEOUT_SECONDS",
                    value,
                })?;
    }
    if let Some(value) = lookup("PROBE_USER_AGENT") {
        config.user_agent = value;
    }
    Ok(config)
}
