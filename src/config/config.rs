use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::database::{CollectorConfig, DatabaseConfig};
use super::logging::LoggingConfig;
use crate::cli::Cli;

/// Errors raised while loading configuration or initialising logging.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Figment(#[from] figment::Error),
    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
    #[error("invalid logging.format '{0}'. Valid values: console, json")]
    InvalidLogFormat(String),
    #[error("failed to install the tracing subscriber: {0}")]
    Logging(String),
}

/// Main exporter configuration.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.listen_port)
    }
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    9698
}

/// Environment variables that are not already covered by a command-line flag.
fn env_provider() -> Env {
    Env::prefixed("DRONE_")
        .only(&[
            "log_level",
            "log_format",
            "database_connect_timeout",
            "include_unfinished_builds",
        ])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "log_level" => "logging.level".into(),
            "log_format" => "logging.format".into(),
            "database_connect_timeout" => "database.connect_timeout_secs".into(),
            "include_unfinished_builds" => "collector.include_unfinished_builds".into(),
            other => other.to_string().into(),
        })
}

/// Layers the config file, `DRONE_*` environment and command line, last one wins.
pub fn figment(cli: &Cli) -> Figment {
    Figment::new()
        .merge(Yaml::file(&cli.config))
        .merge(env_provider())
        .merge(Serialized::defaults(cli.overrides()))
}

pub fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    Ok(figment(cli).extract::<Config>()?)
}

/// JSON schema for the configuration file.
pub fn config_schema() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
