use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Connection settings for the Drone CI database.
#[derive(Deserialize, Serialize, Clone, JsonSchema)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    pub name: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Options for the metrics collector.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct CollectorConfig {
    /// When false (the default), builds without a finish timestamp are never
    /// considered "last" by any of the build queries.
    #[serde(default)]
    pub include_unfinished_builds: bool,
}
