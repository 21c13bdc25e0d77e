//! Command-line flags. Each database flag falls back to the same `DRONE_*`
//! environment variable the Drone server itself uses.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug, Default)]
#[clap(name = "dronedb-exporter", version)]
#[clap(about = "Prometheus exporter for the Drone CI database")]
pub struct Cli {
    /// Drone database host
    #[clap(long, env = "DRONE_DATABASE_HOST")]
    pub host: Option<String>,

    /// Drone database port
    #[clap(long = "port", env = "DRONE_DATABASE_PORT")]
    pub db_port: Option<u16>,

    /// Drone database name
    #[clap(long, env = "DRONE_DATABASE")]
    pub database: Option<String>,

    /// Drone database user
    #[clap(short = 'u', long, env = "DRONE_DATABASE_USER")]
    pub username: Option<String>,

    /// Drone database password
    #[clap(short = 'p', long, env = "DRONE_DATABASE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Port the metrics endpoint listens on
    #[clap(long, env = "DRONE_LISTEN_PORT")]
    pub listen_port: Option<u16>,

    /// Optional YAML configuration file
    #[clap(short = 'c', long, default_value = "./config.yaml")]
    pub config: PathBuf,

    /// Print the JSON schema of the configuration file and exit
    #[clap(long)]
    pub print_schema: bool,
}

/// The subset of the configuration tree that was set on the command line.
#[derive(Serialize, Debug, Default)]
pub struct CliOverrides {
    database: DatabaseOverrides,
    #[serde(skip_serializing_if = "Option::is_none")]
    listen_port: Option<u16>,
}

#[derive(Serialize, Debug, Default)]
struct DatabaseOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            database: DatabaseOverrides {
                host: self.host.clone(),
                port: self.db_port,
                name: self.database.clone(),
                user: self.username.clone(),
                password: self.password.clone(),
            },
            listen_port: self.listen_port,
        }
    }
}
