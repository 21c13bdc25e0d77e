use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use dronedb_exporter::cli::Cli;
use dronedb_exporter::config::{config_schema, load_config};
use dronedb_exporter::startup;
use dronedb_exporter::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.print_schema {
        match config_schema() {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                eprintln!("Error rendering configuration schema: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initialising logging: {}", e);
        std::process::exit(1);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = ?config.database,
        "Starting dronedb exporter"
    );

    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Exporter stopped: {}", e);
        std::process::exit(1);
    }
}
