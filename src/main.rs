//! WiFi Portal - captive portal backend for the hotspot
//!
//! Serves branding settings and scheduled ads, and logs guests in through
//! Google or Facebook before handing them to the network gateway.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use wifi_portal::{
    cli::{Cli, Command},
    config::Config,
    portal::Portal,
    setup_tracing,
    store::PgStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };

    // Handle subcommands
    match cli.command {
        Some(Command::Migrate) => run_migrate(&config).await,
        Some(Command::Config) => print_config(&config),
        Some(Command::Serve) | None => run_server(config, cli.memory).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Result<Config, ExitCode> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            Err(ExitCode::FAILURE)
        }
    }
}

/// Create the database tables and exit
async fn run_migrate(config: &Config) -> ExitCode {
    let store = match PgStore::connect_lazy(&config.database) {
        Ok(store) => store,
        Err(e) => {
            error!("Invalid database configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match store.migrate().await {
        Ok(()) => {
            println!("✅ Database tables ensured");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print the effective configuration with secrets masked
fn print_config(config: &Config) -> ExitCode {
    match serde_yaml::to_string(&config.redacted()) {
        Ok(yaml) => {
            print!("{yaml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Failed to serialize configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the portal server
async fn run_server(config: Config, memory: bool) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        memory,
        "Starting WiFi portal"
    );

    let portal = if memory {
        Portal::in_memory(config)
    } else {
        Portal::new(config).await
    };

    let portal = match portal {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create portal: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = portal.run().await {
        error!("Portal error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Portal shutdown complete");
    ExitCode::SUCCESS
}
