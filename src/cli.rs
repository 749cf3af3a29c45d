//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Captive portal backend for the WiFi hotspot
#[derive(Parser, Debug)]
#[command(name = "wifi-portal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "WIFI_PORTAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "WIFI_PORTAL_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "WIFI_PORTAL_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "WIFI_PORTAL_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "WIFI_PORTAL_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Keep everything in memory instead of Postgres (development only)
    #[arg(long, env = "WIFI_PORTAL_MEMORY")]
    pub memory: bool,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the portal server (default)
    Serve,

    /// Create the database tables and exit
    Migrate,

    /// Print the effective configuration as YAML with secrets masked
    Config,
}
