//! Command-line interface for the shipyard-server binary

use std::path::PathBuf;

use clap::Parser;

use crate::config::{LogFormat, ServerConfig};

/// shipyard-server - ship registry API behind OAuth2 bearer authentication
#[derive(Parser, Debug, Default)]
#[command(name = "shipyard-server", version, about, author)]
pub struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, env = "SHIPYARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address (overrides BIND_ADDRESS)
    #[arg(long)]
    pub bind: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// JSON file of ships to preload (overrides DATA_FILE)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Log format (overrides LOG_FORMAT)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data_file) = &self.data_file {
            config.data_file = Some(data_file.clone());
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        match self.verbose {
            0 => {}
            1 => config.log_level = "debug".to_string(),
            _ => config.log_level = "trace".to_string(),
        }
    }
}
