//! Command line interface for Beatcam

use clap::Parser;
use std::fmt;

use crate::config::BeatcamConfig;

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or rendered
    ConfigLoad(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Beatcam - beat-synced camera behavior for mixed reality capture
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Random seed for effect randomization
    #[arg(short = 's', long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Broadcast server port (overrides config file)
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<BeatcamConfig, CliError> {
    let mut config = if let Some(config_path) = &args.config {
        println!("Loading configuration from: {config_path}");
        BeatcamConfig::load_or_default(config_path)
    } else {
        match BeatcamConfig::default_user_path() {
            Some(path) => BeatcamConfig::load_or_default(&path.to_string_lossy()),
            None => BeatcamConfig::default(),
        }
    };

    if let Some(port) = args.port {
        println!("Overriding broadcast port to: {port}");
        config.fove_server_port = port;
    }

    Ok(config)
}

/// Handles the --print-config flag
pub fn handle_print_config(config: &BeatcamConfig) -> Result<(), CliError> {
    let rendered =
        toml::to_string_pretty(config).map_err(|e| CliError::ConfigLoad(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
