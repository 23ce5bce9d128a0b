pub mod commands;
pub mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::cli::config::AppConfig;
use crate::scraping::ScrapeMode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the fine print of a page and print the result as JSON
    Scrape {
        /// Page to scrape; `https://` is assumed when no scheme is given
        #[arg(required = true)]
        url: String,

        /// Scraping mode
        #[arg(short, long, value_enum, default_value_t = ScrapeMode::Auto)]
        mode: ScrapeMode,

        /// Maximum number of linked terms pages to follow
        #[arg(long)]
        max_related: Option<usize>,
    },

    /// Scrape, clean and analyze the fine print of a page
    Analyze {
        /// Page to analyze
        #[arg(required = true)]
        url: String,

        /// User the scan is counted against
        #[arg(short, long, default_value = "anonymous")]
        user: String,

        /// Maximum number of linked terms pages to follow
        #[arg(long)]
        max_related: Option<usize>,
    },

    /// Clear today's scan count for a user
    ResetScans {
        /// User whose scans are forgotten
        #[arg(short, long, required = true)]
        user: String,
    },

    /// Clean raw text from a file or stdin
    Normalize {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Show the active configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path)
            .context(format!("Failed to load config: {}", path.display())),
        None => AppConfig::load_default(),
    }
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scrape { url, mode, max_related } => {
            let config = load_config(cli.config.as_ref())?;
            info!("Scraping {} in {} mode", url, mode);
            commands::scrape(&config, &url, mode, max_related).await
        }
        Commands::Analyze { url, user, max_related } => {
            let config = load_config(cli.config.as_ref())?;
            info!("Analyzing {} for user {}", url, user);
            commands::analyze(&config, &url, &user, max_related).await
        }
        Commands::ResetScans { user } => {
            let config = load_config(cli.config.as_ref())?;
            info!("Resetting scan count for user {}", user);
            commands::reset_scans(&config, &user).await
        }
        Commands::Normalize { file } => {
            let config = load_config(cli.config.as_ref())?;
            commands::normalize_text(&config, file).await
        }
        Commands::Config { init } => {
            if init {
                commands::init_config(cli.config).await
            } else {
                let config = load_config(cli.config.as_ref())?;
                commands::show_config(&config)
            }
        }
    }
}
