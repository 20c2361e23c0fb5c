//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod auth;
mod banner;
mod catalog;

pub use banner::BannerCommands;
pub use catalog::CatalogCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print the bearer token
    Login,
    /// Ad-banner jobs
    Banner {
        #[command(subcommand)]
        command: BannerCommands,
    },
    /// Product catalog reads
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Fetch personalised recommendations
    Recommend,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login => auth::handle_login(config).await,
        Commands::Banner { command } => banner::handle_banner_command(command, config).await,
        Commands::Catalog { command } => catalog::handle_catalog_command(command, config).await,
        Commands::Recommend => catalog::handle_recommend(config).await,
    }
}
