//! Probe CLI
//!
//! Command-line interface for poking at the backend by hand: log in, submit
//! and follow banner jobs, read the catalog and fetch recommendations.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "probe")]
#[command(about = "Backend probe CLI", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "PROBE_BASE_URL", default_value = "http://localhost:8083")]
    base_url: String,

    /// Account email used to log in
    #[arg(long, env = "PROBE_EMAIL", default_value = "user1@test.com")]
    email: String,

    /// Account password used to log in
    #[arg(long, env = "PROBE_PASSWORD", default_value = "pw1", hide_default_value = true)]
    password: String,

    /// Existing bearer token; skips the login request when given
    #[arg(long, env = "PROBE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr and stay silent unless RUST_LOG is set
    if let Ok(filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let config = Config {
        base_url: cli.base_url,
        email: cli.email,
        password: cli.password,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_poll_command() {
        let cli = Cli::try_parse_from([
            "probe",
            "--base-url",
            "http://backend:8083",
            "banner",
            "poll",
            "task-1",
            "--max-attempts",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.base_url, "http://backend:8083");
        assert!(matches!(cli.command, Commands::Banner { .. }));
    }
}
