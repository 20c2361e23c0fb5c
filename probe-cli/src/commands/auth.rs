//! Login command handler

use anyhow::Result;
use colored::*;
use probe_client::BackendClient;

use crate::config::Config;

/// Log in and print the token, so it can be reused via `--token`
pub async fn handle_login(config: &Config) -> Result<()> {
    let client = BackendClient::new(&config.base_url);
    let credential = config.credential(&client).await?;

    println!("{} Logged in as {}", "✓".green(), config.email.cyan());
    println!("{}", credential.token());

    Ok(())
}
