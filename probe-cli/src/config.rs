//! Configuration module
//!
//! Handles CLI configuration: backend URL and how to obtain a credential.

use anyhow::{Context, Result};
use probe_client::{BackendClient, Credential};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the backend under test
    pub base_url: String,
    /// Account email used when no token is given
    pub email: String,
    /// Account password used when no token is given
    pub password: String,
    /// Pre-issued bearer token
    pub token: Option<String>,
}

impl Config {
    /// Returns the configured token, or logs in to obtain one
    pub async fn credential(&self, client: &BackendClient) -> Result<Credential> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credential::new(token));
        }

        client
            .login(&self.email, &self.password)
            .await
            .with_context(|| format!("Failed to log in as {}", self.email))
    }
}
