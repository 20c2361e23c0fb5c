//! Probe Runner
//!
//! Load harness that drives the backend with concurrent virtual users.
//!
//! Architecture:
//! - Configuration: Load settings from `PROBE_*` environment variables
//! - Scenarios: The request mix and checks of one iteration
//! - Services: Metrics collection shared by all virtual users
//! - Scheduler: Spawns and retires VUs to follow the load profile
//!
//! Setup logs in every configured account once. Each VU then runs its
//! scenario in a loop with its own credential until the profile ends, and
//! the collected checks and latencies are printed as a summary.

mod config;
mod context;
mod report;
mod scenario;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use probe_client::{BackendClient, Credential, TaskPoller};
use probe_core::domain::credential::Account;
use probe_core::domain::report::RunSummary;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::VuScheduler;
use crate::service::{InMemoryMetrics, MetricsSink};

/// Setup check recorded once per configured account
const CHECK_LOGIN: &str = "login succeeded, token present";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "probe_runner=info,probe_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Probe Runner");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: run_id={}, base_url={}, scenario={}",
        config.run_id,
        config.base_url,
        config.scenario.name()
    );

    // Initialize backend client
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(BackendClient::with_client(
        config.base_url.clone(),
        http_client,
    ));

    let scenario = scenario::build(config.scenario);
    let metrics = InMemoryMetrics::new();

    // Log in every simulated account once
    let credentials = if scenario.requires_login() {
        info!("Logging in {} account(s)", config.accounts.len());
        login_all(&client, &config.accounts, &metrics).await?
    } else {
        Vec::new()
    };

    let poller = TaskPoller::new(config.poll)?;
    let policy = poller.policy();
    info!(
        "Poll policy: max_attempts={}, interval={:?}",
        policy.max_attempts, policy.interval
    );

    let scheduler = VuScheduler::new(
        config.clone(),
        scenario,
        client,
        credentials,
        poller,
        metrics,
    );

    let summary = match scheduler.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Run failed: {:#}", e);
            return Err(e);
        }
    };

    println!("{}", report::render(&summary));

    if let Some(path) = &config.summary_path {
        report::write_json(path, &summary)?;
        info!("Summary written to {}", path.display());
    }

    enforce_checks(&config, &summary)
}

/// Fails the run when checks failed and `fail_on_checks` is set
fn enforce_checks(config: &Config, summary: &RunSummary) -> Result<()> {
    if config.fail_on_checks && summary.has_failed_checks() {
        let overall = summary.overall_checks();
        anyhow::bail!("{} of {} check(s) failed", overall.fails, overall.total());
    }

    Ok(())
}

/// Loads configuration from environment variables and validates it
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Logs in every account, in order
///
/// Each login is recorded as a setup check. Accounts that cannot log in are
/// skipped; the run only fails when none of them could.
async fn login_all(
    client: &BackendClient,
    accounts: &[Account],
    metrics: &dyn MetricsSink,
) -> Result<Vec<Credential>> {
    let mut credentials = Vec::with_capacity(accounts.len());
    for account in accounts {
        match login_with_retry(client, account).await {
            Ok(credential) => {
                metrics.record_check(CHECK_LOGIN, true);
                credentials.push(credential);
            }
            Err(e) => {
                metrics.record_check(CHECK_LOGIN, false);
                warn!("Skipping account: {:#}", e);
            }
        }
    }

    if credentials.is_empty() {
        anyhow::bail!("None of the {} account(s) could log in", accounts.len());
    }
    Ok(credentials)
}

/// Log in with retry logic and exponential backoff
///
/// This handles the case where the backend is still starting up when the
/// run begins. Rejected credentials are not retried.
async fn login_with_retry(client: &BackendClient, account: &Account) -> Result<Credential> {
    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 8_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match client.login(&account.email, &account.password).await {
            Ok(credential) => {
                if attempt > 1 {
                    info!(
                        "Logged in as {} after {} attempt(s)",
                        account.email, attempt
                    );
                }
                return Ok(credential);
            }
            Err(e) if e.is_client_error() || e.is_not_found() || e.is_schema() => {
                return Err(anyhow::anyhow!("Login as {} failed: {}", account.email, e));
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!("Failed to log in as {} after {} attempts", account.email, MAX_RETRIES);
                    return Err(anyhow::anyhow!("Login as {} failed: {}", account.email, e));
                }

                warn!(
                    "Login as {} failed (attempt {}/{}): {}",
                    account.email, attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
