//! Banner command handlers
//!
//! Handles submitting banner jobs and following them through the result or
//! status endpoint.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use probe_client::{
    BackendClient, PollOutcome, PollPolicy, TaskHandle, TaskPoller, TaskStatus,
    poller::{DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS},
};
use probe_core::dto::banner::BannerSuggestion;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;

/// Banner subcommands
#[derive(Subcommand)]
pub enum BannerCommands {
    /// Submit a banner job and print its task id
    Submit,
    /// Follow an existing task until it resolves
    Poll {
        /// Task id returned by `submit`
        task_id: String,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Poll the status endpoint instead of the result endpoint
        #[arg(long)]
        status: bool,
    },
    /// Query the status of a task once
    Status {
        /// Task id returned by `submit`
        task_id: String,
    },
    /// Submit a banner job and follow it to completion
    Run {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Poll budget flags
#[derive(Args)]
pub struct PolicyArgs {
    /// Maximum number of queries
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Delay between queries in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_millis() as u64)]
    interval_ms: u64,
}

impl PolicyArgs {
    fn poller(&self) -> Result<TaskPoller> {
        Ok(TaskPoller::new(PollPolicy {
            max_attempts: self.max_attempts,
            interval: Duration::from_millis(self.interval_ms),
        })?)
    }
}

/// Handle banner commands
///
/// # Arguments
/// * `command` - The banner command to execute
/// * `config` - The CLI configuration
pub async fn handle_banner_command(command: BannerCommands, config: &Config) -> Result<()> {
    let client = BackendClient::new(&config.base_url);

    match command {
        BannerCommands::Submit => submit(&client, config).await,
        BannerCommands::Poll {
            task_id,
            policy,
            status,
        } => poll(&client, config, &task_id, &policy, status).await,
        BannerCommands::Status { task_id } => status(&client, config, &task_id).await,
        BannerCommands::Run { policy } => run(&client, config, &policy).await,
    }
}

/// Submit a job and print the handle
async fn submit(client: &BackendClient, config: &Config) -> Result<()> {
    let credential = config.credential(client).await?;
    let handle = client.submit_banner(&credential).await?;

    println!("{} Submitted banner job", "✓".green());
    println!("  Task: {}", handle.to_string().cyan());

    Ok(())
}

/// Poll an existing task
async fn poll(
    client: &BackendClient,
    config: &Config,
    task_id: &str,
    policy: &PolicyArgs,
    use_status: bool,
) -> Result<()> {
    let handle = TaskHandle::new(task_id)?;
    let poller = policy.poller()?;
    let credential = config.credential(client).await?;

    if use_status {
        let outcome = poller.poll_status(client, &handle, &credential).await?;
        print_outcome(&handle, &outcome, |status| format!("{:?}", status));
        ensure_completed(&outcome)
    } else {
        let outcome = poller.poll_result(client, &handle, &credential).await?;
        print_outcome(&handle, &outcome, describe_payload);
        ensure_completed(&outcome)
    }
}

/// Query the status once
async fn status(client: &BackendClient, config: &Config, task_id: &str) -> Result<()> {
    let handle = TaskHandle::new(task_id)?;
    let credential = config.credential(client).await?;

    let status = client.banner_status(&credential, &handle).await?;
    println!("  Task:   {}", handle.to_string().cyan());
    println!("  Status: {}", colorize_status(status));

    Ok(())
}

/// Submit and follow to completion
async fn run(client: &BackendClient, config: &Config, policy: &PolicyArgs) -> Result<()> {
    let poller = policy.poller()?;
    let credential = config.credential(client).await?;

    let handle = client.submit_banner(&credential).await?;
    println!("{} Submitted banner job {}", "▸".cyan(), handle.to_string().dimmed());

    let outcome = poller.poll_result(client, &handle, &credential).await?;
    print_outcome(&handle, &outcome, describe_payload);
    ensure_completed(&outcome)
}

/// Print a poll outcome
fn print_outcome<T>(handle: &TaskHandle, outcome: &PollOutcome<T>, describe: impl Fn(&T) -> String) {
    println!("{}", "Poll Outcome:".bold());
    println!("  Task:     {}", handle.to_string().cyan());
    println!("  Outcome:  {}", colorize_outcome(outcome));
    println!("  Attempts: {}", outcome.attempts());
    println!("  Elapsed:  {}ms", outcome.elapsed_ms());

    match outcome {
        PollOutcome::Completed { payload, .. } => {
            println!("\n{}", "Result:".bold());
            println!("{}", describe(payload));
        }
        PollOutcome::TimedOut {
            last_error: Some(error),
            ..
        } => {
            println!("\n{}", "Last error:".bold());
            println!("{}", error.red());
        }
        _ => {}
    }
}

/// Render a result payload, using the banner shape when it matches
fn describe_payload(payload: &Value) -> String {
    match BannerSuggestion::from_payload(payload) {
        Some(banner) => {
            let mut text = format!("  {} (vas {})", banner.vas_name.bold(), banner.vas_id);
            if let Some(description) = banner.description {
                text.push_str(&format!("\n  {}", description));
            }
            text
        }
        None => serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
    }
}

/// Turn a non-completed outcome into a failing exit status
fn ensure_completed<T>(outcome: &PollOutcome<T>) -> Result<()> {
    if !outcome.is_completed() {
        bail!(
            "task did not complete ({}) after {} attempt(s)",
            outcome.label(),
            outcome.attempts()
        );
    }
    Ok(())
}

/// Colorize a poll outcome for display
fn colorize_outcome<T>(outcome: &PollOutcome<T>) -> ColoredString {
    let label = outcome.label();
    match outcome {
        PollOutcome::Completed { .. } => label.green(),
        PollOutcome::NotFound { .. } => label.red(),
        PollOutcome::TimedOut { .. } => label.yellow(),
        PollOutcome::Failed { .. } => label.red(),
    }
}

/// Colorize task status for display
fn colorize_status(status: TaskStatus) -> ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        TaskStatus::Processing => status_str.yellow(),
        TaskStatus::Completed => status_str.green(),
        TaskStatus::Failed => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_payload_prefers_banner_shape() {
        colored::control::set_override(false);

        let text = describe_payload(&json!({ "vasId": 4, "vasName": "Cloud", "description": "50GB" }));
        assert!(text.contains("Cloud (vas 4)"));
        assert!(text.contains("50GB"));

        let text = describe_payload(&json!({ "id": 7 }));
        assert!(text.contains("\"id\": 7"));
    }

    #[test]
    fn test_ensure_completed() {
        let done = PollOutcome::Completed {
            payload: (),
            elapsed: Duration::ZERO,
            attempts: 1,
        };
        assert!(ensure_completed(&done).is_ok());

        let missing: PollOutcome<()> = PollOutcome::NotFound {
            elapsed: Duration::ZERO,
            attempts: 1,
        };
        let err = ensure_completed(&missing).unwrap_err();
        assert!(err.to_string().contains("not_found"));
    }
}
