//! Runner configuration
//!
//! Defines every tunable of a load run: target backend, scenario, load shape,
//! simulated accounts and the banner poll budget. Values come from `PROBE_*`
//! environment variables with defaults matching a local backend.

use anyhow::{Context, Result};
use probe_client::PollPolicy;
use probe_core::domain::credential::Account;
use probe_core::domain::load::{LoadProfile, Stage, parse_duration};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default backend under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:8083";

/// Default simulated account
pub const DEFAULT_ACCOUNTS: &str = "user1@test.com:pw1";

/// Which request mix each virtual user runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Submit a banner job and follow it to completion
    Banner,
    /// Read plans, value-added services and coupons
    Catalog,
    /// Fetch personalised recommendations
    Recommend,
}

impl ScenarioKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Banner => "banner",
            ScenarioKind::Catalog => "catalog",
            ScenarioKind::Recommend => "recommend",
        }
    }

    /// Load shape used when neither stages nor VUs/duration are configured
    pub fn default_profile(&self) -> LoadProfile {
        match self {
            ScenarioKind::Banner | ScenarioKind::Catalog => LoadProfile::Constant {
                vus: 10,
                duration: Duration::from_secs(30),
            },
            ScenarioKind::Recommend => LoadProfile::Ramping {
                stages: vec![
                    Stage::new(Duration::from_secs(30), 5),
                    Stage::new(Duration::from_secs(60), 10),
                    Stage::new(Duration::from_secs(60), 15),
                    Stage::new(Duration::from_secs(30), 0),
                ],
            },
        }
    }

    /// Pause between two iterations of one virtual user
    pub fn default_think_time(&self) -> Duration {
        match self {
            ScenarioKind::Banner | ScenarioKind::Catalog => Duration::from_secs(1),
            ScenarioKind::Recommend => Duration::from_secs(2),
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "banner" => Ok(ScenarioKind::Banner),
            "catalog" => Ok(ScenarioKind::Catalog),
            "recommend" => Ok(ScenarioKind::Recommend),
            other => anyhow::bail!(
                "unknown scenario '{}', expected banner, catalog or recommend",
                other
            ),
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of this run, attached to log output
    pub run_id: String,

    /// Backend base URL (e.g., "http://localhost:8083")
    pub base_url: String,

    /// Scenario every virtual user runs
    pub scenario: ScenarioKind,

    /// How many virtual users are active over time
    pub load: LoadProfile,

    /// Accounts logged in during setup, assigned to VUs round-robin
    pub accounts: Vec<Account>,

    /// Attempt budget and interval for banner result polling
    pub poll: PollPolicy,

    /// Whether the banner scenario follows each submitted job
    pub poll_results: bool,

    /// Pause between iterations of one virtual user
    pub think_time: Duration,

    /// Per-request timeout of the HTTP client
    pub request_timeout: Duration,

    /// How long retired VUs may take to finish their iteration at the end
    pub graceful_stop: Duration,

    /// Exit non-zero when any check failed
    pub fail_on_checks: bool,

    /// Where to write the JSON summary, if anywhere
    pub summary_path: Option<PathBuf>,
}

impl Config {
    /// Creates a configuration for a scenario with its default shape
    pub fn new(base_url: String, scenario: ScenarioKind) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            base_url,
            scenario,
            load: scenario.default_profile(),
            accounts: vec![Account::new("user1@test.com", "pw1")],
            poll: PollPolicy::default(),
            poll_results: true,
            think_time: scenario.default_think_time(),
            request_timeout: Duration::from_secs(10),
            graceful_stop: Duration::from_secs(30),
            fail_on_checks: false,
            summary_path: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised variables (all optional):
    /// - PROBE_BASE_URL (default: http://localhost:8083)
    /// - PROBE_SCENARIO (banner | catalog | recommend, default: banner)
    /// - PROBE_STAGES (e.g. `30s:5,1m:10,30s:0`, overrides VUS/DURATION)
    /// - PROBE_VUS, PROBE_DURATION (constant load)
    /// - PROBE_ACCOUNTS (`email:password,...`)
    /// - PROBE_POLL_MAX_ATTEMPTS (default: 10)
    /// - PROBE_POLL_INTERVAL_MS (default: 1000)
    /// - PROBE_POLL_RESULTS (default: true)
    /// - PROBE_THINK_TIME, PROBE_REQUEST_TIMEOUT, PROBE_GRACEFUL_STOP (durations)
    /// - PROBE_FAIL_ON_CHECKS (default: false)
    /// - PROBE_SUMMARY_JSON (path)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("PROBE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let scenario = match lookup("PROBE_SCENARIO") {
            Some(raw) => raw.parse::<ScenarioKind>()?,
            None => ScenarioKind::Banner,
        };

        let mut config = Self::new(base_url, scenario);

        if let Some(stages) = lookup("PROBE_STAGES") {
            config.load = LoadProfile::parse_stages(&stages).context("Invalid PROBE_STAGES")?;
        } else if lookup("PROBE_VUS").is_some() || lookup("PROBE_DURATION").is_some() {
            let vus = parse_var(&lookup, "PROBE_VUS")?.unwrap_or(10);
            let duration = duration_var(&lookup, "PROBE_DURATION")?.unwrap_or(Duration::from_secs(30));
            config.load = LoadProfile::Constant { vus, duration };
        }

        let accounts = lookup("PROBE_ACCOUNTS").unwrap_or_else(|| DEFAULT_ACCOUNTS.to_string());
        config.accounts = Account::parse_list(&accounts)
            .map_err(anyhow::Error::msg)
            .context("Invalid PROBE_ACCOUNTS")?;

        if let Some(max_attempts) = parse_var(&lookup, "PROBE_POLL_MAX_ATTEMPTS")? {
            config.poll.max_attempts = max_attempts;
        }
        if let Some(interval_ms) = parse_var::<u64>(&lookup, "PROBE_POLL_INTERVAL_MS")? {
            config.poll.interval = Duration::from_millis(interval_ms);
        }
        if let Some(poll_results) = parse_var(&lookup, "PROBE_POLL_RESULTS")? {
            config.poll_results = poll_results;
        }
        if let Some(think_time) = duration_var(&lookup, "PROBE_THINK_TIME")? {
            config.think_time = think_time;
        }
        if let Some(timeout) = duration_var(&lookup, "PROBE_REQUEST_TIMEOUT")? {
            config.request_timeout = timeout;
        }
        if let Some(grace) = duration_var(&lookup, "PROBE_GRACEFUL_STOP")? {
            config.graceful_stop = grace;
        }
        if let Some(fail_on_checks) = parse_var(&lookup, "PROBE_FAIL_ON_CHECKS")? {
            config.fail_on_checks = fail_on_checks;
        }
        config.summary_path = lookup("PROBE_SUMMARY_JSON").map(PathBuf::from);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.load.max_vus() == 0 {
            anyhow::bail!("load profile must ask for at least one virtual user");
        }

        if self.load.total_duration().is_zero() {
            anyhow::bail!("load profile duration must be greater than 0");
        }

        if self.accounts.is_empty() {
            anyhow::bail!("at least one account is required");
        }

        self.poll.validate()?;

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string(), ScenarioKind::Banner)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} has an invalid value '{}'", key, raw))
        })
        .transpose()
}

fn duration_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    lookup(key)
        .map(|raw| parse_duration(&raw).with_context(|| format!("Invalid {}", key)))
        .transpose()
}
