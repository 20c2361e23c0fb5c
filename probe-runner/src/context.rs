//! Virtual user context
//!
//! Everything one virtual user needs during an iteration:
//! - The shared backend client
//! - Its own credential (if the scenario logs in)
//! - The banner poller and whether to use it
//! - The metrics sink it reports into

use anyhow::{Result, anyhow};
use probe_client::{BackendClient, Credential, PollError, PollOutcome, TaskPoller, TimedResponse};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::service::{MetricsSink, POLL_ERROR_LABEL};

/// Per-VU state shared across the VU's iterations
pub struct VuContext {
    /// Index of the virtual user, stable for its lifetime
    pub vu: u32,

    /// Backend client, shared by all VUs
    pub client: Arc<BackendClient>,

    /// Poller for banner results
    pub poller: TaskPoller,

    /// Whether submitted banner jobs are followed to completion
    pub poll_results: bool,

    credential: Option<Credential>,
    metrics: Arc<dyn MetricsSink>,
}

impl VuContext {
    /// Creates a new VU context
    ///
    /// # Arguments
    /// * `vu` - Index of the virtual user
    /// * `client` - Shared backend client
    /// * `credential` - Bearer credential assigned to this VU, if any
    /// * `poller` - Poller for banner results
    /// * `poll_results` - Whether the banner scenario polls
    /// * `metrics` - Sink for requests, checks and poll outcomes
    pub fn new(
        vu: u32,
        client: Arc<BackendClient>,
        credential: Option<Credential>,
        poller: TaskPoller,
        poll_results: bool,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            vu,
            client,
            poller,
            poll_results,
            credential,
            metrics,
        }
    }

    /// The VU's credential, an error when the run did not log in
    pub fn credential(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| anyhow!("VU {} has no credential", self.vu))
    }

    pub fn metrics(&self) -> &dyn MetricsSink {
        self.metrics.as_ref()
    }

    /// Issues a tagged GET and records it
    ///
    /// Returns `None` when no response arrived at all; the failure is
    /// recorded and logged.
    pub async fn get(
        &self,
        name: &str,
        path: &str,
        credential: Option<&Credential>,
    ) -> Option<TimedResponse> {
        match self.client.timed_get(path, credential).await {
            Ok(response) => {
                self.metrics
                    .record_request(name, response.duration, response.status.is_success());
                Some(response)
            }
            Err(e) => {
                warn!("VU {}: {} request failed: {}", self.vu, name, e);
                self.metrics.record_request_error(name);
                None
            }
        }
    }

    /// Records one evaluation of a check and returns whether it passed
    pub fn check(&self, name: &str, passed: bool) -> bool {
        if !passed {
            debug!("VU {}: check failed: {}", self.vu, name);
        }
        self.metrics.record_check(name, passed);
        passed
    }

    /// Records the outcome of a banner poll
    pub fn record_poll<T>(&self, result: &Result<PollOutcome<T>, PollError>) {
        match result {
            Ok(outcome) => self.metrics.record_poll(outcome.label(), outcome.elapsed()),
            Err(e) => {
                warn!("VU {}: poll aborted: {}", self.vu, e);
                self.metrics
                    .record_poll(POLL_ERROR_LABEL, std::time::Duration::ZERO);
            }
        }
    }
}
