//! Metrics service
//!
//! Collects request latencies, check results, iteration counts and poll
//! outcomes from all virtual users of a run. Everything is kept in memory
//! and summarised once the run ends.

use chrono::{DateTime, Utc};
use probe_core::domain::report::{CheckTally, LatencyStats, RunSummary};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Key under which polls that aborted with an error are counted
pub const POLL_ERROR_LABEL: &str = "error";

/// Service for recording what virtual users observe
pub trait MetricsSink: Send + Sync {
    /// Records a request that produced a response
    ///
    /// # Arguments
    /// * `name` - Tag of the request (e.g. "plans")
    /// * `duration` - Time until the full body was read
    /// * `ok` - Whether the status was 2xx
    fn record_request(&self, name: &str, duration: Duration, ok: bool);

    /// Records a request that produced no response at all
    fn record_request_error(&self, name: &str);

    /// Records one evaluation of a named check
    fn record_check(&self, name: &str, passed: bool);

    /// Records a finished iteration
    fn record_iteration(&self);

    /// Records how a banner poll ended
    fn record_poll(&self, label: &str, elapsed: Duration);

    /// Records the number of currently active virtual users
    fn record_active_vus(&self, active: u32);
}

#[derive(Default)]
struct MetricsState {
    iterations: u64,
    vus_max: u32,
    failed_requests: u64,
    checks: BTreeMap<String, CheckTally>,
    samples: BTreeMap<String, Vec<Duration>>,
    request_errors: BTreeMap<String, u64>,
    poll_outcomes: BTreeMap<String, u64>,
    poll_elapsed: Vec<Duration>,
}

/// In-memory implementation of MetricsSink
///
/// Uses Arc<Mutex<..>> for shared access across VU tasks. The lock is
/// never held across an await point.
#[derive(Clone, Default)]
pub struct InMemoryMetrics {
    state: Arc<Mutex<MetricsState>>,
}

impl InMemoryMetrics {
    /// Creates an empty metrics store
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the run summary from everything recorded so far
    pub fn summarize(
        &self,
        scenario: &str,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> RunSummary {
        let state = self.state();

        let requests = state
            .samples
            .iter()
            .filter_map(|(name, samples)| {
                LatencyStats::from_samples(samples).map(|stats| (name.clone(), stats))
            })
            .collect();

        RunSummary {
            scenario: scenario.to_string(),
            started_at,
            finished_at,
            iterations: state.iterations,
            vus_max: state.vus_max,
            failed_requests: state.failed_requests,
            checks: state.checks.clone(),
            requests,
            request_errors: state.request_errors.clone(),
            poll_outcomes: state.poll_outcomes.clone(),
            poll_elapsed: LatencyStats::from_samples(&state.poll_elapsed),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_request(&self, name: &str, duration: Duration, ok: bool) {
        let mut state = self.state();
        state
            .samples
            .entry(name.to_string())
            .or_default()
            .push(duration);
        if !ok {
            state.failed_requests += 1;
        }
    }

    fn record_request_error(&self, name: &str) {
        let mut state = self.state();
        state.failed_requests += 1;
        *state.request_errors.entry(name.to_string()).or_default() += 1;
    }

    fn record_check(&self, name: &str, passed: bool) {
        self.state()
            .checks
            .entry(name.to_string())
            .or_default()
            .record(passed);
    }

    fn record_iteration(&self) {
        self.state().iterations += 1;
    }

    fn record_poll(&self, label: &str, elapsed: Duration) {
        let mut state = self.state();
        *state.poll_outcomes.entry(label.to_string()).or_default() += 1;
        if label != POLL_ERROR_LABEL {
            state.poll_elapsed.push(elapsed);
        }
    }

    fn record_active_vus(&self, active: u32) {
        let mut state = self.state();
        state.vus_max = state.vus_max.max(active);
    }
}
