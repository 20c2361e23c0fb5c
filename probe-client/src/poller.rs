//! Banner task poller
//!
//! Follows an asynchronous banner job until it resolves, is reported absent,
//! or the attempt budget runs out. The interval between attempts is fixed:
//! the point is to observe steady-state latency, not to ride out overload.
//!
//! Failure policy per attempt:
//! - not-found ends the poll immediately, a missing handle never becomes valid
//! - a transport failure (connection error, non-2xx other than 404) uses up
//!   the attempt and is remembered as `last_error` on a timeout
//! - a body of the wrong shape aborts with [`PollError::Schema`]

use async_trait::async_trait;
use probe_core::domain::credential::Credential;
use probe_core::domain::outcome::PollOutcome;
use probe_core::domain::task::{TaskHandle, TaskStatus};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{ClientError, Result};

/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay between attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Anything that can answer result and status queries for a task
///
/// [`BackendClient`](crate::BackendClient) is the HTTP implementation.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Result of the task: `Some(payload)` when finished, `None` while pending
    async fn fetch_result(&self, credential: &Credential, handle: &TaskHandle)
    -> Result<Option<Value>>;

    /// Current status of the task
    async fn fetch_status(&self, credential: &Credential, handle: &TaskHandle) -> Result<TaskStatus>;
}

/// Errors that abort a poll instead of producing an outcome
#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poll policy: {0}")]
    InvalidPolicy(String),

    #[error("task {handle}: unexpected response shape on attempt {attempt}: {message}")]
    Schema {
        handle: TaskHandle,
        attempt: u32,
        message: String,
    },
}

/// Attempt budget and spacing of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of queries, at least 1
    pub max_attempts: u32,
    /// Fixed delay between consecutive queries
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn validate(&self) -> std::result::Result<(), PollError> {
        if self.max_attempts == 0 {
            return Err(PollError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a single query observed
enum Probe<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Bounded, fixed-interval poller
///
/// Holds no per-poll state, so one poller can serve any number of concurrent
/// polls.
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    policy: PollPolicy,
}

impl TaskPoller {
    /// Creates a poller, rejecting a zero attempt budget
    pub fn new(policy: PollPolicy) -> std::result::Result<Self, PollError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Polls the result endpoint until the payload is non-null
    pub async fn poll_result<S>(
        &self,
        source: &S,
        handle: &TaskHandle,
        credential: &Credential,
    ) -> std::result::Result<PollOutcome<Value>, PollError>
    where
        S: TaskSource + ?Sized,
    {
        self.run(handle, move || async move {
            Ok::<_, ClientError>(match source.fetch_result(credential, handle).await? {
                Some(payload) => Probe::Ready(payload),
                None => Probe::Pending,
            })
        })
        .instrument(info_span!("poll_result", task = %handle))
        .await
    }

    /// Polls the status endpoint until the job reports a terminal status
    ///
    /// `COMPLETED` yields `Completed` with the status as payload, `FAILED`
    /// yields `Failed`.
    pub async fn poll_status<S>(
        &self,
        source: &S,
        handle: &TaskHandle,
        credential: &Credential,
    ) -> std::result::Result<PollOutcome<TaskStatus>, PollError>
    where
        S: TaskSource + ?Sized,
    {
        self.run(handle, move || async move {
            Ok::<_, ClientError>(match source.fetch_status(credential, handle).await? {
                TaskStatus::Processing => Probe::Pending,
                TaskStatus::Completed => Probe::Ready(TaskStatus::Completed),
                TaskStatus::Failed => Probe::Failed,
            })
        })
        .instrument(info_span!("poll_status", task = %handle))
        .await
    }

    async fn run<T, F, Fut>(
        &self,
        handle: &TaskHandle,
        mut query: F,
    ) -> std::result::Result<PollOutcome<T>, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Probe<T>>>,
    {
        let max_attempts = self.policy.max_attempts;
        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!("Attempt {}/{}", attempt, max_attempts);

            match query().await {
                Ok(Probe::Ready(payload)) => {
                    let elapsed = started.elapsed();
                    info!("Task completed after {} attempt(s) in {:?}", attempt, elapsed);
                    return Ok(PollOutcome::Completed {
                        payload,
                        elapsed,
                        attempts: attempt,
                    });
                }
                Ok(Probe::Failed) => {
                    let elapsed = started.elapsed();
                    info!("Task reported failure on attempt {}", attempt);
                    return Ok(PollOutcome::Failed {
                        elapsed,
                        attempts: attempt,
                    });
                }
                Ok(Probe::Pending) => {
                    debug!("Task still pending");
                }
                Err(e) if e.is_not_found() => {
                    let elapsed = started.elapsed();
                    info!("Task not found on attempt {}", attempt);
                    return Ok(PollOutcome::NotFound {
                        elapsed,
                        attempts: attempt,
                    });
                }
                Err(ClientError::Schema(message)) => {
                    return Err(PollError::Schema {
                        handle: handle.clone(),
                        attempt,
                        message,
                    });
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                time::sleep(self.policy.interval).await;
            }
        }

        let elapsed = started.elapsed();
        info!("Task unresolved after {} attempt(s)", max_attempts);

        Ok(PollOutcome::TimedOut {
            elapsed,
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted reply for one query
    enum Reply {
        Pending,
        Ready(Value),
        NotFound,
        Unavailable,
        Malformed,
        Status(TaskStatus),
    }

    /// Replays a fixed script, repeating the last reply once it runs out
    struct ScriptedSource {
        replies: Mutex<VecDeque<Reply>>,
        fallback: fn() -> Reply,
        latency: Duration,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Reply>, fallback: fn() -> Reply) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback,
                latency: Duration::ZERO,
                calls: AtomicU32::new(0),
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        async fn next(&self) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                time::sleep(self.latency).await;
            }
            let next = self.replies.lock().unwrap().pop_front();
            next.unwrap_or_else(self.fallback)
        }
    }

    #[async_trait]
    impl TaskSource for ScriptedSource {
        async fn fetch_result(&self, _: &Credential, _: &TaskHandle) -> Result<Option<Value>> {
            match self.next().await {
                Reply::Pending => Ok(None),
                Reply::Ready(payload) => Ok(Some(payload)),
                Reply::NotFound => Err(ClientError::NotFound("/ad/ad-banner/result/t".into())),
                Reply::Unavailable => Err(ClientError::api_error(503, "unavailable")),
                Reply::Malformed => Err(ClientError::Schema("data missing".into())),
                Reply::Status(_) => panic!("status reply on result surface"),
            }
        }

        async fn fetch_status(&self, _: &Credential, _: &TaskHandle) -> Result<TaskStatus> {
            match self.next().await {
                Reply::Status(status) => Ok(status),
                Reply::NotFound => Err(ClientError::NotFound("/ad/ad-banner/status/t".into())),
                Reply::Unavailable => Err(ClientError::api_error(503, "unavailable")),
                _ => panic!("result reply on status surface"),
            }
        }
    }

    fn poller(max_attempts: u32) -> TaskPoller {
        TaskPoller::new(PollPolicy {
            max_attempts,
            interval: Duration::from_millis(1000),
        })
        .unwrap()
    }

    /// The paused clock may round each timer up by a millisecond
    fn assert_elapsed(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual <= expected + Duration::from_millis(20),
            "elapsed {:?}, expected about {:?}",
            actual,
            expected
        );
    }

    fn handle() -> TaskHandle {
        TaskHandle::new("task-1").unwrap()
    }

    fn credential() -> Credential {
        Credential::new("token")
    }

    #[test]
    fn test_policy_rejects_zero_attempts() {
        let result = TaskPoller::new(PollPolicy {
            max_attempts: 0,
            interval: Duration::from_millis(1000),
        });
        assert!(matches!(result, Err(PollError::InvalidPolicy(_))));
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.interval, Duration::from_millis(1000));
        assert_eq!(TaskPoller::new(policy).unwrap().policy(), policy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_on_fifth_attempt() {
        let source = ScriptedSource::new(
            vec![
                Reply::Pending,
                Reply::Pending,
                Reply::Pending,
                Reply::Pending,
                Reply::Ready(json!({ "id": 7 })),
            ],
            || Reply::Pending,
        );

        let outcome = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        assert_eq!(outcome.payload(), Some(&json!({ "id": 7 })));
        assert_eq!(outcome.attempts(), 5);
        assert_elapsed(outcome.elapsed(), Duration::from_secs(4));
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_on_first_attempt_stops() {
        let source = ScriptedSource::new(vec![Reply::NotFound], || Reply::Ready(json!(1)));

        let outcome = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::NotFound {
                elapsed: Duration::ZERO,
                attempts: 1,
            }
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_on_kth_attempt_issues_no_more_queries() {
        let source = ScriptedSource::new(
            vec![Reply::Pending, Reply::Pending, Reply::NotFound],
            || Reply::Ready(json!(1)),
        );

        let outcome = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::NotFound { attempts: 3, .. }));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_times_out() {
        let source = ScriptedSource::new(vec![], || Reply::Pending);

        let outcome = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut {
                elapsed,
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 10);
                assert!(last_error.is_none());
                assert_elapsed(elapsed, Duration::from_secs(9));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(source.calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget_is_exact_for_any_bound() {
        for max_attempts in [1, 2, 7] {
            let source = ScriptedSource::new(vec![], || Reply::Pending);
            let outcome = poller(max_attempts)
                .poll_result(&source, &handle(), &credential())
                .await
                .unwrap();

            assert_eq!(outcome.attempts(), max_attempts);
            assert_eq!(outcome.label(), "timed_out");
            assert_eq!(source.calls(), max_attempts);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_includes_request_latency() {
        let source = ScriptedSource::new(
            vec![Reply::Pending, Reply::Pending, Reply::Ready(json!("done"))],
            || Reply::Pending,
        )
        .with_latency(Duration::from_millis(200));

        let outcome = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        // two intervals plus three requests of 200ms each
        assert_eq!(outcome.attempts(), 3);
        assert_elapsed(outcome.elapsed(), Duration::from_millis(2_600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_consume_attempts() {
        let source = ScriptedSource::new(vec![Reply::Unavailable, Reply::Unavailable], || {
            Reply::Pending
        });

        let outcome = poller(3)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.unwrap().contains("503"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_then_success() {
        let source = ScriptedSource::new(
            vec![Reply::Unavailable, Reply::Ready(json!({ "id": 1 }))],
            || Reply::Pending,
        );

        let outcome = poller(5)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_aborts() {
        let source = ScriptedSource::new(vec![Reply::Pending, Reply::Malformed], || {
            Reply::Pending
        });

        let err = poller(10)
            .poll_result(&source, &handle(), &credential())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Schema { attempt: 2, .. }));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_surface() {
        let source = ScriptedSource::new(
            vec![
                Reply::Status(TaskStatus::Processing),
                Reply::Status(TaskStatus::Completed),
            ],
            || Reply::Status(TaskStatus::Processing),
        );
        let outcome = poller(10)
            .poll_status(&source, &handle(), &credential())
            .await
            .unwrap();
        assert_eq!(outcome.payload(), Some(&TaskStatus::Completed));
        assert_eq!(outcome.attempts(), 2);

        let source = ScriptedSource::new(vec![Reply::Status(TaskStatus::Failed)], || {
            Reply::Status(TaskStatus::Processing)
        });
        let outcome = poller(10)
            .poll_status(&source, &handle(), &credential())
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Failed { attempts: 1, .. }));

        let source = ScriptedSource::new(vec![Reply::NotFound], || {
            Reply::Status(TaskStatus::Processing)
        });
        let outcome = poller(10)
            .poll_status(&source, &handle(), &credential())
            .await
            .unwrap();
        assert_eq!(outcome.label(), "not_found");
    }
}
