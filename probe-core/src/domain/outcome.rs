//! Terminal result of polling a banner task

use serde::Serialize;
use std::time::Duration;

/// How a poll ended
///
/// The variants are kept apart because they mean different things to a
/// caller measuring service health: `NotFound` points at a routing or data
/// defect upstream, `TimedOut` only says the job is slow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome<T> {
    /// The task resolved with a payload on attempt `attempts`
    Completed {
        payload: T,
        #[serde(with = "millis")]
        elapsed: Duration,
        attempts: u32,
    },
    /// The backend reported the handle as unknown
    NotFound {
        #[serde(with = "millis")]
        elapsed: Duration,
        attempts: u32,
    },
    /// The attempt budget ran out before the task resolved
    TimedOut {
        #[serde(with = "millis")]
        elapsed: Duration,
        attempts: u32,
        /// Message of the last transport failure, if any attempt failed
        last_error: Option<String>,
    },
    /// The status surface reported the job as failed
    Failed {
        #[serde(with = "millis")]
        elapsed: Duration,
        attempts: u32,
    },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts, .. }
            | PollOutcome::NotFound { attempts, .. }
            | PollOutcome::TimedOut { attempts, .. }
            | PollOutcome::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Completed { elapsed, .. }
            | PollOutcome::NotFound { elapsed, .. }
            | PollOutcome::TimedOut { elapsed, .. }
            | PollOutcome::Failed { elapsed, .. } => *elapsed,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }

    /// Short stable name used as a metric key
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Completed { .. } => "completed",
            PollOutcome::NotFound { .. } => "not_found",
            PollOutcome::TimedOut { .. } => "timed_out",
            PollOutcome::Failed { .. } => "failed",
        }
    }

    /// The payload of a completed poll
    pub fn payload(&self) -> Option<&T> {
        match self {
            PollOutcome::Completed { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
