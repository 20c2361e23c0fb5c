//! Banner task domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Returned when an empty string is offered as a task handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task handle cannot be empty")]
pub struct EmptyHandle;

/// Opaque identifier of a submitted banner-generation job
///
/// The backend hands one out per submission. It has no structure the caller
/// can rely on and is consumed by exactly one poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Wraps a raw identifier, rejecting empty or whitespace-only input
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyHandle> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyHandle);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskHandle {
    type Error = EmptyHandle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskHandle> for String {
    fn from(handle: TaskHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported by the status-only polling surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}
