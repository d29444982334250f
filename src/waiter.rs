//! Waiting on asynchronous Lightsail operations.
//!
//! Mutating Lightsail calls return one or more operations that keep running
//! after the call itself has returned. [`wait`] polls the status of a single
//! operation at a fixed cadence until it reaches a target status, reports a
//! failure, or the deadline passes.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Lower bound on the time a single status fetch gets, so a wait whose
/// deadline has already passed still makes one real attempt.
pub const MIN_FETCH_BUDGET: Duration = Duration::from_secs(1);

/// Identifier of one asynchronous remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OperationHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status reported by the remote system for an operation.
///
/// The remote side does not guarantee an exhaustive set of values, so
/// anything unrecognized is kept verbatim in [`OperationStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationStatus {
    NotStarted,
    Started,
    Failed,
    Completed,
    Succeeded,
    Unknown(String),
}

impl OperationStatus {
    /// Case-insensitive; `_`, `-` and spaces are ignored, so `FAILED`,
    /// `Failed` and `not_started` all parse to a known variant.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "notstarted" => Self::NotStarted,
            "started" => Self::Started,
            "failed" => Self::Failed,
            "completed" => Self::Completed,
            "succeeded" => Self::Succeeded,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Started => "Started",
            Self::Failed => "Failed",
            Self::Completed => "Completed",
            Self::Succeeded => "Succeeded",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OperationStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<OperationStatus> for String {
    fn from(status: OperationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// How to wait for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// Statuses that mean "keep polling".
    pub pending: Vec<OperationStatus>,
    /// Statuses that mean the operation finished successfully.
    pub target: Vec<OperationStatus>,
    /// Settle time before the first poll.
    pub delay: Duration,
    pub poll_interval: Duration,
    /// Total budget, measured from the start of the wait (delay included).
    pub timeout: Duration,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            pending: vec![OperationStatus::NotStarted, OperationStatus::Started],
            target: vec![OperationStatus::Completed, OperationStatus::Succeeded],
            delay: DEFAULT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitSpec {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Failure of a single status fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    /// Transient failures are retried until the wait deadline.
    pub retryable: bool,
}

impl FetchError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for operation {handle} after {attempts} attempt(s){}",
        last_seen(.last_status, .last_error)
    )]
    Timeout {
        handle: OperationHandle,
        attempts: u32,
        last_status: Option<OperationStatus>,
        last_error: Option<String>,
    },

    #[error("operation {handle} finished with status {status}")]
    OperationFailed {
        handle: OperationHandle,
        status: OperationStatus,
    },

    #[error("failed to fetch operation {handle}: {cause}")]
    Fetch {
        handle: OperationHandle,
        #[source]
        cause: FetchError,
    },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn last_seen(status: &Option<OperationStatus>, error: &Option<String>) -> String {
    match (status, error) {
        (Some(status), Some(error)) => format!(" (last status: {status}, last error: {error})"),
        (Some(status), None) => format!(" (last status: {status})"),
        (None, Some(error)) => format!(" (last error: {error})"),
        (None, None) => String::new(),
    }
}

/// The status-fetch capability the waiter polls.
#[async_trait]
pub trait OperationFetcher: Send + Sync {
    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, FetchError>;
}

/// Polls `handle` until it reaches one of `spec.target`.
///
/// At least one fetch is always made, even when the timeout is shorter than
/// the initial delay or the poll interval. Unknown statuses count as pending;
/// a known status outside both sets ends the wait with
/// [`WaitError::OperationFailed`]. Retryable fetch errors are retried until
/// the deadline and surface in [`WaitError::Timeout`].
///
/// Each fetch is bounded by the time left before the deadline (but never
/// less than [`MIN_FETCH_BUDGET`]); a fetch that overruns counts as a
/// retryable error. Dropping the returned future abandons the wait.
pub async fn wait<F>(
    fetcher: &F,
    handle: &OperationHandle,
    spec: &WaitSpec,
) -> Result<OperationStatus, WaitError>
where
    F: OperationFetcher + ?Sized,
{
    let deadline = Instant::now() + spec.timeout;

    if !spec.delay.is_zero() {
        tokio::time::sleep(spec.delay).await;
    }

    let mut attempts = 0u32;
    let mut last_status = None;
    let mut last_error = None;

    loop {
        attempts += 1;

        let budget = deadline
            .saturating_duration_since(Instant::now())
            .max(MIN_FETCH_BUDGET);
        let fetched = tokio::time::timeout(budget, fetcher.get_operation(handle))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::transient(format!(
                    "status fetch did not finish within {:?}",
                    budget
                )))
            });

        match fetched {
            Ok(status) => {
                tracing::debug!(
                    operation = %handle,
                    attempt = attempts,
                    status = %status,
                    "polled operation status"
                );

                if spec.target.contains(&status) {
                    return Ok(status);
                }

                if !status.is_unknown() && !spec.pending.contains(&status) {
                    return Err(WaitError::OperationFailed {
                        handle: handle.clone(),
                        status,
                    });
                }

                last_status = Some(status);
            }
            Err(cause) if cause.retryable => {
                tracing::warn!(
                    operation = %handle,
                    attempt = attempts,
                    error = %cause,
                    "operation status fetch failed, retrying"
                );
                last_error = Some(cause.message);
            }
            Err(cause) => {
                return Err(WaitError::Fetch {
                    handle: handle.clone(),
                    cause,
                });
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                handle: handle.clone(),
                attempts,
                last_status,
                last_error,
            });
        }

        tokio::time::sleep(spec.poll_interval.min(deadline - now)).await;
    }
}
