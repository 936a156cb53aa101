//! Core task types and per-queue policies.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use talentflow_core::TenantId;

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The four independent queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
    TextGeneration,
    ImageGeneration,
    Publication,
    Email,
}

impl QueueName {
    pub const ALL: [QueueName; 4] = [
        QueueName::TextGeneration,
        QueueName::ImageGeneration,
        QueueName::Publication,
        QueueName::Email,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueName::TextGeneration => "text-generation",
            QueueName::ImageGeneration => "image-generation",
            QueueName::Publication => "publication",
            QueueName::Email => "email",
        }
    }

    /// Suffix used by `QUEUE_<NAME>_*` environment overrides.
    pub fn env_key(self) -> &'static str {
        match self {
            QueueName::TextGeneration => "TEXT_GENERATION",
            QueueName::ImageGeneration => "IMAGE_GENERATION",
            QueueName::Publication => "PUBLICATION",
            QueueName::Email => "EMAIL",
        }
    }

    /// Priority used when the caller does not pick one. Lower is served first.
    pub fn default_priority(self) -> u32 {
        match self {
            QueueName::TextGeneration | QueueName::ImageGeneration => 5,
            QueueName::Publication | QueueName::Email => 0,
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueName::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| format!("unknown queue `{s}`"))
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Ready to be pulled.
    Waiting,
    /// Waiting out a retry backoff.
    Delayed,
    /// Claimed by a worker.
    Active,
    Completed,
    /// Attempts exhausted or permanent error.
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Retry schedule: exponential backoff doubling from `base_delay`, capped at
/// `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(2), Duration::from_secs(60))
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Constant delay: the cap equals the base, so doubling never shows.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::exponential(max_attempts, delay, delay)
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// How long finished tasks stay queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep_completed: usize,
    pub completed_max_age: Duration,
    pub keep_failed: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_completed: 100,
            completed_max_age: Duration::from_secs(24 * 60 * 60),
            keep_failed: 50,
        }
    }
}

/// Per-queue construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub retention: RetentionPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            retry: RetryPolicy::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}

/// Record of one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAttemptRecord {
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// A queue-resident task. Never persisted outside its queue.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub queue: QueueName,
    pub payload: serde_json::Value,
    pub priority: u32,
    pub state: TaskState,
    pub progress: u8,
    pub attempts_made: u32,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Start of the latest attempt.
    pub processed_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    /// Earliest time a delayed task may be pulled again.
    pub ready_at: DateTime<Utc>,
    pub history: Vec<TaskAttemptRecord>,
}

impl Task {
    pub fn new(queue: QueueName, payload: serde_json::Value, priority: u32) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            queue,
            payload,
            priority,
            state: TaskState::Waiting,
            progress: 0,
            attempts_made: 0,
            result: None,
            error: None,
            created_at: now,
            processed_on: None,
            finished_on: None,
            ready_at: now,
            history: Vec::new(),
        }
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            task_id: self.id,
            queue_name: self.queue,
        }
    }

    /// Tenant named by the payload's `tenantId`, if any.
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.payload
            .get("tenantId")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Claim for a new attempt.
    pub fn mark_active(&mut self, now: DateTime<Utc>) {
        self.state = TaskState::Active;
        self.attempts_made += 1;
        self.progress = 0;
        self.processed_on = Some(now);
    }

    pub fn mark_completed(&mut self, result: serde_json::Value, started_at: DateTime<Utc>) {
        let now = Utc::now();
        self.record_attempt(started_at, now, None);
        self.state = TaskState::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.error = None;
        self.finished_on = Some(now);
    }

    /// Record a failed attempt; goes to `Delayed` when `retry` allows another
    /// attempt under `policy`, otherwise to `Failed`.
    pub fn mark_failed(
        &mut self,
        error: String,
        started_at: DateTime<Utc>,
        retry: bool,
        policy: &RetryPolicy,
    ) {
        let now = Utc::now();
        self.record_attempt(started_at, now, Some(error.clone()));
        self.error = Some(error);

        if retry && policy.should_retry(self.attempts_made) {
            let delay = policy.delay_for_attempt(self.attempts_made);
            self.ready_at = now + chrono::Duration::from_std(delay).unwrap_or_default();
            self.state = TaskState::Delayed;
        } else {
            self.state = TaskState::Failed;
            self.finished_on = Some(now);
        }
    }

    /// Reset a failed task for a manual retry.
    pub fn reset_for_retry(&mut self) {
        self.state = TaskState::Waiting;
        self.attempts_made = 0;
        self.progress = 0;
        self.error = None;
        self.finished_on = None;
        self.ready_at = Utc::now();
    }

    fn record_attempt(
        &mut self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: Option<String>,
    ) {
        self.history.push(TaskAttemptRecord {
            attempt: self.attempts_made,
            started_at,
            finished_at,
            success: error.is_none(),
            error,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        });
    }

    pub fn view(&self) -> TaskStatusView {
        TaskStatusView {
            id: self.id,
            name: self.queue.as_str().to_string(),
            state: self.state,
            progress: self.progress,
            priority: self.priority,
            result: self.result.clone(),
            error: self.error.clone(),
            attempts_made: self.attempts_made,
            processed_on: self.processed_on,
            finished_on: self.finished_on,
            history: self.history.clone(),
        }
    }
}

/// Returned by enqueue: enough to poll status later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub task_id: TaskId,
    pub queue_name: QueueName,
}

/// Status query view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusView {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
    pub progress: u8,
    pub priority: u32,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub attempts_made: u32,
    pub processed_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    pub history: Vec<TaskAttemptRecord>,
}

/// Per-queue counts by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queue_name: String,
    pub waiting: usize,
    pub delayed: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}
