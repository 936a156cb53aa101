//! In-process task queue: priority ordering, delayed retries, retention.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tracing::{debug, warn};

use talentflow_core::TenantId;

use super::error::QueueError;
use super::types::{
    QueueConfig, QueueName, QueueStats, Task, TaskHandle, TaskId, TaskState, TaskStatusView,
};

/// Upper bound on how long an idle puller sleeps before re-checking.
const IDLE_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct QueueState {
    tasks: HashMap<TaskId, Task>,
    /// (priority, seq): lower priority first, FIFO within a priority.
    waiting: BTreeSet<(u32, u64, TaskId)>,
    delayed: BTreeSet<(DateTime<Utc>, u64, TaskId)>,
    /// Oldest first.
    completed: VecDeque<TaskId>,
    failed: VecDeque<TaskId>,
    active: usize,
    next_seq: u64,
    closed: bool,
}

impl QueueState {
    fn push_waiting(&mut self, id: TaskId, priority: u32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.waiting.insert((priority, seq, id));
    }

    fn push_delayed(&mut self, id: TaskId, ready_at: DateTime<Utc>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.delayed.insert((ready_at, seq, id));
    }

    fn promote_ready(&mut self, now: DateTime<Utc>) {
        while let Some(&(ready_at, seq, id)) = self.delayed.first() {
            if ready_at > now {
                break;
            }
            self.delayed.remove(&(ready_at, seq, id));
            if let Some(task) = self.tasks.get_mut(&id) {
                task.state = TaskState::Waiting;
                let priority = task.priority;
                self.push_waiting(id, priority);
            }
        }
    }

    fn prune(&mut self, config: &QueueConfig, now: DateTime<Utc>) {
        let retention = &config.retention;
        let max_age = chrono::Duration::from_std(retention.completed_max_age)
            .unwrap_or(chrono::Duration::MAX);

        while let Some(id) = self.completed.front().copied() {
            let expired = self
                .tasks
                .get(&id)
                .and_then(|t| t.finished_on)
                .is_none_or(|finished| now - finished > max_age);
            if self.completed.len() > retention.keep_completed || expired {
                self.completed.pop_front();
                self.tasks.remove(&id);
            } else {
                break;
            }
        }

        while self.failed.len() > retention.keep_failed {
            if let Some(id) = self.failed.pop_front() {
                self.tasks.remove(&id);
            }
        }
    }
}

/// One named queue.
///
/// Pullers block on [`TaskQueue::pull`] until a task is ready, the next
/// delayed task's backoff elapses, or shutdown is signalled.
#[derive(Debug)]
pub struct TaskQueue {
    name: QueueName,
    config: QueueConfig,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl TaskQueue {
    pub fn new(name: QueueName, config: QueueConfig) -> Self {
        Self {
            name,
            config,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    pub fn name(&self) -> QueueName {
        self.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task. Never waits for execution.
    pub fn enqueue(
        &self,
        payload: serde_json::Value,
        priority: Option<u32>,
    ) -> Result<TaskHandle, QueueError> {
        let task = Task::new(
            self.name,
            payload,
            priority.unwrap_or_else(|| self.name.default_priority()),
        );
        let handle = task.handle();

        {
            let mut state = self.state();
            if state.closed {
                return Err(QueueError::Closed(self.name));
            }
            state.push_waiting(task.id, task.priority);
            state.tasks.insert(task.id, task);
        }

        debug!(queue = %self.name, task_id = %handle.task_id, "task enqueued");
        self.notify.notify_one();
        Ok(handle)
    }

    /// Claim the next ready task, if any. Returns a snapshot of the claimed task.
    pub fn try_claim(&self) -> Option<Task> {
        let now = Utc::now();
        let mut state = self.state();
        state.promote_ready(now);

        let (priority, seq, id) = state.waiting.first().copied()?;
        state.waiting.remove(&(priority, seq, id));

        let task = state.tasks.get_mut(&id)?;
        task.mark_active(now);
        let claimed = task.clone();
        state.active += 1;
        Some(claimed)
    }

    /// Blocking pull. Returns `None` once `shutdown` flips to `true` (or its
    /// sender is dropped) and no task was claimed.
    pub async fn pull(&self, shutdown: &mut watch::Receiver<bool>) -> Option<Task> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if *shutdown.borrow() {
                return None;
            }
            if let Some(task) = self.try_claim() {
                return Some(task);
            }

            let wait = self.next_ready_in().unwrap_or(IDLE_WAIT);
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    fn next_ready_in(&self) -> Option<Duration> {
        let state = self.state();
        let &(ready_at, _, _) = state.delayed.first()?;
        Some((ready_at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn report_progress(&self, id: TaskId, progress: u8) {
        if let Some(task) = self.state().tasks.get_mut(&id) {
            task.progress = progress.min(100);
        }
    }

    pub fn complete(&self, id: TaskId, result: serde_json::Value, started_at: DateTime<Utc>) {
        let mut state = self.state();
        let Some(task) = state.tasks.get_mut(&id) else {
            warn!(queue = %self.name, task_id = %id, "completed task vanished");
            return;
        };
        task.mark_completed(result, started_at);
        state.active = state.active.saturating_sub(1);
        state.completed.push_back(id);
        state.prune(&self.config, Utc::now());
    }

    /// Record a failed attempt. Returns the resulting state (`Delayed` or `Failed`).
    pub fn fail(
        &self,
        id: TaskId,
        error: String,
        retryable: bool,
        started_at: DateTime<Utc>,
    ) -> TaskState {
        let next = {
            let mut state = self.state();
            let Some(task) = state.tasks.get_mut(&id) else {
                warn!(queue = %self.name, task_id = %id, "failed task vanished");
                return TaskState::Failed;
            };
            task.mark_failed(error, started_at, retryable, &self.config.retry);
            let (next, ready_at) = (task.state, task.ready_at);

            state.active = state.active.saturating_sub(1);
            match next {
                TaskState::Delayed => state.push_delayed(id, ready_at),
                _ => {
                    state.failed.push_back(id);
                    state.prune(&self.config, Utc::now());
                }
            }
            next
        };

        if next == TaskState::Delayed {
            // Wake a puller so it re-arms its sleep for the new deadline.
            self.notify.notify_one();
        }
        next
    }

    /// Status view, or `None` if unknown or evicted by retention.
    pub fn status(&self, id: TaskId) -> Option<TaskStatusView> {
        self.status_where(id, |_| true)
    }

    /// Like [`TaskQueue::status`], but tasks owned by another tenant (or by
    /// none) are reported as unknown.
    pub fn status_for_tenant(&self, id: TaskId, tenant_id: TenantId) -> Option<TaskStatusView> {
        self.status_where(id, |t| t.tenant_id() == Some(tenant_id))
    }

    fn status_where(&self, id: TaskId, visible: impl Fn(&Task) -> bool) -> Option<TaskStatusView> {
        let mut state = self.state();
        state.prune(&self.config, Utc::now());
        state.tasks.get(&id).filter(|t| visible(&**t)).map(Task::view)
    }

    pub fn stats(&self) -> QueueStats {
        let mut state = self.state();
        state.prune(&self.config, Utc::now());
        QueueStats {
            queue_name: self.name.as_str().to_string(),
            waiting: state.waiting.len(),
            delayed: state.delayed.len(),
            active: state.active,
            completed: state.completed.len(),
            failed: state.failed.len(),
        }
    }

    /// Permanently failed tasks, most recent first.
    pub fn list_failed(&self, limit: usize) -> Vec<TaskStatusView> {
        self.list_failed_where(limit, |_| true)
    }

    pub fn list_failed_for_tenant(&self, tenant_id: TenantId, limit: usize) -> Vec<TaskStatusView> {
        self.list_failed_where(limit, |t| t.tenant_id() == Some(tenant_id))
    }

    fn list_failed_where(&self, limit: usize, visible: impl Fn(&Task) -> bool) -> Vec<TaskStatusView> {
        let state = self.state();
        state
            .failed
            .iter()
            .rev()
            .filter_map(|id| state.tasks.get(id))
            .filter(|t| visible(&**t))
            .take(limit)
            .map(Task::view)
            .collect()
    }

    /// Move a failed task back to waiting with its attempt counter reset.
    pub fn retry_failed(&self, id: TaskId) -> Result<TaskHandle, QueueError> {
        self.retry_failed_where(id, |_| true)
    }

    /// Manual retry limited to `tenant_id`'s own tasks; others are not found.
    pub fn retry_failed_for_tenant(
        &self,
        id: TaskId,
        tenant_id: TenantId,
    ) -> Result<TaskHandle, QueueError> {
        self.retry_failed_where(id, |t| t.tenant_id() == Some(tenant_id))
    }

    fn retry_failed_where(
        &self,
        id: TaskId,
        visible: impl Fn(&Task) -> bool,
    ) -> Result<TaskHandle, QueueError> {
        let handle = {
            let mut state = self.state();
            if state.closed {
                return Err(QueueError::Closed(self.name));
            }
            let task = state
                .tasks
                .get_mut(&id)
                .filter(|t| visible(&**t))
                .ok_or(QueueError::TaskNotFound {
                    queue: self.name,
                    task: id,
                })?;
            if task.state != TaskState::Failed {
                return Err(QueueError::NotFailed(id));
            }
            task.reset_for_retry();
            let (priority, handle) = (task.priority, task.handle());

            state.failed.retain(|f| *f != id);
            state.push_waiting(id, priority);
            handle
        };

        debug!(queue = %self.name, task_id = %id, "failed task re-queued");
        self.notify.notify_one();
        Ok(handle)
    }

    /// Reject further enqueues and wake every puller.
    pub fn close(&self) {
        self.state().closed = true;
        self.notify.notify_waiters();
    }
}
