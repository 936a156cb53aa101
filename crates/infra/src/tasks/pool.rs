//! Worker pool: fixed number of tokio workers pulling from one queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handler::{TaskContext, TaskHandler};
use super::queue::TaskQueue;
use super::types::{QueueName, Task, TaskState};

/// Runtime statistics for one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub processed: u64,
    pub succeeded: u64,
    pub retried: u64,
    pub failed: u64,
    pub running: usize,
}

/// Handle to a running pool.
#[derive(Debug)]
pub struct WorkerPool {
    queue: QueueName,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerPool {
    /// Spawn `queue.config().concurrency` workers. They stop pulling once
    /// `shutdown` becomes `true`; in-flight tasks run to completion.
    pub fn spawn(
        queue: Arc<TaskQueue>,
        handler: Arc<dyn TaskHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let concurrency = queue.config().concurrency.max(1);

        let workers = (0..concurrency)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    queue.clone(),
                    handler.clone(),
                    shutdown.clone(),
                    stats.clone(),
                ))
            })
            .collect();

        info!(queue = %queue.name(), concurrency, "worker pool started");
        Self {
            queue: queue.name(),
            workers,
            stats,
        }
    }

    pub fn queue(&self) -> QueueName {
        self.queue
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait for every worker to exit (after shutdown was signalled).
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(queue = %self.queue, error = %e, "worker exited abnormally");
            }
        }
        info!(queue = %self.queue, "worker pool stopped");
    }
}

async fn worker_loop(
    worker: usize,
    queue: Arc<TaskQueue>,
    handler: Arc<dyn TaskHandler>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<Mutex<WorkerStats>>,
) {
    debug!(queue = %queue.name(), worker, "worker started");

    while let Some(task) = queue.pull(&mut shutdown).await {
        debug!(
            queue = %queue.name(),
            worker,
            task_id = %task.id,
            attempt = task.attempts_made,
            "claimed task"
        );
        update(&stats, |s| s.running += 1);

        let outcome = run_one(&queue, handler.as_ref(), &task).await;

        update(&stats, |s| {
            s.running = s.running.saturating_sub(1);
            s.processed += 1;
            match outcome {
                Outcome::Succeeded => s.succeeded += 1,
                Outcome::Retrying => s.retried += 1,
                Outcome::Failed => s.failed += 1,
            }
        });
    }

    debug!(queue = %queue.name(), worker, "worker stopped");
}

enum Outcome {
    Succeeded,
    Retrying,
    Failed,
}

async fn run_one(queue: &Arc<TaskQueue>, handler: &dyn TaskHandler, task: &Task) -> Outcome {
    let ctx = TaskContext::new(queue.clone(), task);
    let started = task.processed_on.unwrap_or_else(Utc::now);

    let result = AssertUnwindSafe(handler.handle(&ctx)).catch_unwind().await;

    let (error, retryable) = match result {
        Ok(Ok(value)) => {
            queue.complete(task.id, value, started);
            debug!(queue = %queue.name(), task_id = %task.id, "task completed");
            return Outcome::Succeeded;
        }
        Ok(Err(err)) => {
            warn!(
                queue = %queue.name(),
                task_id = %task.id,
                attempt = task.attempts_made,
                retryable = err.is_retryable(),
                error = %err,
                "task handler failed"
            );
            (err.to_string(), err.is_retryable())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(queue = %queue.name(), task_id = %task.id, panic = %message, "task handler panicked");
            (format!("handler panicked: {message}"), true)
        }
    };

    match queue.fail(task.id, error, retryable, started) {
        TaskState::Delayed => Outcome::Retrying,
        _ => {
            warn!(
                queue = %queue.name(),
                task_id = %task.id,
                attempts = task.attempts_made,
                "task failed permanently"
            );
            Outcome::Failed
        }
    }
}

fn update(stats: &Mutex<WorkerStats>, f: impl FnOnce(&mut WorkerStats)) {
    f(&mut stats.lock().unwrap_or_else(PoisonError::into_inner));
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
