use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::TaskError;
use super::queue::TaskQueue;
use super::types::{QueueName, Task, TaskId};

/// Everything a handler gets for one attempt.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task_id: TaskId,
    queue: Arc<TaskQueue>,
    payload: serde_json::Value,
    attempt: u32,
}

impl TaskContext {
    pub fn new(queue: Arc<TaskQueue>, task: &Task) -> Self {
        Self {
            task_id: task.id,
            queue,
            payload: task.payload.clone(),
            attempt: task.attempts_made,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn queue_name(&self) -> QueueName {
        self.queue.name()
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn raw_payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, TaskError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// Coarse 0-100 checkpoint; observability only.
    pub fn progress(&self, percent: u8) {
        self.queue.report_progress(self.task_id, percent);
    }
}

/// The function a worker runs for each task of one queue.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    async fn handle(&self, ctx: &TaskContext) -> Result<serde_json::Value, TaskError>;
}
