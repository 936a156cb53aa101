//! The process-wide set of queues, constructed once and shared by reference.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use talentflow_core::TenantId;

use super::error::QueueError;
use super::handler::TaskHandler;
use super::pool::{WorkerPool, WorkerStats};
use super::queue::TaskQueue;
use super::types::{QueueConfig, QueueName, QueueStats, TaskHandle, TaskId, TaskStatusView};

#[derive(Debug)]
pub struct QueueRegistry {
    queues: BTreeMap<QueueName, Arc<TaskQueue>>,
}

impl QueueRegistry {
    /// One queue per [`QueueName`], configured by `config_for`.
    pub fn new(config_for: impl Fn(QueueName) -> QueueConfig) -> Self {
        let queues = QueueName::ALL
            .into_iter()
            .map(|name| (name, Arc::new(TaskQueue::new(name, config_for(name)))))
            .collect();
        Self { queues }
    }

    pub fn with_defaults() -> Self {
        Self::new(|_| QueueConfig::default())
    }

    pub fn queue(&self, name: QueueName) -> &Arc<TaskQueue> {
        // every QueueName is inserted by `new`
        &self.queues[&name]
    }

    pub fn enqueue<P: Serialize>(
        &self,
        name: QueueName,
        payload: &P,
        priority: Option<u32>,
    ) -> Result<TaskHandle, QueueError> {
        let value =
            serde_json::to_value(payload).map_err(|e| QueueError::Payload(e.to_string()))?;
        self.queue(name).enqueue(value, priority)
    }

    pub fn status(&self, name: QueueName, id: TaskId) -> Option<TaskStatusView> {
        self.queue(name).status(id)
    }

    pub fn stats(&self) -> Vec<QueueStats> {
        self.queues.values().map(|q| q.stats()).collect()
    }

    pub fn list_failed(&self, name: QueueName, limit: usize) -> Vec<TaskStatusView> {
        self.queue(name).list_failed(limit)
    }

    pub fn retry_failed(&self, name: QueueName, id: TaskId) -> Result<TaskHandle, QueueError> {
        self.queue(name).retry_failed(id)
    }

    pub fn status_for_tenant(
        &self,
        name: QueueName,
        id: TaskId,
        tenant_id: TenantId,
    ) -> Option<TaskStatusView> {
        self.queue(name).status_for_tenant(id, tenant_id)
    }

    pub fn list_failed_for_tenant(
        &self,
        name: QueueName,
        tenant_id: TenantId,
        limit: usize,
    ) -> Vec<TaskStatusView> {
        self.queue(name).list_failed_for_tenant(tenant_id, limit)
    }

    pub fn retry_failed_for_tenant(
        &self,
        name: QueueName,
        id: TaskId,
        tenant_id: TenantId,
    ) -> Result<TaskHandle, QueueError> {
        self.queue(name).retry_failed_for_tenant(id, tenant_id)
    }

    /// Start one worker pool per queue that has a handler.
    pub fn start(&self, handlers: HashMap<QueueName, Arc<dyn TaskHandler>>) -> RunningWorkers {
        let (shutdown, rx) = watch::channel(false);
        let mut pools = Vec::new();

        for (name, queue) in &self.queues {
            match handlers.get(name) {
                Some(handler) => pools.push(WorkerPool::spawn(queue.clone(), handler.clone(), rx.clone())),
                None => warn!(queue = %name, "no handler registered; tasks will stay queued"),
            }
        }

        RunningWorkers {
            shutdown,
            pools,
            queues: self.queues.values().cloned().collect(),
        }
    }
}

/// Lifecycle handle for the started pools.
#[derive(Debug)]
pub struct RunningWorkers {
    shutdown: watch::Sender<bool>,
    pools: Vec<WorkerPool>,
    queues: Vec<Arc<TaskQueue>>,
}

impl RunningWorkers {
    pub fn worker_stats(&self) -> Vec<(QueueName, WorkerStats)> {
        self.pools.iter().map(|p| (p.queue(), p.stats())).collect()
    }

    /// Close the queues, stop pulling, and wait for in-flight tasks.
    pub async fn shutdown(self) {
        info!("draining worker pools");
        for queue in &self.queues {
            queue.close();
        }
        let _ = self.shutdown.send(true);
        for pool in self.pools {
            pool.join().await;
        }
    }
}
