//! Background task system: named queues, worker pools, retry and retention.
//!
//! ## Components
//!
//! - `TaskQueue`: one named queue with priority ordering, delayed retries and
//!   bounded retention of finished tasks
//! - `WorkerPool`: fixed-concurrency workers running a `TaskHandler`
//! - `QueueRegistry`: the four queues, built once at startup and shared
//! - `payloads`: the JSON schema of each queue

pub mod error;
pub mod handler;
pub mod payloads;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod types;

pub use error::{QueueError, TaskError};
pub use handler::{TaskContext, TaskHandler};
pub use payloads::{EmailPayload, GenerationPayload, PublicationPayload};
pub use pool::{WorkerPool, WorkerStats};
pub use queue::TaskQueue;
pub use registry::{QueueRegistry, RunningWorkers};
pub use types::{
    QueueConfig, QueueName, QueueStats, RetentionPolicy, RetryPolicy, Task,
    TaskAttemptRecord, TaskHandle, TaskId, TaskState, TaskStatusView,
};
