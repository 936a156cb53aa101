//! Infrastructure layer: task queues and workers, task handlers, persistence,
//! synchronous services, notifications and configuration.

pub mod config;
pub mod handlers;
pub mod notifications;
pub mod services;
pub mod store;
pub mod tasks;
