//! `talentflow-core`: shared building blocks for the recruitment back office.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the domain error
//! model and the compare-and-swap state transition helper used by every status
//! field that background tasks and API services mutate.

pub mod entity;
pub mod error;
pub mod id;
pub mod transition;

pub use entity::{Entity, TenantOwned};
pub use error::{DomainError, DomainResult};
pub use id::{ApprovalId, ConnectorId, CustomerId, JobId, PublicationId, TenantId, UserId, WebhookId};
pub use transition::{StateMachine, Transition};
