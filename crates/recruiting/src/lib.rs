//! Recruitment entities and their status machines.
//!
//! Plain data + deterministic rules (no IO). Persistence is provided by the
//! infra layer; this crate only decides which status writes are legal.

pub mod approval;
pub mod connector;
pub mod customer;
pub mod job;
pub mod publication;
pub mod version;

pub use approval::{Approval, ApprovalDecision, ApprovalReview, ApprovalStatus};
pub use connector::ConnectorRecord;
pub use customer::Customer;
pub use job::{Job, JobStatus};
pub use publication::{Publication, PublicationAction, PublicationLog, PublicationStatus};
pub use version::{ImageVersion, TextVersion, next_version_number};
