//! Job-board connectors.
//!
//! Every third-party board is normalised behind [`JobBoardConnector`]: a small
//! required method set (publish/update/stop/test) plus optional capabilities
//! with no-op defaults. The [`ConnectorRegistry`] maps a stored connector
//! `type` string to a constructed implementation.

pub mod config;
pub mod connector;
pub mod dummy;
pub mod http;
pub mod indeed;
pub mod registry;
pub mod stepstone;

pub use config::ConnectorConfig;
pub use connector::{
    Capabilities, ConnectorError, ConnectorOutcome, DailyMetrics, Inquiry, JobBoardConnector,
    JobPostingData,
};
pub use dummy::DummyConnector;
pub use indeed::IndeedConnector;
pub use registry::{ConnectorFactory, ConnectorRegistry};
pub use stepstone::StepStoneConnector;
