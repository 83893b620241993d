//! Structured logging, the CSV decision trail, email alerting, and
//! Prometheus metrics — the telemetry surface every other crate writes to
//! but never reads back from.

pub mod alert;
pub mod audit;
pub mod error;
pub mod logging;
pub mod metrics;

pub use alert::{AlertMessage, Alerter, NoOpAlerter, SmtpAlerter};
pub use audit::{AuditKind, AuditRecord, AuditWriter};
pub use error::{Result, TelemetryError};
pub use logging::init_logging;
pub use metrics::Metrics;
