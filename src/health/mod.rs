//! Configuration health checks.

pub mod checker;

pub use checker::{ConcernHealth, ConcernReports, HealthReport, HealthStatus, check_health};
