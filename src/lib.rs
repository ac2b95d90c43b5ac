//! Analytics derivations for an LMS admin dashboard: record filters,
//! aggregations, paginated reports, dashboard snapshots and CSV exports.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod markdown;
pub mod models;
pub mod report;
pub mod snapshot;

pub use config::Config;
pub use dashboard::{assemble, DashboardStats};
pub use error::{AnalyticsError, Result};
pub use filter::ReportFilter;
pub use models::{ReportResponse, Snapshot};
pub use report::ReportKind;
