//! Infrastructure Layer
//!
//! - Prometheus metrics
//! - External message API client (call logs)

pub mod call_log;
pub mod metrics;

pub use call_log::HttpCallLogRepository;
