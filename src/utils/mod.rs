//! # Utility Modules
//!
//! Supporting utilities for logging, timing and observability.
//!
//! ## Components
//! - **Logging**: Subscriber setup from [`crate::config::LoggingConfig`]
//! - **Timeout**: Deadline wrapper and timeout resolution for exchanges
//! - **Metrics**: Thread-safe observability counters

pub mod logging;
pub mod metrics;
pub mod timeout;

pub use logging::init_logging;
pub use metrics::{global_metrics, init_metrics};
