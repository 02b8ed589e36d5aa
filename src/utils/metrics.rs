//! Observability and Metrics
//!
//! This module provides counters for request correlation and broadcast
//! listening so operators can see timeouts and dropped datagrams.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for CoIoT operations
#[derive(Debug)]
pub struct Metrics {
    /// Outbound requests issued
    pub requests_total: AtomicU64,
    /// Requests settled by a response
    pub responses_received: AtomicU64,
    /// Requests settled by the deadline
    pub request_timeouts: AtomicU64,
    /// Requests settled by a transport error
    pub transport_errors: AtomicU64,
    /// Inbound datagrams seen by the listener
    pub inbound_total: AtomicU64,
    /// Inbound datagrams that did not match the broadcast signature
    pub inbound_ignored: AtomicU64,
    /// Status broadcasts decoded and published
    pub statuses_published: AtomicU64,
    /// Messages rejected by the decoder
    pub decode_failures: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            responses_received: AtomicU64::new(0),
            request_timeouts: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            inbound_total: AtomicU64::new(0),
            inbound_ignored: AtomicU64::new(0),
            statuses_published: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn request_sent(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_received(&self) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_timeout(&self) {
        self.request_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound datagram reaching the listener
    pub fn inbound_received(&self) {
        self.inbound_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inbound_ignored(&self) {
        self.inbound_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status_published(&self) {
        self.statuses_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            request_timeouts: self.request_timeouts.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            inbound_total: self.inbound_total.load(Ordering::Relaxed),
            inbound_ignored: self.inbound_ignored.load(Ordering::Relaxed),
            statuses_published: self.statuses_published.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            requests_total = snapshot.requests_total,
            responses_received = snapshot.responses_received,
            request_timeouts = snapshot.request_timeouts,
            transport_errors = snapshot.transport_errors,
            inbound_total = snapshot.inbound_total,
            inbound_ignored = snapshot.inbound_ignored,
            statuses_published = snapshot.statuses_published,
            decode_failures = snapshot.decode_failures,
            uptime_seconds = snapshot.uptime_seconds,
            "CoIoT metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub responses_received: u64,
    pub request_timeouts: u64,
    pub transport_errors: u64,
    pub inbound_total: u64,
    pub inbound_ignored: u64,
    pub statuses_published: u64,
    pub decode_failures: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Initialize metrics collection (call once at startup)
pub fn init_metrics() {
    // Force initialization
    let _ = global_metrics();
    info!("Metrics collection initialized");
}

/// Timer for measuring exchange duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
