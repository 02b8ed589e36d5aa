//! Timeout helpers for exchanges.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Reply deadline used when neither the call site nor the client sets one
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);

/// Run `future` with a deadline, mapping expiry to [`ProtocolError::Timeout`].
///
/// The inner future is dropped on expiry.
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}

/// Resolve the effective deadline: call site, then client default, then
/// [`DEFAULT_REQUEST_TIMEOUT`].
pub fn resolve_timeout(call_site: Option<Duration>, client_default: Option<Duration>) -> Duration {
    call_site
        .or(client_default)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}
