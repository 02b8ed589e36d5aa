//! # CoIoT Client
//!
//! Request/response correlation for device status and description queries.
//!
//! Every call issues exactly one unicast request and settles exactly once,
//! with whichever of response, transport error or deadline comes first. The
//! exchange listener is detached on every exit path, so a reply that arrives
//! after the deadline is discarded by the transport.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::core::message::RawInboundMessage;
use crate::core::options::{COAP_DEFAULT_PORT, COIOT_DESCRIPTION_PATH, COIOT_STATUS_PATH};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::{decode_description, decode_status, DescriptionMessage, StatusMessage};
use crate::transport::{OutboundRequest, RequestOptions, Transport};
use crate::utils::metrics::{global_metrics, Timer};
use crate::utils::timeout::{resolve_timeout, with_timeout_error};

/// Single-shot request/response correlator over a [`Transport`].
pub struct RequestCorrelator<T> {
    transport: T,
}

impl<T: Transport> RequestCorrelator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue `request` and wait at most `timeout` for its reply.
    ///
    /// Resolves with the raw reply, or fails with the transport's error or
    /// [`ProtocolError::Timeout`].
    #[instrument(
        skip(self, request),
        fields(host = %request.host, port = request.port, path = %request.path),
        level = "debug"
    )]
    pub async fn send(
        &self,
        request: OutboundRequest,
        timeout: Duration,
    ) -> Result<RawInboundMessage> {
        let metrics = global_metrics();
        let _timer = Timer::start("coiot_request");
        metrics.request_sent();

        let mut exchange = self.transport.request(request).inspect_err(|err| {
            metrics.transport_error();
            debug!(error = %err, "Transport refused request");
        })?;

        let outcome = with_timeout_error(exchange.settle(), timeout).await;
        exchange.detach();

        match &outcome {
            Ok(_) => metrics.response_received(),
            Err(ProtocolError::Timeout) => {
                metrics.request_timeout();
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "{}",
                    constants::ERR_REQUEST_TIMEOUT
                );
            }
            Err(err) => {
                metrics.transport_error();
                debug!(error = %err, "Exchange failed");
            }
        }

        outcome
    }
}

/// Client for querying CoIoT devices.
///
/// ```rust
/// use coiot_protocol::service::client::CoiotClient;
/// use coiot_protocol::transport::memory::MemoryTransport;
/// use coiot_protocol::transport::RequestOptions;
///
/// let transport = MemoryTransport::new();
/// let client = CoiotClient::new(
///     transport.clone(),
///     RequestOptions::new().with_host("192.168.1.23"),
/// );
/// assert_eq!(client.defaults().host.as_deref(), Some("192.168.1.23"));
/// ```
pub struct CoiotClient<T> {
    correlator: RequestCorrelator<T>,
    defaults: RequestOptions,
}

impl<T: Transport> CoiotClient<T> {
    /// Create a client with client-level request defaults.
    pub fn new(transport: T, defaults: RequestOptions) -> Self {
        Self {
            correlator: RequestCorrelator::new(transport),
            defaults,
        }
    }

    pub fn from_config(transport: T, config: &ClientConfig) -> Self {
        Self::new(transport, config.request_defaults())
    }

    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    pub fn transport(&self) -> &T {
        self.correlator.transport()
    }

    /// Fetch and decode the current status of a device.
    #[instrument(skip(self, options), level = "debug")]
    pub async fn get_status(&self, options: Option<RequestOptions>) -> Result<StatusMessage> {
        let raw = self.fetch(COIOT_STATUS_PATH, options).await?;
        decode_status(&raw)
    }

    /// Fetch and decode the self-description of a device.
    #[instrument(skip(self, options), level = "debug")]
    pub async fn get_description(
        &self,
        options: Option<RequestOptions>,
    ) -> Result<DescriptionMessage> {
        let raw = self.fetch(COIOT_DESCRIPTION_PATH, options).await?;
        decode_description(&raw)
    }

    async fn fetch(&self, path: &str, options: Option<RequestOptions>) -> Result<RawInboundMessage> {
        let (request, timeout) = self.build_request(path, options.unwrap_or_default())?;
        self.correlator.send(request, timeout).await
    }

    /// Merge call-site options over the client defaults and pin the path.
    fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<(OutboundRequest, Duration)> {
        let merged = options.merged_over(&self.defaults);
        let host = merged
            .host
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ProtocolError::ConfigError(constants::ERR_MISSING_HOST.to_string()))?;

        let request = OutboundRequest {
            host,
            port: merged.port.unwrap_or(COAP_DEFAULT_PORT),
            method: merged.method.unwrap_or_default(),
            path: path.to_string(),
            query: merged.query,
            confirmable: merged.confirmable.unwrap_or(true),
            retry_send: merged.retry_send,
            // One reply per call
            multicast: false,
        };

        Ok((request, resolve_timeout(options.timeout, self.defaults.timeout)))
    }
}
