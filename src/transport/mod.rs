//! # Transport Contract
//!
//! The constrained-device transport (framing, acknowledgements, retransmission,
//! block-wise transfer, multicast membership) lives outside this crate. This
//! module defines the contract the client and server consume from it:
//!
//! - [`Transport::request`] issues one outbound request and hands back an
//!   [`Exchange`] that yields the transport's response or error event.
//! - [`ServerTransport::incoming`] hands over the inbound-request event source,
//!   and `listen`/`close` drive the socket lifecycle.
//!
//! Dropping (or [`Exchange::detach`]ing) an exchange deregisters its listener;
//! a late reply from the transport is then discarded.
//!
//! The [`memory`] module provides an in-process implementation of both traits.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::core::message::{OutgoingMessage, RawInboundMessage, Reply};
use crate::error::{constants, ProtocolError, Result};

/// CoAP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

/// Per-call request options. Unset fields fall back to the client defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub method: Option<Method>,
    pub query: Option<String>,
    /// Send as confirmable (CON) message
    pub confirmable: Option<bool>,
    /// Retransmission count handed to the transport
    pub retry_send: Option<u32>,
    /// Requested multicast fan-in. Ignored: exactly one reply is expected per call
    pub multicast: Option<bool>,
    /// How long to wait for the reply
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_send(mut self, retry_send: u32) -> Self {
        self.retry_send = Some(retry_send);
        self
    }

    pub fn with_multicast(mut self, multicast: bool) -> Self {
        self.multicast = Some(multicast);
        self
    }

    /// Field-wise merge where `self` wins over `defaults`.
    pub fn merged_over(&self, defaults: &RequestOptions) -> RequestOptions {
        RequestOptions {
            host: self.host.clone().or_else(|| defaults.host.clone()),
            port: self.port.or(defaults.port),
            method: self.method.or(defaults.method),
            query: self.query.clone().or_else(|| defaults.query.clone()),
            confirmable: self.confirmable.or(defaults.confirmable),
            retry_send: self.retry_send.or(defaults.retry_send),
            multicast: self.multicast.or(defaults.multicast),
            timeout: self.timeout.or(defaults.timeout),
        }
    }
}

/// Fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub host: String,
    pub port: u16,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub confirmable: bool,
    pub retry_send: Option<u32>,
    /// Always false for requests issued by this crate
    pub multicast: bool,
}

/// Event delivered by the transport for one outbound exchange.
#[derive(Debug)]
pub enum ExchangeEvent {
    Response(RawInboundMessage),
    Error(ProtocolError),
}

/// Client side of one outbound exchange.
#[derive(Debug)]
pub struct Exchange {
    events: mpsc::UnboundedReceiver<ExchangeEvent>,
}

impl Exchange {
    /// Create a connected sender/exchange pair for a transport to hand out.
    pub fn channel() -> (ExchangeSender, Exchange) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ExchangeSender { events: tx }, Exchange { events: rx })
    }

    /// Wait for the first response or error event.
    pub async fn settle(&mut self) -> Result<RawInboundMessage> {
        match self.events.recv().await {
            Some(ExchangeEvent::Response(message)) => Ok(message),
            Some(ExchangeEvent::Error(err)) => Err(err),
            None => Err(ProtocolError::TransportError(
                constants::ERR_EXCHANGE_CLOSED.to_string(),
            )),
        }
    }

    /// Deregister this exchange's listener. Later events are discarded.
    pub fn detach(mut self) {
        self.events.close();
    }
}

/// Transport side of one outbound exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSender {
    events: mpsc::UnboundedSender<ExchangeEvent>,
}

impl ExchangeSender {
    /// Deliver a response. Returns false when the exchange was already detached.
    pub fn respond(&self, message: RawInboundMessage) -> bool {
        self.events.send(ExchangeEvent::Response(message)).is_ok()
    }

    /// Deliver a transport error. Returns false when the exchange was already detached.
    pub fn fail(&self, err: ProtocolError) -> bool {
        self.events.send(ExchangeEvent::Error(err)).is_ok()
    }

    /// Whether a listener is still attached to this exchange.
    pub fn is_attached(&self) -> bool {
        !self.events.is_closed()
    }
}

/// Handle to reply on an inbound exchange.
///
/// Dropping the handle without replying leaves the exchange unanswered, which
/// is the normal outcome for non-confirmable broadcasts.
#[derive(Debug)]
pub struct ReplyHandle {
    reply: oneshot::Sender<Reply>,
}

impl ReplyHandle {
    /// Create a connected handle/receiver pair for a transport to hand out.
    pub fn channel() -> (ReplyHandle, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (ReplyHandle { reply: tx }, rx)
    }

    pub fn respond(self, message: OutgoingMessage) -> Result<()> {
        self.send(Reply::Message(message))
    }

    /// Answer with an empty reset message.
    pub fn reset(self) -> Result<()> {
        self.send(Reply::Reset)
    }

    fn send(self, reply: Reply) -> Result<()> {
        self.reply
            .send(reply)
            .map_err(|_| ProtocolError::TransportError(constants::ERR_REPLY_DROPPED.to_string()))
    }
}

/// Inbound request event: the datagram plus the handle to answer it.
#[derive(Debug)]
pub struct InboundRequest {
    pub message: RawInboundMessage,
    pub reply: ReplyHandle,
}

/// Client half of the external transport.
pub trait Transport: Send + Sync {
    /// Issue one outbound request. Events for it arrive on the returned exchange.
    fn request(&self, request: OutboundRequest) -> Result<Exchange>;
}

/// Server half of the external transport.
#[async_trait]
pub trait ServerTransport: Send + Sync + 'static {
    /// Take the inbound-request event source. Available once.
    fn incoming(&self) -> Result<mpsc::UnboundedReceiver<InboundRequest>>;

    /// Bind the socket and join the configured multicast group.
    async fn listen(&self) -> Result<()>;

    /// Tear the socket down.
    async fn close(&self) -> Result<()>;
}
