//! # In-Memory Transport
//!
//! Loopback implementation of [`Transport`] and [`ServerTransport`] that keeps
//! every exchange in process. Outbound requests are recorded and wait for the
//! owner to answer them; inbound datagrams are injected by hand.
//!
//! Useful for driving the client and server without sockets and for checking
//! that no exchange listener outlives its request.
//!
//! ## Usage
//! ```rust
//! use coiot_protocol::transport::memory::MemoryTransport;
//! use coiot_protocol::transport::{OutboundRequest, Method, Transport};
//!
//! let transport = MemoryTransport::new();
//! let exchange = transport
//!     .request(OutboundRequest {
//!         host: "192.168.1.23".into(),
//!         port: 5683,
//!         method: Method::Get,
//!         path: "/cit/s".into(),
//!         query: None,
//!         confirmable: true,
//!         retry_send: None,
//!         multicast: false,
//!     })
//!     .unwrap();
//! assert_eq!(transport.active_listeners(), 1);
//! exchange.detach();
//! assert_eq!(transport.active_listeners(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::core::message::{RawInboundMessage, Reply};
use crate::error::{constants, ProtocolError, Result};
use crate::transport::{
    Exchange, ExchangeSender, InboundRequest, OutboundRequest, ReplyHandle, ServerTransport,
    Transport,
};

const ERR_LOCK_POISONED: &str = "Memory transport state poisoned";

/// In-process transport shared by clones.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryTransportInner>>,
}

#[derive(Default)]
struct MemoryTransportInner {
    /// Every request issued, in order
    sent: Vec<OutboundRequest>,
    /// Exchanges not yet answered through this transport, oldest first
    pending: VecDeque<ExchangeSender>,
    inbound_tx: Option<mpsc::UnboundedSender<InboundRequest>>,
    inbound_rx: Option<mpsc::UnboundedReceiver<InboundRequest>>,
    listening: bool,
    listen_error: Option<String>,
    close_error: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Mutex::new(MemoryTransportInner {
                inbound_tx: Some(tx),
                inbound_rx: Some(rx),
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryTransportInner>> {
        self.inner
            .lock()
            .map_err(|_| ProtocolError::TransportError(ERR_LOCK_POISONED.to_string()))
    }

    /// Requests issued so far.
    pub fn sent_requests(&self) -> Vec<OutboundRequest> {
        self.lock().map(|inner| inner.sent.clone()).unwrap_or_default()
    }

    /// Exchanges whose listener is still attached.
    pub fn active_listeners(&self) -> usize {
        self.lock()
            .map(|inner| inner.pending.iter().filter(|tx| tx.is_attached()).count())
            .unwrap_or(0)
    }

    /// Answer the oldest outstanding exchange.
    ///
    /// Returns false when there was nothing to answer or the listener had
    /// already been removed, in which case the reply is discarded.
    pub fn respond_next(&self, message: RawInboundMessage) -> bool {
        match self.pop_pending() {
            Some(exchange) => exchange.respond(message),
            None => false,
        }
    }

    /// Fail the oldest outstanding exchange with a transport error.
    pub fn fail_next(&self, err: ProtocolError) -> bool {
        match self.pop_pending() {
            Some(exchange) => exchange.fail(err),
            None => false,
        }
    }

    fn pop_pending(&self) -> Option<ExchangeSender> {
        self.lock().ok().and_then(|mut inner| inner.pending.pop_front())
    }

    /// Deliver an inbound datagram as if it arrived on the bound socket.
    ///
    /// The returned receiver yields whatever the listener replied, or an
    /// error once the reply handle is dropped unanswered.
    pub fn inject(&self, message: RawInboundMessage) -> Result<oneshot::Receiver<Reply>> {
        let inner = self.lock()?;
        if !inner.listening {
            return Err(ProtocolError::TransportError(
                constants::ERR_NOT_LISTENING.to_string(),
            ));
        }

        let (reply, reply_rx) = ReplyHandle::channel();
        let sender = inner
            .inbound_tx
            .as_ref()
            .ok_or(ProtocolError::ConnectionClosed)?;
        sender
            .send(InboundRequest { message, reply })
            .map_err(|_| ProtocolError::ConnectionClosed)?;
        Ok(reply_rx)
    }

    /// Make the next `listen` calls fail with the given message.
    pub fn set_listen_error(&self, message: Option<&str>) {
        if let Ok(mut inner) = self.lock() {
            inner.listen_error = message.map(str::to_string);
        }
    }

    /// Make the next `close` calls fail with the given message.
    pub fn set_close_error(&self, message: Option<&str>) {
        if let Ok(mut inner) = self.lock() {
            inner.close_error = message.map(str::to_string);
        }
    }

    pub fn is_listening(&self) -> bool {
        self.lock().map(|inner| inner.listening).unwrap_or(false)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    #[instrument(skip(self, request), fields(host = %request.host, path = %request.path))]
    fn request(&self, request: OutboundRequest) -> Result<Exchange> {
        let (sender, exchange) = Exchange::channel();
        let mut inner = self.lock()?;
        // Drop bookkeeping for exchanges whose listener is gone
        inner.pending.retain(ExchangeSender::is_attached);
        inner.sent.push(request);
        inner.pending.push_back(sender);
        debug!(pending = inner.pending.len(), "Request queued");
        Ok(exchange)
    }
}

#[async_trait]
impl ServerTransport for MemoryTransport {
    fn incoming(&self) -> Result<mpsc::UnboundedReceiver<InboundRequest>> {
        self.lock()?.inbound_rx.take().ok_or_else(|| {
            ProtocolError::TransportError(constants::ERR_ALREADY_BOUND.to_string())
        })
    }

    async fn listen(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(message) = inner.listen_error.clone() {
            return Err(ProtocolError::TransportError(message));
        }
        inner.listening = true;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(message) = inner.close_error.clone() {
            return Err(ProtocolError::TransportError(message));
        }
        if !inner.listening {
            return Err(ProtocolError::TransportError(
                constants::ERR_NOT_LISTENING.to_string(),
            ));
        }
        inner.listening = false;
        Ok(())
    }
}
