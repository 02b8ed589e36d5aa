use std::net::SocketAddr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::headers::Headers;

/// Inbound datagram as delivered by the transport. Never mutated by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInboundMessage {
    pub headers: Headers,
    pub payload: Bytes,
    /// Response/request code in `class.detail` form, e.g. `"2.05"` or `"0.30"`
    pub code: String,
    pub path: String,
    pub remote: SocketAddr,
}

impl RawInboundMessage {
    pub fn new(
        headers: Headers,
        payload: impl Into<Bytes>,
        code: impl Into<String>,
        path: impl Into<String>,
        remote: SocketAddr,
    ) -> Self {
        Self {
            headers,
            payload: payload.into(),
            code: code.into(),
            path: path.into(),
            remote,
        }
    }

    /// Sender address as a serializable location record.
    pub fn location(&self) -> Location {
        Location::from(self.remote)
    }
}

/// Remote endpoint of a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub host: String,
    pub port: u16,
}

impl From<SocketAddr> for Location {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

/// Reply sent back on an inbound exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub code: String,
    pub options: Vec<(u16, Bytes)>,
    pub payload: Bytes,
}

impl OutgoingMessage {
    pub fn new(code: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            code: code.into(),
            options: Vec::new(),
            payload: payload.into(),
        }
    }

    pub fn with_option(mut self, number: u16, value: impl Into<Bytes>) -> Self {
        self.options.push((number, value.into()));
        self
    }
}

/// What a listener decided to do with an inbound exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message(OutgoingMessage),
    /// Empty reset message, ends the interaction with the sender
    Reset,
}
