//! # Error Types
//!
//! Error handling for CoIoT decoding, request correlation and broadcast listening.
//!
//! This module defines every error variant the crate can surface, from header
//! validation failures on a single datagram to transport-level failures.
//!
//! ## Error Categories
//! - **Decode Errors**: Missing device identity, malformed or missing headers, invalid JSON payloads
//! - **Exchange Errors**: Timeouts, transport failures, closed exchanges
//! - **Setup Errors**: Configuration and I/O failures
//!
//! Decode errors are always returned synchronously from the decode call and are
//! never silently replaced by defaults.
//!
//! ## Example Usage
//! ```rust
//! use coiot_protocol::error::{ProtocolError, Result};
//!
//! fn require_identity(value: Option<&str>) -> Result<&str> {
//!     value
//!         .filter(|v| !v.is_empty())
//!         .ok_or(ProtocolError::MissingDeviceIdentity)
//! }
//!
//! assert!(require_identity(Some("SHSW-1#2C7093#2")).is_ok());
//! assert!(matches!(
//!     require_identity(None),
//!     Err(ProtocolError::MissingDeviceIdentity)
//! ));
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants shared by transports and services.
pub mod constants {
    /// Exchange errors
    pub const ERR_REQUEST_TIMEOUT: &str = "Request timeout";
    pub const ERR_EXCHANGE_CLOSED: &str = "Exchange closed before a reply was received";

    /// Listener errors
    pub const ERR_ALREADY_BOUND: &str = "Inbound request stream already taken";
    pub const ERR_NOT_LISTENING: &str = "Transport is not listening";
    pub const ERR_ALREADY_LISTENING: &str = "Listener is already running";
    pub const ERR_LISTENER_LOST: &str = "Listener task terminated unexpectedly";
    pub const ERR_INBOUND_UNAVAILABLE: &str = "Inbound request source is not bound";

    /// Request errors
    pub const ERR_MISSING_HOST: &str = "Request host is not set";

    /// Reply errors
    pub const ERR_REPLY_DROPPED: &str = "Exchange no longer accepts a reply";
}

// ProtocolError is the primary error type for all CoIoT operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Unknown CoIoT message: missing device identity")]
    MissingDeviceIdentity,

    #[error("Unknown CoIoT message: malformed device identity '{0}'")]
    MalformedDeviceIdentity(String),

    #[error("Unknown CoIoT message: option {option} has non-numeric value '{value}'")]
    MalformedHeader { option: u16, value: String },

    #[error("Unknown CoIoT message: missing option {0}")]
    MissingHeader(u16),

    #[error("Unknown payload format for message: {0}")]
    InvalidPayload(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether this error was produced while decoding a single inbound message.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::MissingDeviceIdentity
                | ProtocolError::MalformedDeviceIdentity(_)
                | ProtocolError::MalformedHeader { .. }
                | ProtocolError::MissingHeader(_)
                | ProtocolError::InvalidPayload(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
