//! # coiot-protocol
//!
//! Decoding and exchange handling for CoIoT, the status and discovery protocol
//! layered on CoAP by constrained smart-home devices.
//!
//! ## Features
//! - **Decoder**: validates the CoIoT options (3332, 3412, 3420) and the JSON
//!   payload into typed status and description records
//! - **Client**: single-shot status and description requests with timeout
//!   correlation and guaranteed listener cleanup
//! - **Server**: broadcast listener that republishes decoded status
//!   broadcasts and survives malformed datagrams
//! - **Transport contract**: traits for the external CoAP transport plus an
//!   in-memory implementation
//!
//! ## Example
//! ```rust
//! use coiot_protocol::core::headers::Headers;
//! use coiot_protocol::core::message::RawInboundMessage;
//! use coiot_protocol::protocol::decode_status;
//!
//! let headers = Headers::new()
//!     .with_device_identity("SHSW-1#2C7093#2")
//!     .with_status_validity("38400")
//!     .with_status_serial("7");
//! let raw = RawInboundMessage::new(
//!     headers,
//!     &br#"{"G":[[0,112,1]]}"#[..],
//!     "0.30",
//!     "/cit/s",
//!     "192.168.1.23:5683".parse().unwrap(),
//! );
//!
//! let status = decode_status(&raw).unwrap();
//! assert_eq!(status.identity.device_id, "2C7093");
//! assert_eq!(status.valid_for_seconds, 3840);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use config::CoiotConfig;
pub use error::{ProtocolError, Result};
pub use protocol::{DescriptionMessage, DeviceIdentity, StatusMessage};
pub use service::{CoiotClient, CoiotServer, ServerEvent};
