//! # Core Protocol Components
//!
//! Reserved constants, option codecs, typed headers and the raw message shapes
//! exchanged with the transport.
//!
//! This module is the boundary between the external constrained-device
//! transport and the CoIoT decoder. Dynamic option maps are resolved here into
//! typed [`headers::Headers`] so nothing downstream relies on absent keys.
//!
//! ## Components
//! - **Options**: Reserved option numbers, paths, broadcast code and binary codecs
//! - **Headers**: Typed view over the three CoIoT options
//! - **Message**: Raw inbound datagrams, sender location and replies
//!
//! ## Option Space
//! ```text
//! 3332  global device id   UTF-8   <type>#<id>#<revision>
//! 3412  status validity    uint16  bit-packed duration
//! 3420  status serial      uint16  wrapping counter
//! ```

pub mod headers;
pub mod message;
pub mod options;
