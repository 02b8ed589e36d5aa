//! # Services
//!
//! Client and server built on the transport contract:
//! - [`client`]: status and description queries with timeout correlation
//! - [`server`]: broadcast listener publishing decoded status events

pub mod client;
pub mod server;

pub use client::{CoiotClient, RequestCorrelator};
pub use server::{CoiotServer, ServerEvent};
