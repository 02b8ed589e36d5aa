//! # CoIoT Protocol Layer
//!
//! Domain model and the pure decoder that produces it.
//!
//! ## Components
//! - **Model**: Device identity, status and description records
//! - **Decoder**: Header validation, payload parsing and validity decoding

pub mod decoder;
pub mod model;

#[cfg(test)]
mod tests;

pub use decoder::{decode_description, decode_status, decode_validity, parse_device_identity};
pub use model::{DescriptionMessage, DeviceIdentity, StatusMessage};
