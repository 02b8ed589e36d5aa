//! # CoIoT Option Space
//!
//! Reserved option numbers, paths and codes, plus the binary codecs that extend
//! the transport's option space with the three CoIoT options.
//!
//! Devices publish their identity, status validity and status serial as
//! non-standard CoAP options (see the CoIoT mandatory options table).
//! The identity is carried as UTF-8 text, the other two as CoAP `uint`
//! values (big-endian, leading zero bytes stripped, at most two bytes).

use bytes::Bytes;

use crate::error::{ProtocolError, Result};

/// Global device identity option, `<type>#<id>#<revision>`
pub const COIOT_OPTION_GLOBAL_DEVID: u16 = 3332;

/// Status validity option (bit-packed duration)
pub const COIOT_OPTION_STATUS_VALIDITY: u16 = 3412;

/// Status serial option (wrapping 16-bit counter)
pub const COIOT_OPTION_STATUS_SERIAL: u16 = 3420;

/// Request path for device descriptions
pub const COIOT_DESCRIPTION_PATH: &str = "/cit/d";

/// Request path for device status
pub const COIOT_STATUS_PATH: &str = "/cit/s";

/// Non-standard code used by devices for multicast status broadcasts
pub const COIOT_CODE: &str = "0.30";

/// CoAP "All CoAP Nodes" IPv4 multicast group
pub const COAP_MULTICAST_ADDRESS: &str = "224.0.1.187";

/// Default CoAP port
pub const COAP_DEFAULT_PORT: u16 = 5683;

/// Maximum encoded length of the uint options
const MAX_UINT_OPTION_LEN: usize = 2;

/// Returns true when `number` is one of the CoIoT options this crate decodes.
pub fn is_coiot_option(number: u16) -> bool {
    matches!(
        number,
        COIOT_OPTION_GLOBAL_DEVID | COIOT_OPTION_STATUS_VALIDITY | COIOT_OPTION_STATUS_SERIAL
    )
}

/// Convert a binary option value to its textual header form.
///
/// Returns `Ok(None)` for option numbers outside the CoIoT option space.
pub fn decode_option(number: u16, value: &[u8]) -> Result<Option<String>> {
    match number {
        COIOT_OPTION_GLOBAL_DEVID => {
            let text = std::str::from_utf8(value).map_err(|_| ProtocolError::MalformedHeader {
                option: number,
                value: String::from_utf8_lossy(value).into_owned(),
            })?;
            Ok(Some(text.to_string()))
        }
        COIOT_OPTION_STATUS_VALIDITY | COIOT_OPTION_STATUS_SERIAL => {
            decode_uint(number, value).map(|v| Some(v.to_string()))
        }
        _ => Ok(None),
    }
}

/// Convert a textual header value to its binary option form.
pub fn encode_option(number: u16, value: &str) -> Result<Bytes> {
    match number {
        COIOT_OPTION_GLOBAL_DEVID => Ok(Bytes::copy_from_slice(value.as_bytes())),
        COIOT_OPTION_STATUS_VALIDITY | COIOT_OPTION_STATUS_SERIAL => {
            let parsed = value
                .trim()
                .parse::<u16>()
                .map_err(|_| ProtocolError::MalformedHeader {
                    option: number,
                    value: value.to_string(),
                })?;
            Ok(encode_uint(parsed))
        }
        other => Err(ProtocolError::TransportError(format!(
            "option {other} is not a CoIoT option"
        ))),
    }
}

fn decode_uint(number: u16, value: &[u8]) -> Result<u16> {
    if value.len() > MAX_UINT_OPTION_LEN {
        return Err(ProtocolError::MalformedHeader {
            option: number,
            value: format!("{value:02x?}"),
        });
    }

    Ok(value
        .iter()
        .fold(0u16, |acc, byte| (acc << 8) | u16::from(*byte)))
}

fn encode_uint(value: u16) -> Bytes {
    let bytes = value.to_be_bytes();
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    Bytes::copy_from_slice(&bytes[first_significant..])
}
