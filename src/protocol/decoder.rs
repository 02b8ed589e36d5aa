//! # CoIoT Message Decoder
//!
//! Pure functions turning a [`RawInboundMessage`] into a validated, typed
//! message. No I/O and no state: the same input always produces the same
//! value or the same error kind, and a partial value is never returned.
//!
//! ## Validation Order
//! 1. Device identity header present and non-empty
//! 2. Serial header, when present, is a base-10 non-negative integer
//! 3. Validity header, when present, is a base-10 non-negative integer
//! 4. Payload bytes parse as JSON of the expected shape
//! 5. Device identity splits into exactly three `#` segments
//!
//! Description decoding runs the same steps but neither requires nor
//! interprets the serial and validity headers: absent is fine, present and
//! non-numeric is still rejected.

use serde::de::DeserializeOwned;

use crate::core::headers::Headers;
use crate::core::message::RawInboundMessage;
use crate::core::options::{COIOT_OPTION_STATUS_SERIAL, COIOT_OPTION_STATUS_VALIDITY};
use crate::error::{ProtocolError, Result};
use crate::protocol::model::{
    DescriptionMessage, DeviceDescription, DeviceIdentity, DeviceStatus, StatusMessage,
};

/// Decode a status reply or broadcast.
///
/// Status messages must carry both a serial and a validity header.
pub fn decode_status(raw: &RawInboundMessage) -> Result<StatusMessage> {
    let identity_header = validate_headers(&raw.headers)?;

    let serial = raw
        .headers
        .status_serial()
        .ok_or(ProtocolError::MissingHeader(COIOT_OPTION_STATUS_SERIAL))
        .and_then(|value| parse_numeric::<u16>(COIOT_OPTION_STATUS_SERIAL, value))?;
    let validity = raw
        .headers
        .status_validity()
        .ok_or(ProtocolError::MissingHeader(COIOT_OPTION_STATUS_VALIDITY))
        .and_then(|value| parse_numeric::<u32>(COIOT_OPTION_STATUS_VALIDITY, value))?;

    let payload: DeviceStatus = parse_payload(&raw.payload)?;
    let identity = parse_device_identity(identity_header)?;

    Ok(StatusMessage {
        identity,
        payload,
        location: raw.location(),
        serial,
        valid_for_seconds: decode_validity(validity),
    })
}

/// Decode a description reply.
///
/// Serial and validity headers are optional here, but must be numeric when present.
pub fn decode_description(raw: &RawInboundMessage) -> Result<DescriptionMessage> {
    let identity_header = validate_headers(&raw.headers)?;
    let payload: DeviceDescription = parse_payload(&raw.payload)?;
    let identity = parse_device_identity(identity_header)?;

    Ok(DescriptionMessage {
        identity,
        payload,
        location: raw.location(),
    })
}

/// Convert the bit-packed validity value to seconds.
///
/// The low bit selects the unit: even values count tenths of a second
/// (truncated), odd values count 4-second units.
#[inline]
pub fn decode_validity(validity: u32) -> u64 {
    let value = u64::from(validity);
    if value & 0x1 == 0 {
        value / 10
    } else {
        value * 4
    }
}

/// Split a `<deviceType>#<deviceId>#<protocolRevision>` string.
///
/// Exactly three non-empty segments are required.
pub fn parse_device_identity(raw: &str) -> Result<DeviceIdentity> {
    let mut segments = raw.split('#');
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(device_type), Some(device_id), Some(revision), None)
            if !device_type.is_empty() && !device_id.is_empty() && !revision.is_empty() =>
        {
            Ok(DeviceIdentity {
                raw: raw.to_string(),
                device_type: device_type.to_string(),
                device_id: device_id.to_string(),
                protocol_revision: revision.to_string(),
            })
        }
        _ => Err(ProtocolError::MalformedDeviceIdentity(raw.to_string())),
    }
}

/// Steps 1-3, shared by both decoders.
fn validate_headers(headers: &Headers) -> Result<&str> {
    let identity = require_identity(headers)?;

    if let Some(serial) = headers.status_serial() {
        parse_numeric::<u16>(COIOT_OPTION_STATUS_SERIAL, serial)?;
    }
    if let Some(validity) = headers.status_validity() {
        parse_numeric::<u32>(COIOT_OPTION_STATUS_VALIDITY, validity)?;
    }

    Ok(identity)
}

fn require_identity(headers: &Headers) -> Result<&str> {
    headers
        .device_identity()
        .filter(|identity| !identity.is_empty())
        .ok_or(ProtocolError::MissingDeviceIdentity)
}

fn parse_numeric<T: std::str::FromStr>(option: u16, value: &str) -> Result<T> {
    let trimmed = value.trim();
    // FromStr for unsigned ints accepts a leading '+'
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(option, value));
    }
    trimmed.parse::<T>().map_err(|_| malformed(option, value))
}

fn malformed(option: u16, value: &str) -> ProtocolError {
    ProtocolError::MalformedHeader {
        option,
        value: value.to_string(),
    }
}

fn parse_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_validity_even_counts_tenths() {
        assert_eq!(decode_validity(38400), 3840);
        assert_eq!(decode_validity(0), 0);
        assert_eq!(decode_validity(18), 1);
        assert_eq!(decode_validity(8), 0);
    }

    #[test]
    fn test_validity_odd_counts_four_second_units() {
        assert_eq!(decode_validity(1), 4);
        assert_eq!(decode_validity(15), 60);
        assert_eq!(decode_validity(u32::MAX), u64::from(u32::MAX) * 4);
    }

    #[test]
    fn test_identity_requires_three_segments() {
        let identity = parse_device_identity("SHSW-1#2C7093#2").unwrap();
        assert_eq!(identity.device_type, "SHSW-1");
        assert_eq!(identity.device_id, "2C7093");
        assert_eq!(identity.protocol_revision, "2");

        for bad in ["SHSW-1#2C7093", "SHSW-1", "SHSW-1#2C7093#2#extra", "#2C7093#2", "A##2"] {
            assert!(
                matches!(
                    parse_device_identity(bad),
                    Err(ProtocolError::MalformedDeviceIdentity(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_headers_reject_signs_and_text() {
        assert_eq!(parse_numeric::<u16>(3420, " 42 ").unwrap(), 42);
        assert!(parse_numeric::<u16>(3420, "+42").is_err());
        assert!(parse_numeric::<u16>(3420, "-1").is_err());
        assert!(parse_numeric::<u16>(3420, "4.2").is_err());
        assert!(parse_numeric::<u16>(3420, "").is_err());
        assert!(parse_numeric::<u16>(3420, "65536").is_err());
    }
}
