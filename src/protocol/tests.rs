// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::core::headers::Headers;
use crate::core::message::{Location, RawInboundMessage};
use crate::error::ProtocolError;
use crate::protocol::decoder::*;
use crate::protocol::model::*;

const STATUS_JSON: &str = r#"{ "G": [ [ 0, 1234, 0 ] ]}"#;
const DESCRIPTION_JSON: &str = r#"{ "blk": [{ "I": 1, "D": "relay_0" } ], "sen": [ { "I": 2102, "T": "EV", "D": "inputEvent", "R": ["S/L", ""], "L": 1 }]}"#;

fn raw(headers: Headers, payload: &'static str) -> RawInboundMessage {
    RawInboundMessage::new(
        headers,
        payload.as_bytes(),
        "2.05",
        "/cit/s",
        "192.168.31.190:5683".parse().unwrap(),
    )
}

fn status_headers() -> Headers {
    Headers::from_map([
        ("3332", "SHSW-1#2C7093#2"),
        ("3412", "38400"),
        ("3420", "59136"),
    ])
}

#[test]
fn test_decode_nice_status() {
    let status = decode_status(&raw(status_headers(), STATUS_JSON)).expect("status should decode");

    assert_eq!(status.identity.raw, "SHSW-1#2C7093#2");
    assert_eq!(status.identity.device_type, "SHSW-1");
    assert_eq!(status.identity.device_id, "2C7093");
    assert_eq!(status.identity.protocol_revision, "2");
    assert_eq!(status.serial, 59136);
    assert_eq!(status.valid_for_seconds, 3840);
    assert_eq!(
        status.location,
        Location {
            host: "192.168.31.190".to_string(),
            port: 5683
        }
    );
    assert_eq!(
        status.payload.generic,
        vec![SensorReading {
            channel: 0,
            sensor_id: 1234,
            value: SensorValue::Number(0.into()),
        }]
    );
    assert_eq!(status.key(), ("2C7093", 59136));
}

#[test]
fn test_status_serializes_with_wire_names() {
    let status = decode_status(&raw(status_headers(), STATUS_JSON)).unwrap();
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "rawdevid": "SHSW-1#2C7093#2",
            "deviceType": "SHSW-1",
            "deviceId": "2C7093",
            "protocolRevision": "2",
            "payload": { "G": [[0, 1234, 0]] },
            "location": { "host": "192.168.31.190", "port": 5683 },
            "serial": 59136,
            "validForSeconds": 3840
        })
    );
}

#[test]
fn test_status_with_bad_json_is_a_payload_error() {
    let result = decode_status(&raw(status_headers(), "{ imnot a json molon }"));

    match result {
        Err(err @ ProtocolError::InvalidPayload(_)) => {
            assert!(err.to_string().contains("payload"));
        }
        other => panic!("Expected payload error, got {other:?}"),
    }
}

#[test]
fn test_status_without_headers_is_missing_identity() {
    let result = decode_status(&raw(Headers::default(), STATUS_JSON));
    assert!(matches!(result, Err(ProtocolError::MissingDeviceIdentity)));
}

#[test]
fn test_missing_identity_wins_over_bad_payload() {
    let result = decode_status(&raw(Headers::default(), "{ imnot a json molon }"));
    assert!(matches!(result, Err(ProtocolError::MissingDeviceIdentity)));
}

#[test]
fn test_empty_identity_is_missing_identity() {
    let headers = status_headers().with_device_identity("");
    let result = decode_status(&raw(headers, STATUS_JSON));
    assert!(matches!(result, Err(ProtocolError::MissingDeviceIdentity)));
}

#[test]
fn test_non_numeric_serial_is_malformed_header() {
    let headers = status_headers().with_status_serial("twelve");
    let result = decode_status(&raw(headers, STATUS_JSON));
    assert!(matches!(
        result,
        Err(ProtocolError::MalformedHeader { option: 3420, .. })
    ));
}

#[test]
fn test_non_numeric_validity_is_malformed_header_before_payload() {
    let headers = status_headers().with_status_validity("soon");
    let result = decode_status(&raw(headers, "{ imnot a json molon }"));
    assert!(matches!(
        result,
        Err(ProtocolError::MalformedHeader { option: 3412, .. })
    ));
}

#[test]
fn test_status_without_validity_is_rejected() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2"), ("3420", "1")]);
    let result = decode_status(&raw(headers, STATUS_JSON));
    assert!(matches!(result, Err(ProtocolError::MissingHeader(3412))));
}

#[test]
fn test_status_without_serial_is_rejected() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2"), ("3412", "38400")]);
    let result = decode_status(&raw(headers, STATUS_JSON));
    assert!(matches!(result, Err(ProtocolError::MissingHeader(3420))));
}

#[test]
fn test_odd_validity_counts_four_second_units() {
    let headers = status_headers().with_status_validity("15");
    let status = decode_status(&raw(headers, STATUS_JSON)).unwrap();
    assert_eq!(status.valid_for_seconds, 60);
    assert_eq!(status.valid_for(), std::time::Duration::from_secs(60));
}

#[test]
fn test_status_with_two_segment_identity_is_rejected() {
    let headers = status_headers().with_device_identity("SHSW-1#2C7093");
    let result = decode_status(&raw(headers, STATUS_JSON));
    assert!(matches!(
        result,
        Err(ProtocolError::MalformedDeviceIdentity(ref id)) if id == "SHSW-1#2C7093"
    ));
}

#[test]
fn test_status_with_wrong_shape_is_a_payload_error() {
    let result = decode_status(&raw(status_headers(), r#"{ "G": [[0, "x"]] }"#));
    assert!(matches!(result, Err(ProtocolError::InvalidPayload(_))));
}

#[test]
fn test_decode_nice_description() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2")]);
    let description =
        decode_description(&raw(headers, DESCRIPTION_JSON)).expect("description should decode");

    assert_eq!(description.identity.device_type, "SHSW-1");
    assert_eq!(description.payload.blocks.len(), 1);
    assert_eq!(description.payload.blocks[0].description, "relay_0");

    let sensor = description.payload.sensor(2102).unwrap();
    assert_eq!(sensor.kind, SensorType::Event);
    assert_eq!(
        sensor.range,
        Some(SensorRange::WithInvalid("S/L".to_string(), String::new()))
    );
    assert_eq!(sensor.links, BlockLinks::One(1));

    let json = serde_json::to_value(&description).unwrap();
    assert!(json.get("serial").is_none());
    assert!(json.get("validForSeconds").is_none());
}

#[test]
fn test_description_rejects_non_numeric_serial() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2"), ("3420", "nope")]);
    let result = decode_description(&raw(headers, DESCRIPTION_JSON));
    assert!(matches!(
        result,
        Err(ProtocolError::MalformedHeader { option: 3420, .. })
    ));
}

#[test]
fn test_description_rejects_non_numeric_validity() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2"), ("3412", "not-a-number")]);
    let result = decode_description(&raw(headers, DESCRIPTION_JSON));
    assert!(matches!(
        result,
        Err(ProtocolError::MalformedHeader { option: 3412, .. })
    ));
}

#[test]
fn test_description_accepts_numeric_status_headers() {
    let description = decode_description(&raw(status_headers(), DESCRIPTION_JSON))
        .expect("numeric status headers are allowed on a description");
    let json = serde_json::to_value(&description).unwrap();
    assert!(json.get("serial").is_none());
    assert!(json.get("validForSeconds").is_none());
}

#[test]
fn test_description_with_bad_json_is_a_payload_error() {
    let headers = Headers::from_map([("3332", "SHSW-1#2C7093#2")]);
    let result = decode_description(&raw(headers, "{ imnot a json molon }"));
    assert!(matches!(result, Err(ProtocolError::InvalidPayload(_))));
}

#[test]
fn test_description_with_unknown_identity_option_is_rejected() {
    let headers = Headers::from_map([("33322222", "SHSW-1#2C7093#2")]);
    let result = decode_description(&raw(headers, DESCRIPTION_JSON));
    assert!(matches!(result, Err(ProtocolError::MissingDeviceIdentity)));
}

#[test]
fn test_decoding_is_deterministic() {
    let message = raw(status_headers(), STATUS_JSON);
    assert_eq!(decode_status(&message).unwrap(), decode_status(&message).unwrap());
}
