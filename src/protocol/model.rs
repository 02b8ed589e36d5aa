//! # CoIoT Domain Model
//!
//! Typed records produced by the decoder. Every record is an immutable value
//! constructed once per inbound datagram.
//!
//! Payload field names follow the device wire format (`G`, `blk`, `sen`, `I`,
//! `T`, `D`, `U`, `R`, `L`) so decoded payloads serialize back to the same JSON.
//! Only structural validity is checked: unknown sensor type or unit tags are
//! kept verbatim rather than rejected.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::message::Location;

/// Device identity carried in the global device id option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Exact option value, `<deviceType>#<deviceId>#<protocolRevision>`
    #[serde(rename = "rawdevid")]
    pub raw: String,
    pub device_type: String,
    pub device_id: String,
    pub protocol_revision: String,
}

/// One point-in-time status snapshot, unique per `(device_id, serial)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    pub payload: DeviceStatus,
    pub location: Location,
    /// Wrapping counter, no ordering is implied across a wrap
    pub serial: u16,
    pub valid_for_seconds: u64,
}

impl StatusMessage {
    /// How long this snapshot remains current.
    pub fn valid_for(&self) -> Duration {
        Duration::from_secs(self.valid_for_seconds)
    }

    /// Deduplication key for this snapshot.
    pub fn key(&self) -> (&str, u16) {
        (&self.identity.device_id, self.serial)
    }
}

/// Static sensor/block schema of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionMessage {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    pub payload: DeviceDescription,
    pub location: Location,
}

/// Status payload served on `/cit/s` and broadcast with code `0.30`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Generic (non-encrypted) sensor readings
    #[serde(rename = "G")]
    pub generic: Vec<SensorReading>,
}

impl DeviceStatus {
    /// Current value of the sensor with the given id, first match wins.
    pub fn value(&self, sensor_id: i64) -> Option<&SensorValue> {
        self.generic
            .iter()
            .find(|reading| reading.sensor_id == sensor_id)
            .map(|reading| &reading.value)
    }
}

/// `[channel, sensorId, value]` triple. Channel is always 0 today.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub channel: u32,
    pub sensor_id: i64,
    pub value: SensorValue,
}

// Readings travel as JSON arrays, not objects.
impl<'de> Deserialize<'de> for SensorReading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (channel, sensor_id, value) = <(u32, i64, SensorValue)>::deserialize(deserializer)?;
        Ok(Self {
            channel,
            sensor_id,
            value,
        })
    }
}

impl Serialize for SensorReading {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        (self.channel, self.sensor_id, &self.value).serialize(serializer)
    }
}

/// Reported sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Number(serde_json::Number),
    Text(String),
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => n.as_f64(),
            SensorValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SensorValue::Number(_) => None,
            SensorValue::Text(s) => Some(s),
        }
    }
}

/// Description payload served on `/cit/d`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescription {
    #[serde(rename = "blk")]
    pub blocks: Vec<DeviceBlock>,
    #[serde(rename = "sen")]
    pub sensors: Vec<DeviceSensor>,
}

impl DeviceDescription {
    pub fn sensor(&self, id: i64) -> Option<&DeviceSensor> {
        self.sensors.iter().find(|sensor| sensor.id == id)
    }

    /// Sensors linked to the given block id, in declaration order.
    pub fn sensors_in_block(&self, block_id: i64) -> impl Iterator<Item = &DeviceSensor> {
        self.sensors
            .iter()
            .filter(move |sensor| sensor.links.contains(block_id))
    }
}

/// Group of sensors, e.g. one relay channel. The `device` block is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBlock {
    #[serde(rename = "I")]
    pub id: BlockId,
    #[serde(rename = "D")]
    pub description: String,
}

/// Block ids are integers on current firmware; older firmware sends strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Number(i64),
    Text(String),
}

/// One measured or stateful property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSensor {
    #[serde(rename = "I")]
    pub id: i64,
    #[serde(rename = "T")]
    pub kind: SensorType,
    #[serde(rename = "D")]
    pub description: String,
    #[serde(rename = "U", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<SensorUnit>,
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SensorRange>,
    #[serde(rename = "L")]
    pub links: BlockLinks,
}

/// Normal range, optionally paired with the value reported when data is unavailable.
///
/// Forms: `"0/100"`, `"obstacle/overpower"`, `"U16"`, `["0/255", "999"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorRange {
    Normal(String),
    WithInvalid(String, String),
}

impl SensorRange {
    pub fn normal(&self) -> &str {
        match self {
            SensorRange::Normal(normal) | SensorRange::WithInvalid(normal, _) => normal,
        }
    }

    pub fn invalid(&self) -> Option<&str> {
        match self {
            SensorRange::Normal(_) => None,
            SensorRange::WithInvalid(_, invalid) => Some(invalid),
        }
    }
}

/// Block ids a sensor relates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockLinks {
    One(i64),
    Many(Vec<i64>),
}

impl BlockLinks {
    pub fn contains(&self, block_id: i64) -> bool {
        match self {
            BlockLinks::One(id) => *id == block_id,
            BlockLinks::Many(ids) => ids.contains(&block_id),
        }
    }
}

macro_rules! wire_tag {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $tag:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Tag not known to this crate, kept verbatim
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $tag,)+
                    $name::Other(tag) => tag,
                }
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                match tag.as_str() {
                    $($tag => $name::$variant,)+
                    _ => $name::Other(tag),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(tag) => tag,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_tag! {
    /// Sensor type tag (`T`).
    SensorType {
        Alarm => "A",
        BatteryLevel => "B",
        Concentration => "C",
        Energy => "E",
        /// Event such as short/long push
        Event => "EV",
        /// Increments on every new event
        EventCounter => "EVC",
        Humidity => "H",
        Current => "I",
        Luminosity => "L",
        Power => "P",
        /// Catch-all when no other type fits
        Status => "S",
        Temperature => "T",
        Voltage => "V",
    }
}

wire_tag! {
    /// Sensor unit tag (`U`).
    SensorUnit {
        Watts => "W",
        WattMinutes => "Wmin",
        WattHours => "Wh",
        Volts => "V",
        Amperes => "A",
        Celsius => "C",
        Fahrenheit => "F",
        Kelvin => "K",
        Degrees => "deg",
        Lux => "lux",
        PartsPerMillion => "ppm",
        Seconds => "s",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_readings_parse_from_arrays() {
        let status: DeviceStatus =
            serde_json::from_value(json!({ "G": [[0, 1101, 1], [0, 2102, "S"]] })).unwrap();

        assert_eq!(status.generic.len(), 2);
        assert_eq!(status.value(1101).and_then(SensorValue::as_f64), Some(1.0));
        assert_eq!(status.value(2102).and_then(SensorValue::as_str), Some("S"));
        assert!(status.value(9999).is_none());
    }

    #[test]
    fn test_reading_serializes_back_to_array() {
        let reading = SensorReading {
            channel: 0,
            sensor_id: 1234,
            value: SensorValue::Number(0.into()),
        };
        assert_eq!(serde_json::to_value(&reading).unwrap(), json!([0, 1234, 0]));
    }

    #[test]
    fn test_description_lookup_helpers() {
        let description: DeviceDescription = serde_json::from_value(json!({
            "blk": [{ "I": 1, "D": "relay_0" }, { "I": 2, "D": "device" }],
            "sen": [
                { "I": 2102, "T": "EV", "D": "inputEvent", "R": ["S/L", ""], "L": 1 },
                { "I": 4101, "T": "P", "D": "power", "U": "W", "R": ["0/3500", "-1"], "L": 1 },
                { "I": 3104, "T": "T", "D": "deviceTemp", "U": "C", "R": "-40/300", "L": [1, 2] }
            ]
        }))
        .unwrap();

        assert_eq!(description.blocks[0].id, BlockId::Number(1));
        assert_eq!(description.sensor(4101).unwrap().unit, Some(SensorUnit::Watts));
        assert_eq!(description.sensor(2102).unwrap().kind, SensorType::Event);
        assert_eq!(
            description.sensor(2102).unwrap().range.as_ref().unwrap().invalid(),
            Some("")
        );
        assert_eq!(
            description.sensor(3104).unwrap().range.as_ref().unwrap().normal(),
            "-40/300"
        );

        let in_device: Vec<i64> = description.sensors_in_block(2).map(|s| s.id).collect();
        assert_eq!(in_device, vec![3104]);
        assert_eq!(description.sensors_in_block(1).count(), 3);
    }

    #[test]
    fn test_unknown_tags_are_preserved() {
        let sensor: DeviceSensor = serde_json::from_value(json!({
            "I": 9, "T": "X", "D": "mystery", "U": "furlong", "L": 1
        }))
        .unwrap();

        assert_eq!(sensor.kind, SensorType::Other("X".to_string()));
        assert_eq!(sensor.unit, Some(SensorUnit::Other("furlong".to_string())));
        assert_eq!(serde_json::to_value(&sensor).unwrap()["U"], json!("furlong"));
    }

    #[test]
    fn test_block_id_accepts_text() {
        let block: DeviceBlock = serde_json::from_value(json!({ "I": "1", "D": "relay_0" })).unwrap();
        assert_eq!(block.id, BlockId::Text("1".to_string()));
    }
}
