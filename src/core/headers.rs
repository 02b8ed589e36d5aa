//! Typed CoIoT headers.
//!
//! Transports hand over option values either as a string-keyed map (option
//! number rendered as decimal text) or as raw binary options. Both forms are
//! resolved here, once, into named fields with explicit presence.

use bytes::Bytes;

use crate::core::options::{
    decode_option, encode_option, COIOT_OPTION_GLOBAL_DEVID, COIOT_OPTION_STATUS_SERIAL,
    COIOT_OPTION_STATUS_VALIDITY,
};
use crate::error::Result;

/// CoIoT header values exactly as received, before semantic validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    device_identity: Option<String>,
    status_validity: Option<String>,
    status_serial: Option<String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a string-keyed map such as `{"3332": "SHSW-1#2C7093#2"}`.
    ///
    /// Keys that are not CoIoT option numbers are ignored.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::default();
        for (key, value) in entries {
            if let Ok(number) = key.as_ref().trim().parse::<u16>() {
                headers.set(number, value.into());
            }
        }
        headers
    }

    /// Build from binary options using the CoIoT option codecs.
    pub fn from_options<'a, I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u16, &'a [u8])>,
    {
        let mut headers = Self::default();
        for (number, raw) in options {
            if let Some(value) = decode_option(number, raw)? {
                headers.set(number, value);
            }
        }
        Ok(headers)
    }

    /// Encode the present headers as binary options, ordered by option number.
    pub fn to_options(&self) -> Result<Vec<(u16, Bytes)>> {
        let mut options = Vec::with_capacity(3);
        for (number, value) in [
            (COIOT_OPTION_GLOBAL_DEVID, &self.device_identity),
            (COIOT_OPTION_STATUS_VALIDITY, &self.status_validity),
            (COIOT_OPTION_STATUS_SERIAL, &self.status_serial),
        ] {
            if let Some(value) = value {
                options.push((number, encode_option(number, value)?));
            }
        }
        Ok(options)
    }

    pub fn with_device_identity(mut self, value: impl Into<String>) -> Self {
        self.device_identity = Some(value.into());
        self
    }

    pub fn with_status_validity(mut self, value: impl Into<String>) -> Self {
        self.status_validity = Some(value.into());
        self
    }

    pub fn with_status_serial(mut self, value: impl Into<String>) -> Self {
        self.status_serial = Some(value.into());
        self
    }

    pub fn device_identity(&self) -> Option<&str> {
        self.device_identity.as_deref()
    }

    pub fn status_validity(&self) -> Option<&str> {
        self.status_validity.as_deref()
    }

    pub fn status_serial(&self) -> Option<&str> {
        self.status_serial.as_deref()
    }

    fn set(&mut self, number: u16, value: String) {
        match number {
            COIOT_OPTION_GLOBAL_DEVID => self.device_identity = Some(value),
            COIOT_OPTION_STATUS_VALIDITY => self.status_validity = Some(value),
            COIOT_OPTION_STATUS_SERIAL => self.status_serial = Some(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_map_resolves_known_options() {
        let map: HashMap<&str, &str> = [
            ("3332", "SHSW-1#2C7093#2"),
            ("3412", "38400"),
            ("3420", "59136"),
            ("12", "50"),
        ]
        .into_iter()
        .collect();

        let headers = Headers::from_map(map);
        assert_eq!(headers.device_identity(), Some("SHSW-1#2C7093#2"));
        assert_eq!(headers.status_validity(), Some("38400"));
        assert_eq!(headers.status_serial(), Some("59136"));
    }

    #[test]
    fn test_from_map_ignores_unrelated_keys() {
        let headers = Headers::from_map([("33322222", "SHSW-1#2C7093#2"), ("ETag", "x")]);
        assert_eq!(headers, Headers::default());
    }

    #[test]
    fn test_binary_options_roundtrip_through_codecs() {
        let headers = Headers::new()
            .with_device_identity("SHDM-1#A1B2C3#2")
            .with_status_validity("38400")
            .with_status_serial("12");

        let options = headers.to_options().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[2], (COIOT_OPTION_STATUS_SERIAL, Bytes::from_static(&[12])));

        let decoded =
            Headers::from_options(options.iter().map(|(n, v)| (*n, v.as_ref()))).unwrap();
        assert_eq!(decoded, headers);
    }

    #[test]
    fn test_absent_headers_are_not_encoded() {
        let headers = Headers::new().with_device_identity("SHSW-1#2C7093#2");
        let options = headers.to_options().unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].0, COIOT_OPTION_GLOBAL_DEVID);
    }
}
