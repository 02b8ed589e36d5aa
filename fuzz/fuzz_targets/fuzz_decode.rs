#![no_main]

use coiot_protocol::core::headers::Headers;
use coiot_protocol::core::message::RawInboundMessage;
use coiot_protocol::core::options::{
    COIOT_CODE, COIOT_OPTION_GLOBAL_DEVID, COIOT_OPTION_STATUS_SERIAL,
    COIOT_OPTION_STATUS_VALIDITY, COIOT_STATUS_PATH,
};
use coiot_protocol::protocol::{decode_description, decode_status};
use libfuzzer_sys::fuzz_target;

fn take<'a>(cursor: &mut &'a [u8], n: u8) -> &'a [u8] {
    let current: &'a [u8] = *cursor;
    let (head, tail) = current.split_at(usize::from(n).min(current.len()));
    *cursor = tail;
    head
}

fuzz_target!(|data: &[u8]| {
    // First bytes feed the binary options, the rest is the payload
    if data.len() < 3 {
        return;
    }
    let (lens, rest) = data.split_at(3);
    let mut cursor = rest;
    let devid = take(&mut cursor, lens[0] % 48);
    let validity = take(&mut cursor, lens[1] % 4);
    let serial = take(&mut cursor, lens[2] % 4);

    let Ok(headers) = Headers::from_options([
        (COIOT_OPTION_GLOBAL_DEVID, devid),
        (COIOT_OPTION_STATUS_VALIDITY, validity),
        (COIOT_OPTION_STATUS_SERIAL, serial),
    ]) else {
        return;
    };

    let raw = RawInboundMessage::new(
        headers,
        cursor.to_vec(),
        COIOT_CODE,
        COIOT_STATUS_PATH,
        std::net::SocketAddr::from(([127, 0, 0, 1], 5683)),
    );
    let _ = decode_status(&raw);
    let _ = decode_description(&raw);
});
