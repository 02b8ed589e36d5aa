use coiot_protocol::core::headers::Headers;
use coiot_protocol::core::message::RawInboundMessage;
use coiot_protocol::core::options::{COIOT_CODE, COIOT_DESCRIPTION_PATH, COIOT_STATUS_PATH};
use coiot_protocol::protocol::{decode_description, decode_status, decode_validity};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn status_payload(readings: usize) -> Vec<u8> {
    let body: Vec<String> = (0..readings)
        .map(|i| format!("[0,{},{}.5]", 100 + i, i))
        .collect();
    format!(r#"{{"G":[{}]}}"#, body.join(",")).into_bytes()
}

fn description_payload(sensors: usize) -> Vec<u8> {
    let sen: Vec<String> = (0..sensors)
        .map(|i| {
            format!(
                r#"{{"I":{},"T":"P","D":"power_{}","U":"W","R":["0/3500","-1"],"L":[0,1]}}"#,
                100 + i,
                i
            )
        })
        .collect();
    format!(
        r#"{{"blk":[{{"I":0,"D":"Relay0"}},{{"I":1,"D":"Device"}}],"sen":[{}]}}"#,
        sen.join(",")
    )
    .into_bytes()
}

fn headers() -> Headers {
    Headers::new()
        .with_device_identity("SHSW-25#A4CF12F45A3B#2")
        .with_status_validity("38400")
        .with_status_serial("1024")
}

#[allow(clippy::unwrap_used)]
fn bench_decode_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_status");

    for &readings in &[4usize, 32, 256] {
        let payload = status_payload(readings);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        let raw = RawInboundMessage::new(
            headers(),
            payload,
            COIOT_CODE,
            COIOT_STATUS_PATH,
            "192.168.1.40:5683".parse().unwrap(),
        );
        group.bench_function(format!("{readings}_readings"), |b| {
            b.iter(|| {
                let decoded = decode_status(black_box(&raw));
                assert!(decoded.is_ok());
            })
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_decode_description(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_description");

    for &sensors in &[8usize, 64] {
        let payload = description_payload(sensors);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        let raw = RawInboundMessage::new(
            headers(),
            payload,
            "2.05",
            COIOT_DESCRIPTION_PATH,
            "192.168.1.40:5683".parse().unwrap(),
        );
        group.bench_function(format!("{sensors}_sensors"), |b| {
            b.iter(|| {
                let decoded = decode_description(black_box(&raw));
                assert!(decoded.is_ok());
            })
        });
    }

    group.finish();
}

fn bench_decode_validity(c: &mut Criterion) {
    c.bench_function("decode_validity", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for v in 0u32..1024 {
                total = total.wrapping_add(decode_validity(black_box(v)));
            }
            total
        })
    });
}

criterion_group!(
    benches,
    bench_decode_status,
    bench_decode_description,
    bench_decode_validity
);
criterion_main!(benches);
