//! Example: Listening for Status Broadcasts
//!
//! This example wires a broadcast listener to the in-memory transport, feeds it
//! a few datagrams the way a bound socket would, and prints every decoded
//! status. The malformed broadcast in the middle is dropped without stopping
//! the listener.
//!
//! Run with: `cargo run --example status_listener`

#![allow(clippy::uninlined_format_args)]

use coiot_protocol::config::CoiotConfig;
use coiot_protocol::core::headers::Headers;
use coiot_protocol::core::message::RawInboundMessage;
use coiot_protocol::core::options::{COIOT_CODE, COIOT_STATUS_PATH};
use coiot_protocol::service::{CoiotServer, ServerEvent};
use coiot_protocol::transport::memory::MemoryTransport;
use coiot_protocol::utils::{global_metrics, init_logging, init_metrics};
use std::time::Duration;

fn broadcast(device: &str, serial: u16, payload: &'static str) -> RawInboundMessage {
    RawInboundMessage::new(
        Headers::new()
            .with_device_identity(device)
            .with_status_validity("38400")
            .with_status_serial(serial.to_string()),
        payload.as_bytes(),
        COIOT_CODE,
        COIOT_STATUS_PATH,
        ([192, 168, 1, 40], 5683).into(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoiotConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging)?;
    init_metrics();

    println!("=== CoIoT Status Listener Demo ===\n");
    println!(
        "Listening on {} (group {})\n",
        config.server.bind_addr()?,
        config.server.multicast_group()?
    );

    let transport = MemoryTransport::new();
    let (mut server, mut events) = CoiotServer::from_config(transport.clone(), &config.server)?;
    server.listen().await?;

    transport.inject(broadcast("SHSW-25#A4CF12F45A3B#2", 1, r#"{"G":[[0,112,1]]}"#))?;
    transport.inject(broadcast("SHSW-25#A4CF12F45A3B#2", 2, "{truncated"))?;
    transport.inject(broadcast("SHPLG-S#6A3F21#2", 7, r#"{"G":[[0,111,12.7]]}"#))?;

    let mut statuses = 0;
    while statuses < 2 {
        match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
            Ok(Some(ServerEvent::Status { status, reply })) => {
                statuses += 1;
                println!(
                    "{} #{} valid for {:?}: {}",
                    status.identity.device_id,
                    status.serial,
                    status.valid_for(),
                    serde_json::to_string(&status.payload)?
                );
                // Broadcasts are non-confirmable; leave the exchange unanswered
                drop(reply);
            }
            Ok(Some(ServerEvent::Listening)) => println!("listener ready"),
            Ok(Some(other)) => println!("event: {:?}", other),
            Ok(None) | Err(_) => break,
        }
    }

    server.close().await?;
    global_metrics().log_metrics();
    println!("\ndecode failures: {}", global_metrics().snapshot().decode_failures);

    Ok(())
}
