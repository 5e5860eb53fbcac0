//! ILP-over-HTTP bridge node.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 HTTP BRIDGE                  │
//!                         │                                              │
//!     Peer POST           │  ┌────────┐   ┌──────┐   ┌───────────────┐   │
//!     ────────────────────┼─▶│  http  │──▶│ auth │──▶│ ILDCP / data  │   │
//!                         │  │ server │   │ gate │   │   handler     │   │
//!                         │  └────────┘   └──────┘   └───────┬───────┘   │
//!                         │                                  │           │
//!     send_data()         │  ┌────────┐   ┌──────────┐   ┌───▼───────┐   │
//!     ────────────────────┼─▶│ sender │──▶│transport │──▶│ HTTP/1.1  │───┼──▶ Peer
//!                         │  │        │   │   pool   │   │ or HTTP/2 │   │
//!                         │  └────────┘   └──────────┘   └───────────┘   │
//!                         │                                              │
//!                         │  lifecycle: connect / disconnect / sessions  │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! Run standalone, the node answers every Prepare with an `F02 Unreachable`
//! reject, which is enough to exercise a peer's configuration.

use bytes::Bytes;
use clap::Parser;
use std::path::PathBuf;

use ilp_http_bridge::config::loader::load_config;
use ilp_http_bridge::observability::logging;
use ilp_http_bridge::packet::{Prepare, Reject};
use ilp_http_bridge::{HandlerError, HttpBridge};

#[derive(Parser)]
#[command(name = "ilp-http-bridge")]
#[command(about = "Carry Interledger packets over HTTP", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "bridge.toml")]
    config: PathBuf,
}

fn unreachable_reject(triggered_by: &str, data: &[u8]) -> Bytes {
    let (code, message) = match Prepare::from_bytes(data) {
        Ok(prepare) => ("F02", format!("no route to {}", prepare.destination)),
        Err(e) => ("F01", format!("invalid packet: {}", e)),
    };
    Reject {
        code: code.to_string(),
        triggered_by: triggered_by.to_string(),
        message,
        data: Bytes::new(),
    }
    .to_bytes()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!("ilp-http-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.listener.port,
        outgoing_url = %config.outgoing.url,
        http_version = ?config.outgoing.http_version,
        multi_tenant = config.multi_tenant,
        "Configuration loaded"
    );

    let triggered_by = config
        .ildcp
        .as_ref()
        .map(|ildcp| ildcp.client_address.clone())
        .unwrap_or_default();

    let bridge = HttpBridge::new(config)?;
    bridge.register_data_handler(move |data: Bytes| {
        let reject = unreachable_reject(&triggered_by, &data);
        async move { Ok::<_, HandlerError>(reject) }
    });
    bridge.connect().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    bridge.disconnect().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
