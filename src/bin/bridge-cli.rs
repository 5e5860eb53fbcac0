use bytes::Bytes;
use chrono::Utc;
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use ilp_http_bridge::http::{ILP_CONTENT_TYPE, ILP_PEER_NAME};
use ilp_http_bridge::packet::{Fulfill, PacketType, Prepare, Reject};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Check and exercise an ILP-over-HTTP bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Bearer token presented to the bridge.
    #[arg(short, long, default_value = "")]
    token: String,

    /// Value of the ILP-Peer-Name header.
    #[arg(short, long, default_value = "bridge-cli")]
    name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the bridge is listening
    Health,
    /// Send a Prepare packet and decode the response
    Prepare {
        #[arg(short, long)]
        destination: String,

        #[arg(short, long, default_value_t = 0)]
        amount: u64,

        /// UTF-8 payload carried in the packet data.
        #[arg(long, default_value = "")]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(&cli.url).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
        Commands::Prepare {
            destination,
            amount,
            data,
        } => {
            let prepare = Prepare {
                amount,
                expires_at: Utc::now() + chrono::Duration::seconds(30),
                execution_condition: Sha256::digest(Uuid::new_v4().as_bytes()).into(),
                destination,
                data: Bytes::from(data),
            };

            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
            );
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ILP_CONTENT_TYPE));
            headers.insert(ILP_PEER_NAME, HeaderValue::from_str(&cli.name)?);

            let res = client
                .post(&cli.url)
                .headers(headers)
                .body(prepare.to_bytes())
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.bytes().await?;
    if !status.is_success() {
        eprintln!("Error: bridge returned status {}", status);
        eprintln!("Response: {}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    let summary = match PacketType::of(&body)? {
        PacketType::Fulfill => {
            let fulfill = Fulfill::from_bytes(&body)?;
            json!({
                "type": "fulfill",
                "data_len": fulfill.data.len(),
            })
        }
        PacketType::Reject => {
            let reject = Reject::from_bytes(&body)?;
            json!({
                "type": "reject",
                "code": reject.code,
                "triggered_by": reject.triggered_by,
                "message": reject.message,
            })
        }
        PacketType::Prepare => json!({ "type": "prepare" }),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
