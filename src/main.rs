use std::io::Read;

use anyhow::{Context, Result};

use gcm_sender::config::Settings;
use gcm_sender::telemetry::init_tracing;
use gcm_sender::{Message, Sender};

/// Reads one message as JSON on stdin, sends it and prints the merged
/// gateway response as JSON on stdout.
#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging);
    tracing::info!(endpoint = %settings.gateway.endpoint, "Configuration loaded");

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read message from stdin")?;
    let message: Message = serde_json::from_str(&input).context("invalid message JSON")?;

    let sender = Sender::from_config(&settings.gateway)?;
    let response = sender.send(message).await?;

    tracing::info!(
        multicast_id = response.multicast_id(),
        success = response.success_count(),
        failure = response.failure_count(),
        "Send complete"
    );
    println!("{}", serde_json::to_string_pretty(&response.result().to_gateway_json())?);

    Ok(())
}
