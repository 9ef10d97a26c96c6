// SafeDoser assistant entry point.
// Reads one JSON chat request on stdin and writes the JSON reply to stdout.

use std::io::Read;

use anyhow::Context;
use chrono::Utc;
use safedoser_core::config::AssistantConfig;
use safedoser_core::models::{ChatRequest, ChatResponse};
use safedoser_core::orchestrator::{ReplySource, ResponseOrchestrator};
use safedoser_core::telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AssistantConfig::load().context("Invalid configuration")?;
    telemetry::init_tracing(config.log_format)?;
    if config.env_file_loaded {
        info!("Loaded environment from .env");
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;

    let request: ChatRequest =
        serde_json::from_str(&input).context("Request is not a valid chat payload")?;
    if let Err(e) = request.ensure_valid() {
        error!("Rejected request: {}", e);
        return Err(e.into());
    }

    let orchestrator = ResponseOrchestrator::from_config(&config)?;
    let status = orchestrator.status();
    info!(
        provider_configured = status.provider_configured,
        history_window = status.history_window,
        "Response engine ready"
    );

    let now = request
        .current_time
        .unwrap_or_else(|| Utc::now().fixed_offset());
    let reply = orchestrator
        .respond_detailed(
            &request.message,
            &request.user,
            &request.supplements,
            &request.chat_history,
            now,
        )
        .await;

    let intent = match reply.source {
        ReplySource::Fallback { intent } => Some(intent.label().to_string()),
        ReplySource::Provider | ReplySource::Apology => None,
    };
    let response = ChatResponse {
        reply: reply.text,
        intent,
        timestamp: Utc::now(),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
