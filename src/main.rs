use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postmark_courier::config::Config;
use postmark_courier::mail::{Mailer, SendJob};

/// Send the message described by a JSON job file:
///
/// `postmark-send job.json`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: postmark-send <job.json>")?;

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        sender = config.sender_signature.as_deref().unwrap_or("<unset>"),
        token_present = config.server_token.is_some(),
        "Configuration loaded"
    );

    let job = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let message = SendJob::from_json(&job)?.into_message()?;

    let mut mailer = Mailer::from_config(&config)?;
    let sent = mailer.send(&message).await?;

    let result = mailer.last_result();
    if let Some(failure) = result.failure() {
        tracing::warn!(error = %failure, "Send aborted early");
    }
    for response in result.single().into_iter().chain(result.responses()) {
        tracing::info!(
            to = response.to.as_deref().unwrap_or(""),
            message_id = response.message_id.as_deref().unwrap_or(""),
            "Accepted"
        );
    }

    tracing::info!(sent, accepted = result.accepted(), "Done");

    if sent == 0 {
        anyhow::bail!("No messages were accepted");
    }
    Ok(())
}
