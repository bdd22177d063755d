use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{MailError, Result};
use crate::mail::transport::Transport;
use crate::models::{Payload, SendResponse};

const TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Postmark HTTP API client
#[derive(Clone)]
pub struct PostmarkClient {
    client: Client,
    server_token: Option<String>,
    base_url: String,
}

impl PostmarkClient {
    pub fn new(server_token: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            server_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        if config.server_token.is_none() {
            tracing::warn!("POSTMARK_SERVER_TOKEN is not set, sends will fail");
        }

        Self::new(
            config.server_token.clone(),
            &config.api_url,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let token = self
            .server_token
            .as_deref()
            .ok_or_else(|| MailError::Transport("Postmark server token is not configured".to_string()))?;

        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(TOKEN_HEADER, token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("Postmark request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => format!("{} (code {})", err.message, err.error_code),
                Err(_) => body,
            };
            return Err(MailError::Transport(format!(
                "Postmark API error ({}): {}",
                status, detail
            )));
        }

        res.json::<R>()
            .await
            .map_err(|e| MailError::Transport(format!("Invalid Postmark response: {}", e)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplatedBatch<'a> {
    messages: &'a [Payload],
}

#[async_trait]
impl Transport for PostmarkClient {
    async fn send_single(&self, payload: &Payload) -> Result<SendResponse> {
        self.post("/email", payload).await
    }

    async fn send_batch(&self, payloads: &[Payload]) -> Result<Vec<SendResponse>> {
        self.post("/email/batch", payloads).await
    }

    async fn send_batch_with_template(&self, payloads: &[Payload]) -> Result<Vec<SendResponse>> {
        self.post("/email/batchWithTemplates", &TemplatedBatch { messages: payloads })
            .await
    }
}
