use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Payload, SendResponse};

/// Remote delivery API
///
/// Batch calls return one response per input payload, in input order.
/// Any network, auth or validation failure is a `MailError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_single(&self, payload: &Payload) -> Result<SendResponse>;

    async fn send_batch(&self, payloads: &[Payload]) -> Result<Vec<SendResponse>>;

    async fn send_batch_with_template(&self, payloads: &[Payload]) -> Result<Vec<SendResponse>>;
}
