//! Submits a plan through the transport and aggregates the responses.
//!
//! Chunks go out strictly in plan order, one call at a time. A failed call
//! stops the send; responses collected before it stay available.

use crate::mail::planner::{SendPlan, Strategy};
use crate::mail::transport::Transport;
use crate::models::SendResponse;

/// Outcome of one send
#[derive(Debug, Clone, Default)]
pub struct SendResult {
    single: Option<SendResponse>,
    responses: Vec<SendResponse>,
    sent: usize,
    submitted: usize,
    rejected: usize,
    failure: Option<String>,
}

impl SendResult {
    /// Reported send count.
    ///
    /// When every chunk was submitted this is the plan's full recipient count
    /// as soon as any payload was accepted, and 0 otherwise; rejections within
    /// submitted chunks do not shrink it. A transport failure stops the send,
    /// and the count is then only the responses accepted before the failure.
    /// Use [`SendResult::accepted`] and [`SendResult::is_complete`] for exact
    /// accounting.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Response of a single-mode send
    pub fn single(&self) -> Option<&SendResponse> {
        self.single.as_ref()
    }

    /// Accepted responses of a batch send, in submission order
    pub fn responses(&self) -> &[SendResponse] {
        &self.responses
    }

    pub fn response_at(&self, index: usize) -> Option<&SendResponse> {
        self.responses.get(index)
    }

    /// The single-mode response, or the most recent batch response
    pub fn latest(&self) -> Option<&SendResponse> {
        self.single.as_ref().or_else(|| self.responses.last())
    }

    /// Number of payloads the provider accepted
    pub fn accepted(&self) -> usize {
        usize::from(self.single.as_ref().is_some_and(SendResponse::is_accepted)) + self.responses.len()
    }

    /// Payloads answered with a response lacking a message id
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Transport error that aborted the send, if any
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Every planned payload was submitted and accepted
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.submitted > 0 && self.accepted() == self.submitted
    }
}

pub async fn dispatch<T>(transport: &T, plan: &SendPlan) -> SendResult
where
    T: Transport + ?Sized,
{
    let mut result = SendResult {
        submitted: plan.payloads.len(),
        ..Default::default()
    };

    if plan.strategy == Strategy::Single && plan.payloads.len() == 1 {
        match transport.send_single(&plan.payloads[0]).await {
            Ok(response) => {
                if response.is_accepted() {
                    result.sent = plan.recipients;
                } else {
                    log_rejected(&response);
                    result.rejected = 1;
                }
                result.single = Some(response);
            }
            Err(e) => {
                tracing::error!(error = %e, "Send failed");
                result.failure = Some(e.to_string());
            }
        }
        return result;
    }

    let templated = plan.strategy == Strategy::Templated;
    let chunks = plan.chunk_count();
    for (index, chunk) in plan.chunks().enumerate() {
        let call = if templated {
            transport.send_batch_with_template(chunk).await
        } else {
            transport.send_batch(chunk).await
        };

        match call {
            Ok(responses) => {
                for response in responses {
                    if response.is_accepted() {
                        result.responses.push(response);
                    } else {
                        log_rejected(&response);
                        result.rejected += 1;
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    chunk = index,
                    chunks,
                    accepted = result.responses.len(),
                    error = %e,
                    "Batch send failed, remaining chunks skipped"
                );
                result.failure = Some(e.to_string());
                break;
            }
        }
    }

    result.sent = if result.failure.is_some() {
        result.responses.len()
    } else if result.responses.is_empty() {
        0
    } else {
        plan.recipients
    };
    result
}

fn log_rejected(response: &SendResponse) {
    tracing::warn!(
        to = response.to.as_deref().unwrap_or(""),
        code = response.error_code,
        message = %response.message,
        "Message rejected"
    );
}
