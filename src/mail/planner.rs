//! Send strategy selection and partitioning
//!
//! Given a message and its assembled base payload, decide how many payloads
//! are needed and what each one carries, keeping every payload within the
//! provider's recipients-per-message limit.

use std::slice::Chunks;

use serde_json::Value;

use crate::error::{MailError, Result};
use crate::mail::address_book::sanitize_name;
use crate::mail::message::Message;
use crate::mail::variables::{resolve_for, resolved_name, substitute};
use crate::models::{join_addresses, mailbox, Payload, RecipientClass, Variables};

/// Max recipients in a single message's `To` field
pub const TO_LIMIT: usize = 50;
/// Max payloads in one batch call
pub const BATCH_LIMIT: usize = 500;

/// Template-model keys carrying the recipient-substituted bodies
pub const MODEL_TEXT_BODY: &str = "body";
pub const MODEL_HTML_BODY: &str = "bodyHTML";

/// Recipient-variable keys that replace the message's Cc/Bcc for one recipient
pub const CC_OVERRIDE: &str = "Cc";
pub const BCC_OVERRIDE: &str = "Bcc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One payload with every `To` recipient
    Single,
    /// `To` split into slices of at most `TO_LIMIT`, content shared
    Sliced,
    /// One payload per recipient with subject and bodies substituted
    PerRecipient,
    /// One payload per recipient rendered by a remote template
    Templated,
}

impl Strategy {
    pub fn is_batch(&self) -> bool {
        !matches!(self, Strategy::Single)
    }
}

/// Ordered provider-ready payloads for one send
#[derive(Debug, Clone)]
pub struct SendPlan {
    pub strategy: Strategy,
    pub payloads: Vec<Payload>,
    /// Number of `To` recipients the plan covers
    pub recipients: usize,
}

impl SendPlan {
    /// Batch-call sized groups, in plan order
    pub fn chunks(&self) -> Chunks<'_, Payload> {
        self.payloads.chunks(BATCH_LIMIT)
    }

    pub fn chunk_count(&self) -> usize {
        self.payloads.len().div_ceil(BATCH_LIMIT)
    }
}

pub fn plan(message: &Message, base: &Payload) -> Result<SendPlan> {
    let to_count = message.addresses().len(RecipientClass::To);
    if to_count == 0 {
        return Err(MailError::NoRecipients);
    }

    let strategy = if message.template_spec().is_some() {
        Strategy::Templated
    } else if message.is_batch() {
        Strategy::PerRecipient
    } else if to_count > TO_LIMIT {
        Strategy::Sliced
    } else {
        Strategy::Single
    };

    let payloads = match strategy {
        Strategy::Single => vec![with_to(base, message.addresses().joined(RecipientClass::To))],
        Strategy::Sliced => sliced(message, base),
        Strategy::PerRecipient | Strategy::Templated => per_recipient(message, base),
    };

    tracing::debug!(
        strategy = ?strategy,
        recipients = to_count,
        payloads = payloads.len(),
        "Send planned"
    );

    Ok(SendPlan {
        strategy,
        payloads,
        recipients: to_count,
    })
}

fn with_to(base: &Payload, to: Option<String>) -> Payload {
    Payload {
        to: to.unwrap_or_default(),
        ..base.clone()
    }
}

fn sliced(message: &Message, base: &Payload) -> Vec<Payload> {
    let to: Vec<_> = message.addresses().addresses(RecipientClass::To).collect();
    to.chunks(TO_LIMIT)
        .map(|slice| with_to(base, Some(join_addresses(slice.iter().copied()))))
        .collect()
}

fn per_recipient(message: &Message, base: &Payload) -> Vec<Payload> {
    message
        .addresses()
        .addresses(RecipientClass::To)
        .map(|address| {
            let variables = resolve_for(
                address.email(),
                message.template_vars(),
                message.recipient_vars(),
                address.name(),
            );
            let to = mailbox(address.email(), &sanitize_name(&resolved_name(&variables)));

            let mut payload = Payload {
                to,
                cc: override_or(&variables, CC_OVERRIDE, &base.cc),
                bcc: override_or(&variables, BCC_OVERRIDE, &base.bcc),
                ..base.clone()
            };

            match message.template_spec() {
                Some(template) => {
                    payload.set_template(&template.reference);
                    payload.inline_css = Some(template.inline_css);
                    payload.template_model = Some(template_model(variables, base));
                    payload.subject = None;
                    payload.html_body = None;
                    payload.text_body = None;
                }
                None => {
                    payload.subject = base.subject.as_deref().map(|s| substitute(s, &variables));
                    payload.html_body = base.html_body.as_deref().map(|s| substitute(s, &variables));
                    payload.text_body = base.text_body.as_deref().map(|s| substitute(s, &variables));
                }
            }

            payload
        })
        .collect()
}

/// Resolved variables plus the substituted bodies, for templates that embed them
fn template_model(mut variables: Variables, base: &Payload) -> Variables {
    let text = base.text_body.as_deref().map(|s| substitute(s, &variables));
    let html = base.html_body.as_deref().map(|s| substitute(s, &variables));

    if let Some(text) = text {
        variables.insert(MODEL_TEXT_BODY.to_string(), Value::String(text));
    }
    if let Some(html) = html {
        variables.insert(MODEL_HTML_BODY.to_string(), Value::String(html));
    }
    variables
}

/// A string under `key` replaces `fallback` outright; an empty string removes it.
fn override_or(variables: &Variables, key: &str, fallback: &Option<String>) -> Option<String> {
    match variables.get(key) {
        Some(Value::String(value)) if value.trim().is_empty() => None,
        Some(Value::String(value)) => Some(value.clone()),
        _ => fallback.clone(),
    }
}
