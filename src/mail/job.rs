//! JSON job description for one send, as consumed by the `postmark-send` binary.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MailError, Result};
use crate::mail::address_book::AddressInput;
use crate::mail::message::Message;
use crate::models::{TrackLinks, Variables};

/// Address field in any of the accepted JSON shapes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddressField {
    Text(String),
    List(Vec<String>),
    Named(IndexMap<String, String>),
}

impl From<AddressField> for AddressInput {
    fn from(field: AddressField) -> Self {
        match field {
            AddressField::Text(text) => AddressInput::Text(text),
            AddressField::List(list) => AddressInput::List(list),
            AddressField::Named(map) => AddressInput::from(map),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendJob {
    pub to: AddressField,
    #[serde(default)]
    pub cc: Option<AddressField>,
    #[serde(default)]
    pub bcc: Option<AddressField>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub message_stream: Option<String>,
    #[serde(default)]
    pub batch: bool,
    /// Alias, or a numeric template id
    #[serde(default)]
    pub template: Option<Value>,
    #[serde(default)]
    pub template_variables: Variables,
    #[serde(default)]
    pub inline_css: Option<bool>,
    #[serde(default)]
    pub recipient_variables: IndexMap<String, Variables>,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    #[serde(default)]
    pub inline_images: Vec<PathBuf>,
    #[serde(default)]
    pub track_opens: Option<bool>,
    /// `true`/`false` or one of the TrackLinks names
    #[serde(default)]
    pub track_links: Option<Value>,
}

impl SendJob {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the message. Invalid addresses abort; invalid recipient-variable
    /// keys are skipped.
    pub fn into_message(self) -> Result<Message> {
        let mut message = Message::new();
        message.to(self.to)?;
        if let Some(cc) = self.cc {
            message.cc(cc)?;
        }
        if let Some(bcc) = self.bcc {
            message.bcc(bcc)?;
        }
        if let Some(reply_to) = self.reply_to {
            message.reply_to(&reply_to, None)?;
        }
        if let Some(template) = self.template {
            match template {
                Value::String(reference) => {
                    message.template(&reference)?;
                }
                Value::Number(id) => match id.as_u64() {
                    Some(id) => {
                        message.template_ref(id);
                    }
                    None => {
                        return Err(MailError::InvalidTemplate(format!(
                            "template id must be a non-negative integer, got {}",
                            id
                        )));
                    }
                },
                other => {
                    return Err(MailError::InvalidTemplate(format!(
                        "template must be an alias or a numeric id, got {}",
                        other
                    )));
                }
            }
            if let Some(inline_css) = self.inline_css {
                message.inline_css(inline_css);
            }
        }

        if let Some(from) = self.from {
            message.sender_signature(from);
        }
        if let Some(subject) = self.subject {
            message.subject(subject);
        }
        if let Some(html) = self.html {
            message.body_html(html);
        }
        if let Some(text) = self.text {
            message.body_text(text);
        }
        if let Some(tag) = self.tag {
            message.tag(tag);
        }
        if let Some(stream) = self.message_stream {
            message.message_stream(stream);
        }
        if let Some(track_opens) = self.track_opens {
            message.track_opens(track_opens);
        }
        if let Some(track_links) = self.track_links {
            message.track_links(track_links_from_value(&track_links));
        }
        for (name, value) in self.headers {
            message.header(name, value);
        }
        for path in &self.attachments {
            message.attach(path, None);
        }
        for path in &self.inline_images {
            message.attach_inline_image(path, None);
        }

        message
            .send_batch(self.batch)
            .template_variables(self.template_variables)
            .recipient_variables(self.recipient_variables)
            .metadata_map(self.metadata);

        Ok(message)
    }
}

/// Any value that is neither a bool nor a known name disables link tracking.
fn track_links_from_value(value: &Value) -> TrackLinks {
    match value {
        Value::Bool(enabled) => TrackLinks::from_bool(*enabled),
        Value::String(name) => TrackLinks::from_name(name),
        other => {
            tracing::warn!(value = %other, "Unsupported TrackLinks value, tracking disabled");
            TrackLinks::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipientClass, TemplateRef};
    use serde_json::json;

    #[test]
    fn test_job_into_message() {
        let job = SendJob::from_json(
            r#"{
                "to": {"ann@example.com": "Ann", "bob@example.com": ""},
                "cc": "Carl <carl@example.com>",
                "bcc": ["audit@example.com"],
                "subject": "Hi {{toName}}",
                "text": "Hello",
                "batch": true,
                "template": 1234,
                "inline_css": false,
                "template_variables": {"company": "Acme"},
                "recipient_variables": {"ann@example.com": {"plan": "pro"}, "broken": {"x": 1}},
                "metadata": {"campaign": "spring"},
                "track_links": "HtmlOnly"
            }"#,
        )
        .unwrap();

        let message = job.into_message().unwrap();

        assert_eq!(message.addresses().len(RecipientClass::To), 2);
        assert_eq!(message.addresses().len(RecipientClass::Cc), 1);
        assert_eq!(message.addresses().len(RecipientClass::Bcc), 1);
        assert!(message.is_batch());
        let template = message.template_spec().unwrap();
        assert_eq!(template.reference, TemplateRef::ById(1234));
        assert!(!template.inline_css);
        assert_eq!(message.template_vars()["company"], json!("Acme"));
        assert_eq!(message.recipient_vars().len(), 1);
        assert_eq!(message.metadata_entries()["campaign"], "spring");
        assert_eq!(message.track_links_override(), Some(TrackLinks::HtmlOnly));
    }

    #[test]
    fn test_job_invalid_address_aborts() {
        let job = SendJob::from_json(r#"{"to": "not-an-address"}"#).unwrap();
        assert!(matches!(job.into_message(), Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_job_rejects_malformed_template() {
        for template in ["true", "{\"id\": 1}", "[1]", "-5", "1.5", "\"  \""] {
            let job = SendJob::from_json(&format!(
                r#"{{"to": "a@example.com", "template": {}}}"#,
                template
            ))
            .unwrap();
            assert!(
                matches!(job.into_message(), Err(MailError::InvalidTemplate(_))),
                "template: {}",
                template
            );
        }
    }

    #[test]
    fn test_track_links_values() {
        assert_eq!(track_links_from_value(&json!(true)), TrackLinks::HtmlAndText);
        assert_eq!(track_links_from_value(&json!(false)), TrackLinks::None);
        assert_eq!(track_links_from_value(&json!("TextOnly")), TrackLinks::TextOnly);
        assert_eq!(track_links_from_value(&json!("Always")), TrackLinks::None);
        assert_eq!(track_links_from_value(&json!(3)), TrackLinks::None);
    }
}
