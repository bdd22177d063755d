//! Builds the message-level payload every planned payload starts from.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::Config;
use crate::error::{MailError, Result};
use crate::mail::content::{HtmlToText, MimeLookup};
use crate::mail::message::Message;
use crate::models::{Attachment, Header, Payload, RecipientClass, TrackLinks};

/// Process-wide defaults a message falls back on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub sender_signature: Option<String>,
    pub track_opens: bool,
    pub track_links: TrackLinks,
}

impl From<&Config> for Defaults {
    fn from(config: &Config) -> Self {
        Self {
            sender_signature: config.sender_signature.clone(),
            track_opens: config.track_opens,
            track_links: config.track_links,
        }
    }
}

/// Compose the shared payload for `message`. `To` is left empty for the
/// planner to fill.
pub async fn assemble(
    message: &Message,
    defaults: &Defaults,
    html_to_text: &dyn HtmlToText,
    mime: &dyn MimeLookup,
) -> Result<Payload> {
    let from = message
        .sender()
        .or(defaults.sender_signature.as_deref())
        .map(str::trim)
        .filter(|sender| !sender.is_empty())
        .ok_or(MailError::NoSender)?
        .to_string();

    let html_body = message.html().filter(|html| !html.is_empty()).map(str::to_string);
    let text_body = match message.text().filter(|text| !text.is_empty()) {
        Some(text) => Some(text.to_string()),
        None => html_body.as_deref().map(|html| html_to_text.to_plain_text(html)),
    };

    let reply_to = message.reply_to_address().map(|address| address.to_string());

    let headers: Vec<Header> = message
        .headers()
        .iter()
        .filter(|(name, _)| reply_to.is_none() || !name.eq_ignore_ascii_case("Reply-To"))
        .map(|(name, value)| Header {
            name: name.clone(),
            value: value.clone(),
        })
        .collect();

    let attachments = load_attachments(message, mime).await;
    let metadata = message.metadata_entries();

    Ok(Payload {
        from,
        to: String::new(),
        cc: message.addresses().joined(RecipientClass::Cc),
        bcc: message.addresses().joined(RecipientClass::Bcc),
        subject: message.subject_text().map(str::to_string),
        html_body,
        text_body,
        tag: message.tag_value().filter(|tag| !tag.is_empty()).map(str::to_string),
        track_opens: message.track_opens_override().unwrap_or(defaults.track_opens),
        track_links: message.track_links_override().unwrap_or(defaults.track_links),
        reply_to,
        headers: (!headers.is_empty()).then_some(headers),
        attachments: (!attachments.is_empty()).then_some(attachments),
        metadata: (!metadata.is_empty()).then(|| metadata.clone()),
        message_stream: message.stream().map(str::to_string),
        ..Default::default()
    })
}

/// Files that cannot be read or classified are skipped.
async fn load_attachments(message: &Message, mime: &dyn MimeLookup) -> Vec<Attachment> {
    let regular = message
        .attachments()
        .iter()
        .map(|(name, path)| (name, path, None));
    let inline = message
        .inline_images()
        .iter()
        .map(|(name, path)| (name, path, Some(format!("cid:{}", name))));

    let mut loaded = Vec::new();
    for (name, path, content_id) in regular.chain(inline) {
        match load_attachment(path, name, content_id, mime).await {
            Ok(attachment) => loaded.push(attachment),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping attachment");
            }
        }
    }
    loaded
}

async fn load_attachment(
    path: &Path,
    name: &str,
    content_id: Option<String>,
    mime: &dyn MimeLookup,
) -> Result<Attachment> {
    let content_type = mime
        .mime_type_of(path)
        .ok_or_else(|| MailError::MimeLookup(format!("unknown type for {}", path.display())))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MailError::MimeLookup(format!("{}: {}", path.display(), e)))?;

    Ok(Attachment {
        name: name.to_string(),
        content: STANDARD.encode(bytes),
        content_type,
        content_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::content::{GuessMime, StripTags};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn defaults() -> Defaults {
        Defaults {
            sender_signature: Some("Sender <sender@example.com>".to_string()),
            track_opens: true,
            track_links: TrackLinks::HtmlAndText,
        }
    }

    #[tokio::test]
    async fn test_assemble_message_fields() {
        let mut message = Message::new();
        message.to("ann@example.com").unwrap();
        message.cc("Carl <carl@example.com>").unwrap();
        message
            .subject("Welcome")
            .body_html("<p>Hello <b>there</b></p>")
            .tag("onboarding")
            .header("X-Campaign", "spring")
            .metadata("client", "42")
            .message_stream("outbound")
            .track_links("TextOnly");

        let payload = assemble(&message, &defaults(), &StripTags, &GuessMime)
            .await
            .unwrap();

        assert_eq!(payload.from, "Sender <sender@example.com>");
        assert_eq!(payload.to, "");
        assert_eq!(payload.cc.as_deref(), Some("Carl <carl@example.com>"));
        assert_eq!(payload.bcc, None);
        assert_eq!(payload.subject.as_deref(), Some("Welcome"));
        assert_eq!(payload.text_body.as_deref(), Some("Hello there"));
        assert_eq!(payload.tag.as_deref(), Some("onboarding"));
        assert!(payload.track_opens);
        assert_eq!(payload.track_links, TrackLinks::TextOnly);
        assert_eq!(payload.headers.as_ref().map(Vec::len), Some(1));
        assert_eq!(payload.metadata.as_ref().unwrap()["client"], "42");
        assert_eq!(payload.message_stream.as_deref(), Some("outbound"));
        assert_eq!(payload.attachments, None);
        assert!(!payload.is_templated());
    }

    #[tokio::test]
    async fn test_message_sender_overrides_default() {
        let mut message = Message::new();
        message.sender_signature("other@example.com").track_opens(false);

        let payload = assemble(&message, &defaults(), &StripTags, &GuessMime)
            .await
            .unwrap();
        assert_eq!(payload.from, "other@example.com");
        assert!(!payload.track_opens);
    }

    #[tokio::test]
    async fn test_missing_sender_fails_fast() {
        let no_sender = Defaults {
            sender_signature: None,
            ..defaults()
        };
        let result = assemble(&Message::new(), &no_sender, &StripTags, &GuessMime).await;
        assert!(matches!(result, Err(MailError::NoSender)));
    }

    #[tokio::test]
    async fn test_reply_to_replaces_header() {
        let mut message = Message::new();
        message.reply_to("help@example.com", Some("Support")).unwrap();
        message.header("Reply-To", "old@example.com").header("X-Id", "1");

        let payload = assemble(&message, &defaults(), &StripTags, &GuessMime)
            .await
            .unwrap();

        assert_eq!(payload.reply_to.as_deref(), Some("Support <help@example.com>"));
        let headers = payload.headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, "X-Id");
    }

    #[tokio::test]
    async fn test_attachments_loaded_and_unreadable_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"hello").unwrap();
        let image_path = dir.path().join("logo.png");
        std::fs::write(&image_path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut message = Message::new();
        message
            .attach(&file_path, None)
            .attach(dir.path().join("missing.pdf"), None)
            .attach(dir.path().join("mystery"), None)
            .attach_inline_image(&image_path, None);

        let payload = assemble(&message, &defaults(), &StripTags, &GuessMime)
            .await
            .unwrap();
        let attachments = payload.attachments.unwrap();

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].name, "notes.txt");
        assert_eq!(attachments[0].content, "aGVsbG8=");
        assert_eq!(attachments[0].content_type, "text/plain");
        assert_eq!(attachments[0].content_id, None);
        assert_eq!(attachments[1].name, "logo.png");
        assert_eq!(attachments[1].content_id.as_deref(), Some("cid:logo.png"));
    }
}
