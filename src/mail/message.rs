//! Caller-facing message builder
//!
//! Setters take `&mut self` and chain. The same `Message` may be sent more
//! than once; per-send state (recipients, recipient variables, tracking
//! overrides) is cleared with [`Message::reset_recipients`].

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::Result;
use crate::mail::address_book::{parse_address, AddressBook, AddressInput};
use crate::mail::variables::RecipientVariables;
use crate::models::{Address, RecipientClass, TemplateRef, TrackLinks, Variables};

/// Remote template selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    pub reference: TemplateRef,
    pub inline_css: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    addresses: AddressBook,
    recipient_variables: RecipientVariables,
    template_variables: Variables,
    template: Option<TemplateSpec>,
    subject: Option<String>,
    html_body: Option<String>,
    text_body: Option<String>,
    sender_signature: Option<String>,
    reply_to: Option<Address>,
    tag: Option<String>,
    track_opens: Option<bool>,
    track_links: Option<TrackLinks>,
    headers: IndexMap<String, String>,
    attachments: IndexMap<String, PathBuf>,
    inline_images: IndexMap<String, PathBuf>,
    metadata: IndexMap<String, String>,
    message_stream: Option<String>,
    batch: bool,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Recipients ====================

    /// Add `To` recipients. `None` clears them. Valid entries are kept even
    /// when the call reports `InvalidAddress` for others.
    pub fn to(&mut self, input: impl Into<AddressInput>) -> Result<&mut Self> {
        self.addresses.set(RecipientClass::To, input, None)?;
        Ok(self)
    }

    /// Like [`Message::to`], naming every entry that carries no name of its own
    pub fn to_named(&mut self, input: impl Into<AddressInput>, name: &str) -> Result<&mut Self> {
        self.addresses.set(RecipientClass::To, input, Some(name))?;
        Ok(self)
    }

    pub fn cc(&mut self, input: impl Into<AddressInput>) -> Result<&mut Self> {
        self.addresses.set(RecipientClass::Cc, input, None)?;
        Ok(self)
    }

    pub fn bcc(&mut self, input: impl Into<AddressInput>) -> Result<&mut Self> {
        self.addresses.set(RecipientClass::Bcc, input, None)?;
        Ok(self)
    }

    pub fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    pub fn addresses_mut(&mut self) -> &mut AddressBook {
        &mut self.addresses
    }

    /// Merge variables for every email in `mapping`; invalid emails are skipped.
    pub fn recipient_variables(
        &mut self,
        mapping: impl IntoIterator<Item = (String, Variables)>,
    ) -> &mut Self {
        self.recipient_variables.merge_all(mapping);
        self
    }

    /// Merge variables for a single recipient
    pub fn recipient_variables_for(&mut self, email: &str, variables: Variables) -> &mut Self {
        self.recipient_variables.merge(email, variables);
        self
    }

    pub fn recipient_vars(&self) -> &RecipientVariables {
        &self.recipient_variables
    }

    /// Clear everything that should not carry over into an unrelated send.
    pub fn reset_recipients(&mut self) -> &mut Self {
        self.addresses.clear_all();
        self.recipient_variables.clear();
        self.track_opens = None;
        self.track_links = None;
        self
    }

    // ==================== Content ====================

    pub fn subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn body_html(&mut self, html: impl Into<String>) -> &mut Self {
        self.html_body = Some(html.into());
        self
    }

    /// Plain text body; derived from the HTML body when left empty
    pub fn body_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text_body = Some(text.into());
        self
    }

    /// Override the configured sender signature (`Name <sender@domain>` allowed)
    pub fn sender_signature(&mut self, sender: impl Into<String>) -> &mut Self {
        self.sender_signature = Some(sender.into());
        self
    }

    pub fn reply_to(&mut self, email: &str, name: Option<&str>) -> Result<&mut Self> {
        self.reply_to = Some(parse_address(email, name)?);
        Ok(self)
    }

    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a file; `filename` defaults to the path's last component.
    pub fn attach(&mut self, path: impl AsRef<Path>, filename: Option<&str>) -> &mut Self {
        let path = path.as_ref();
        self.attachments
            .insert(attachment_name(path, filename), path.to_path_buf());
        self
    }

    /// Attach an image referenced from the HTML body as `cid:<filename>`
    pub fn attach_inline_image(&mut self, path: impl AsRef<Path>, filename: Option<&str>) -> &mut Self {
        let path = path.as_ref();
        self.inline_images
            .insert(attachment_name(path, filename), path.to_path_buf());
        self
    }

    // ==================== Delivery options ====================

    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn message_stream(&mut self, stream: impl Into<String>) -> &mut Self {
        self.message_stream = Some(stream.into());
        self
    }

    /// Send one personalized message per `To` recipient
    pub fn send_batch(&mut self, batch: bool) -> &mut Self {
        self.batch = batch;
        self
    }

    pub fn track_opens(&mut self, track: bool) -> &mut Self {
        self.track_opens = Some(track);
        self
    }

    /// Accepts a bool shorthand or a `TrackLinks` value
    pub fn track_links(&mut self, track: impl Into<TrackLinks>) -> &mut Self {
        self.track_links = Some(track.into());
        self
    }

    pub fn metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_map<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    // ==================== Templates ====================

    /// Select a stored template; numeric strings select by id.
    pub fn template(&mut self, template: &str) -> Result<&mut Self> {
        let reference = TemplateRef::parse(template)?;
        Ok(self.template_ref(reference))
    }

    pub fn template_ref(&mut self, reference: impl Into<TemplateRef>) -> &mut Self {
        let inline_css = self.template.as_ref().map_or(true, |t| t.inline_css);
        self.template = Some(TemplateSpec {
            reference: reference.into(),
            inline_css,
        });
        self
    }

    pub fn inline_css(&mut self, inline_css: bool) -> &mut Self {
        if let Some(template) = self.template.as_mut() {
            template.inline_css = inline_css;
        }
        self
    }

    /// Merge template-wide variables
    pub fn template_variables(&mut self, variables: Variables) -> &mut Self {
        self.template_variables.extend(variables);
        self
    }

    pub fn clear_template(&mut self) -> &mut Self {
        self.template = None;
        self
    }

    // ==================== Accessors ====================

    pub fn template_spec(&self) -> Option<&TemplateSpec> {
        self.template.as_ref()
    }

    pub fn template_vars(&self) -> &Variables {
        &self.template_variables
    }

    pub fn subject_text(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn html(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text_body.as_deref()
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender_signature.as_deref()
    }

    pub fn reply_to_address(&self) -> Option<&Address> {
        self.reply_to.as_ref()
    }

    pub fn tag_value(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn track_opens_override(&self) -> Option<bool> {
        self.track_opens
    }

    pub fn track_links_override(&self) -> Option<TrackLinks> {
        self.track_links
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn attachments(&self) -> &IndexMap<String, PathBuf> {
        &self.attachments
    }

    pub fn inline_images(&self) -> &IndexMap<String, PathBuf> {
        &self.inline_images
    }

    pub fn metadata_entries(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    pub fn stream(&self) -> Option<&str> {
        self.message_stream.as_deref()
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }
}

fn attachment_name(path: &Path, filename: Option<&str>) -> String {
    match filename {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
    }
}
