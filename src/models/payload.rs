use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};

/// Variable mapping used for substitution and as a template data model
pub type Variables = IndexMap<String, serde_json::Value>;

/// Link-click instrumentation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackLinks {
    #[default]
    None,
    HtmlAndText,
    HtmlOnly,
    TextOnly,
}

impl TrackLinks {
    pub const OPTIONS: [TrackLinks; 4] = [
        TrackLinks::None,
        TrackLinks::HtmlAndText,
        TrackLinks::HtmlOnly,
        TrackLinks::TextOnly,
    ];

    /// `true` tracks links in both bodies, `false` disables tracking
    pub fn from_bool(enabled: bool) -> Self {
        if enabled {
            TrackLinks::HtmlAndText
        } else {
            TrackLinks::None
        }
    }

    /// Unknown names are coerced to `None`.
    pub fn from_name(name: &str) -> Self {
        match Self::OPTIONS.iter().find(|option| option.as_str() == name) {
            Some(option) => *option,
            None => {
                tracing::warn!(value = %name, "Unknown TrackLinks value, tracking disabled");
                TrackLinks::None
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackLinks::None => "None",
            TrackLinks::HtmlAndText => "HtmlAndText",
            TrackLinks::HtmlOnly => "HtmlOnly",
            TrackLinks::TextOnly => "TextOnly",
        }
    }
}

impl From<bool> for TrackLinks {
    fn from(enabled: bool) -> Self {
        TrackLinks::from_bool(enabled)
    }
}

impl From<&str> for TrackLinks {
    fn from(name: &str) -> Self {
        TrackLinks::from_name(name)
    }
}

/// A stored remote template, addressed either by numeric id or by alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    ById(u64),
    ByAlias(String),
}

impl TemplateRef {
    /// Numeric input selects `ById`, anything else `ByAlias`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(MailError::InvalidTemplate(
                "template alias must not be empty".to_string(),
            ));
        }

        Ok(match value.parse::<u64>() {
            Ok(id) => TemplateRef::ById(id),
            Err(_) => TemplateRef::ByAlias(value.to_string()),
        })
    }
}

impl From<u64> for TemplateRef {
    fn from(id: u64) -> Self {
        TemplateRef::ById(id)
    }
}

/// Custom message header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Attachment as the API expects it: base64 content plus content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    pub name: String,
    pub content: String,
    pub content_type: String,
    #[serde(rename = "ContentID", skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

/// One provider-ready message record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payload {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub track_opens: bool,
    pub track_links: TrackLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_model: Option<Variables>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_css: Option<bool>,
}

impl Payload {
    /// Attach a template reference; the other identifier is always cleared.
    pub fn set_template(&mut self, template: &TemplateRef) {
        match template {
            TemplateRef::ById(id) => {
                self.template_id = Some(*id);
                self.template_alias = None;
            }
            TemplateRef::ByAlias(alias) => {
                self.template_id = None;
                self.template_alias = Some(alias.clone());
            }
        }
    }

    pub fn is_templated(&self) -> bool {
        self.template_id.is_some() || self.template_alias.is_some()
    }
}
