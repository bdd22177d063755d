use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Provider response for one submitted payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendResponse {
    #[serde(default)]
    pub to: Option<String>,
    /// `None` when the timestamp is missing or carries no offset
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<FixedOffset>>,
    #[serde(rename = "MessageID", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
}

impl SendResponse {
    /// A response counts as accepted only when it carries a message id
    pub fn is_accepted(&self) -> bool {
        self.message_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok()))
}
