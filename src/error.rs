#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid template reference: {0}")]
    InvalidTemplate(String),

    #[error("Message has no recipients")]
    NoRecipients,

    #[error("No sender signature configured")]
    NoSender,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Attachment lookup failed: {0}")]
    MimeLookup(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl MailError {
    /// True for failures that come from the remote API rather than the caller
    pub fn is_transport(&self) -> bool {
        matches!(self, MailError::Transport(_))
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        MailError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailError>;
