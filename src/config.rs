use std::env;

use crate::models::TrackLinks;

pub const DEFAULT_API_URL: &str = "https://api.postmarkapp.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Missing tokens are only reported when the transport is first used
    pub server_token: Option<String>,
    pub sender_signature: Option<String>,
    pub track_opens: bool,
    pub track_links: TrackLinks,
    pub api_url: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_token: None,
            sender_signature: None,
            track_opens: true,
            track_links: TrackLinks::HtmlAndText,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_token: env::var("POSTMARK_SERVER_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            sender_signature: env::var("POSTMARK_SENDER_SIGNATURE")
                .ok()
                .filter(|sender| !sender.trim().is_empty()),
            track_opens: parse_track_opens(non_empty_var("POSTMARK_TRACK_OPENS"))?,
            track_links: non_empty_var("POSTMARK_TRACK_LINKS")
                .map(|value| parse_track_links(&value))
                .unwrap_or(TrackLinks::HtmlAndText),
            api_url: env::var("POSTMARK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout_seconds: env::var("POSTMARK_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout)?,
        })
    }
}

/// Set-but-blank variables count as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_track_opens(value: Option<String>) -> Result<bool, ConfigError> {
    match value {
        Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidTrackOpens(value)),
        None => Ok(true),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Boolean shorthand first, then the enum names.
fn parse_track_links(value: &str) -> TrackLinks {
    match parse_flag(value) {
        Some(enabled) => TrackLinks::from_bool(enabled),
        None => TrackLinks::from_name(value.trim()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("POSTMARK_TRACK_OPENS must be a boolean, got {0:?}")]
    InvalidTrackOpens(String),
    #[error("Invalid POSTMARK_TIMEOUT_SECONDS")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("HtmlOnly"), None);
    }

    #[test]
    fn test_track_opens_defaults_when_unset_or_blank() {
        assert!(parse_track_opens(None).unwrap());
        assert_eq!(parse_flag(""), None);
        assert!(!parse_track_opens(Some("off".to_string())).unwrap());
        assert!(matches!(
            parse_track_opens(Some("maybe".to_string())),
            Err(ConfigError::InvalidTrackOpens(_))
        ));
    }

    #[test]
    fn test_blank_variable_is_unset() {
        std::env::set_var("POSTMARK_COURIER_TEST_BLANK", "  ");
        assert_eq!(non_empty_var("POSTMARK_COURIER_TEST_BLANK"), None);
        assert!(parse_track_opens(non_empty_var("POSTMARK_COURIER_TEST_BLANK")).unwrap());
    }

    #[test]
    fn test_parse_track_links() {
        assert_eq!(parse_track_links("1"), TrackLinks::HtmlAndText);
        assert_eq!(parse_track_links("0"), TrackLinks::None);
        assert_eq!(parse_track_links("TextOnly"), TrackLinks::TextOnly);
        assert_eq!(parse_track_links("sometimes"), TrackLinks::None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.server_token.is_none());
        assert!(config.track_opens);
        assert_eq!(config.track_links, TrackLinks::HtmlAndText);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
