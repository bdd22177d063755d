//! Content collaborators: MIME classification of attachment files and
//! plain-text rendering of HTML bodies.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Classifies attachment files
pub trait MimeLookup: Send + Sync {
    /// `None` when the file cannot be classified
    fn mime_type_of(&self, path: &Path) -> Option<String>;
}

/// Extension-based lookup backed by `mime_guess`'s table
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMime;

impl MimeLookup for GuessMime {
    fn mime_type_of(&self, path: &Path) -> Option<String> {
        mime_guess::from_path(path).first().map(|mime| mime.to_string())
    }
}

/// Derives a text body from an HTML one
pub trait HtmlToText: Send + Sync {
    fn to_plain_text(&self, html: &str) -> String;
}

static DROP_BLOCKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>").unwrap());
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|table|blockquote)\s*>").unwrap());
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Tag stripper that keeps block boundaries as line breaks
#[derive(Debug, Clone, Copy, Default)]
pub struct StripTags;

impl HtmlToText for StripTags {
    fn to_plain_text(&self, html: &str) -> String {
        let text = DROP_BLOCKS.replace_all(html, "");
        let text = LINE_BREAKS.replace_all(&text, "\n");
        let text = TAGS.replace_all(&text, "");
        let text = decode_entities(&text);

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        BLANK_RUNS
            .replace_all(&lines.join("\n"), "\n\n")
            .trim()
            .to_string()
    }
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
