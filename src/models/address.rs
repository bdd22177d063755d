use std::fmt;

use serde::{Deserialize, Serialize};

/// Which header a recipient is addressed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientClass {
    To,
    Cc,
    Bcc,
}

impl RecipientClass {
    pub const ALL: [RecipientClass; 3] = [RecipientClass::To, RecipientClass::Cc, RecipientClass::Bcc];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientClass::To => "to",
            RecipientClass::Cc => "cc",
            RecipientClass::Bcc => "bcc",
        }
    }
}

/// A validated recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    email: String,
    name: String,
}

impl Address {
    /// Callers are expected to have validated `email` already; see `AddressBook`.
    pub(crate) fn new(email: String, name: String) -> Self {
        Self { email, name }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Display name, empty when none was given
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// `Name <email>` when a display name is present, the bare email otherwise
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_mailbox(f, &self.email, &self.name)
    }
}

/// Names containing list separators are quoted so a joined field still
/// splits into the right mailboxes.
pub(crate) fn format_mailbox(f: &mut impl fmt::Write, email: &str, name: &str) -> fmt::Result {
    if name.is_empty() {
        write!(f, "{}", email)
    } else if name.contains([',', ';']) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "\"{}\" <{}>", escaped, email)
    } else {
        write!(f, "{} <{}>", name, email)
    }
}

/// Render a mailbox into an owned string
pub fn mailbox(email: &str, name: &str) -> String {
    let mut out = String::with_capacity(email.len() + name.len() + 3);
    // Writing into a String cannot fail.
    let _ = format_mailbox(&mut out, email, name);
    out
}

/// Comma-join addresses the way the provider expects a multi-recipient field
pub fn join_addresses<'a>(addresses: impl IntoIterator<Item = &'a Address>) -> String {
    addresses
        .into_iter()
        .map(|address| address.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
