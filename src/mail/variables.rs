//! Per-recipient and template-wide variables, and `{{name}}` substitution.
//!
//! Substitution is literal replacement only: no escaping, no nested lookups.

use indexmap::IndexMap;
use serde_json::Value;

use crate::mail::address_book::sanitize_email;
use crate::models::Variables;

pub const TO_EMAIL: &str = "toEmail";
pub const TO_NAME: &str = "toName";

/// Variables keyed by recipient email. Repeated sets merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientVariables {
    by_email: IndexMap<String, Variables>,
}

impl RecipientVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `variables` into the mapping for `email`.
    /// Returns false (and stores nothing) when `email` is not a valid address.
    pub fn merge(&mut self, email: &str, variables: Variables) -> bool {
        let Some(email) = sanitize_email(email) else {
            tracing::warn!(email = %email, "Ignoring recipient variables for invalid email");
            return false;
        };

        self.by_email.entry(email).or_default().extend(variables);
        true
    }

    /// Merge a whole email → variables mapping; returns how many keys were skipped.
    pub fn merge_all(&mut self, mapping: impl IntoIterator<Item = (String, Variables)>) -> usize {
        let mut skipped = 0;
        for (email, variables) in mapping {
            if !self.merge(&email, variables) {
                skipped += 1;
            }
        }
        skipped
    }

    pub fn get(&self, email: &str) -> Option<&Variables> {
        self.by_email.get(email)
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_email.clear();
    }
}

/// Variables for one recipient.
///
/// `toEmail`/`toName` default to the recipient's own email and display name
/// unless the recipient's variables set them. The result is layered over the
/// template-wide variables, so recipient keys win on collisions.
pub fn resolve_for(
    email: &str,
    template: &Variables,
    recipients: &RecipientVariables,
    display_name: &str,
) -> Variables {
    let mut own = recipients.get(email).cloned().unwrap_or_default();
    own.entry(TO_EMAIL.to_string())
        .or_insert_with(|| Value::String(email.to_string()));
    own.entry(TO_NAME.to_string())
        .or_insert_with(|| Value::String(display_name.to_string()));

    let mut resolved = template.clone();
    resolved.extend(own);
    resolved
}

/// Replace each `{{name}}` whose variable holds a scalar. Tokens for arrays,
/// objects or unknown names are left as they are.
pub fn substitute(text: &str, variables: &Variables) -> String {
    let mut out = text.to_string();
    for (name, value) in variables {
        if let Some(replacement) = scalar_string(value) {
            out = out.replace(&format!("{{{{{}}}}}", name), &replacement);
        }
    }
    out
}

/// String form of a scalar value; `None` for containers.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Display name carried by a resolved mapping, empty when it is not a string
pub fn resolved_name(variables: &Variables) -> String {
    variables
        .get(TO_NAME)
        .and_then(scalar_string)
        .unwrap_or_default()
}
