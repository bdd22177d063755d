//! Recipient normalization
//!
//! Accepts the loosely shaped address input callers tend to have (a single
//! `Name <email>` string, a CSV string, a list, an email→name map) and keeps a
//! validated, insertion-ordered set per recipient class.

use indexmap::IndexMap;
use validator::ValidateEmail;

use crate::error::{MailError, Result};
use crate::models::{join_addresses, Address, RecipientClass};

/// Address input in any of the accepted shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    /// Empties the recipient class
    Clear,
    /// One address or a comma-separated list of addresses
    Text(String),
    List(Vec<String>),
    /// email → display name
    Named(Vec<(String, String)>),
}

impl From<&str> for AddressInput {
    fn from(value: &str) -> Self {
        AddressInput::Text(value.to_string())
    }
}

impl From<String> for AddressInput {
    fn from(value: String) -> Self {
        AddressInput::Text(value)
    }
}

impl From<&[&str]> for AddressInput {
    fn from(values: &[&str]) -> Self {
        AddressInput::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<Vec<&str>> for AddressInput {
    fn from(values: Vec<&str>) -> Self {
        AddressInput::from(values.as_slice())
    }
}

impl From<Vec<String>> for AddressInput {
    fn from(values: Vec<String>) -> Self {
        AddressInput::List(values)
    }
}

impl From<Vec<(&str, &str)>> for AddressInput {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        AddressInput::Named(
            pairs
                .into_iter()
                .map(|(email, name)| (email.to_string(), name.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<(String, String)>> for AddressInput {
    fn from(pairs: Vec<(String, String)>) -> Self {
        AddressInput::Named(pairs)
    }
}

impl From<IndexMap<String, String>> for AddressInput {
    fn from(map: IndexMap<String, String>) -> Self {
        AddressInput::Named(map.into_iter().collect())
    }
}

/// `None` clears the class.
impl<T: Into<AddressInput>> From<Option<T>> for AddressInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AddressInput::Clear)
    }
}

/// Recipients per class, keyed by email. Re-adding an email replaces its
/// display name but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    to: IndexMap<String, Address>,
    cc: IndexMap<String, Address>,
    bcc: IndexMap<String, Address>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `input` into `class`.
    ///
    /// Every valid entry is stored even when some entries are rejected; the
    /// rejected ones are reported together as `MailError::InvalidAddress`, so
    /// the caller decides whether that aborts its configuration step.
    /// Returns the number of entries stored.
    pub fn set(
        &mut self,
        class: RecipientClass,
        input: impl Into<AddressInput>,
        default_name: Option<&str>,
    ) -> Result<usize> {
        let entries: Vec<(String, Option<String>)> = match input.into() {
            AddressInput::Clear => {
                self.clear(class);
                return Ok(0);
            }
            AddressInput::Text(text) => text.split(',').map(|e| (e.to_string(), None)).collect(),
            AddressInput::List(list) => list.into_iter().map(|e| (e, None)).collect(),
            AddressInput::Named(pairs) => pairs
                .into_iter()
                .map(|(email, name)| (email, Some(name)))
                .collect(),
        };

        let mut rejected = Vec::new();
        let mut stored = 0;
        for (entry, name) in entries {
            if entry.trim().is_empty() {
                continue;
            }

            let parsed = match name {
                Some(name) => named_address(&entry, &name, default_name),
                None => parse_address(&entry, default_name),
            };

            match parsed {
                Ok(address) => {
                    self.class_mut(class)
                        .insert(address.email().to_string(), address);
                    stored += 1;
                }
                Err(_) => rejected.push(entry.trim().to_string()),
            }
        }

        if rejected.is_empty() {
            Ok(stored)
        } else {
            Err(MailError::InvalidAddress(rejected.join(", ")))
        }
    }

    pub fn clear(&mut self, class: RecipientClass) {
        self.class_mut(class).clear();
    }

    pub fn clear_all(&mut self) {
        for class in RecipientClass::ALL {
            self.clear(class);
        }
    }

    pub fn get(&self, class: RecipientClass) -> &IndexMap<String, Address> {
        match class {
            RecipientClass::To => &self.to,
            RecipientClass::Cc => &self.cc,
            RecipientClass::Bcc => &self.bcc,
        }
    }

    /// Addresses of a class in insertion order
    pub fn addresses(&self, class: RecipientClass) -> impl Iterator<Item = &Address> + '_ {
        self.get(class).values()
    }

    pub fn len(&self, class: RecipientClass) -> usize {
        self.get(class).len()
    }

    pub fn is_empty(&self, class: RecipientClass) -> bool {
        self.get(class).is_empty()
    }

    /// Comma-joined header value, `None` for an empty class
    pub fn joined(&self, class: RecipientClass) -> Option<String> {
        if self.is_empty(class) {
            None
        } else {
            Some(join_addresses(self.addresses(class)))
        }
    }

    fn class_mut(&mut self, class: RecipientClass) -> &mut IndexMap<String, Address> {
        match class {
            RecipientClass::To => &mut self.to,
            RecipientClass::Cc => &mut self.cc,
            RecipientClass::Bcc => &mut self.bcc,
        }
    }
}

/// Parse `email`, `<email>` or `Name <email>`.
pub fn parse_address(entry: &str, default_name: Option<&str>) -> Result<Address> {
    let entry = entry.trim();
    let (email, name) = match (entry.rfind('<'), entry.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            (&entry[open + 1..close], entry[..open].trim())
        }
        _ => (entry, ""),
    };

    named_address(email, name, default_name)
}

fn named_address(email: &str, name: &str, default_name: Option<&str>) -> Result<Address> {
    let email = sanitize_email(email)
        .ok_or_else(|| MailError::InvalidAddress(email.trim().to_string()))?;

    let mut name = sanitize_name(name);
    if name.is_empty() {
        name = default_name.map(sanitize_name).unwrap_or_default();
    }

    Ok(Address::new(email, name))
}

/// Trimmed email when it is syntactically valid
pub fn sanitize_email(email: &str) -> Option<String> {
    let email = email.trim().to_string();
    if !email.is_empty() && email.validate_email() {
        Some(email)
    } else {
        None
    }
}

/// Strip anything that could break out of a header line, plus wrapping quotes.
pub fn sanitize_name(name: &str) -> String {
    let cleaned = name
        .replace("%0A", "")
        .replace("%0a", "")
        .replace("%0D", "")
        .replace("%0d", "");

    let cleaned: String = cleaned.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emails(book: &AddressBook, class: RecipientClass) -> Vec<&str> {
        book.get(class).keys().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_name_and_email() {
        let address = parse_address("  Ann Smith <ann@example.com> ", None).unwrap();
        assert_eq!(address.email(), "ann@example.com");
        assert_eq!(address.name(), "Ann Smith");

        let quoted = parse_address("\"Bob\" <bob@example.com>", None).unwrap();
        assert_eq!(quoted.name(), "Bob");
    }

    #[test]
    fn test_parse_bare_email_uses_default_name() {
        let address = parse_address("ann@example.com", Some("Ann")).unwrap();
        assert_eq!(address.email(), "ann@example.com");
        assert_eq!(address.name(), "Ann");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            parse_address("not an email", None),
            Err(MailError::InvalidAddress(_))
        ));
        assert!(parse_address("Ann <>", None).is_err());
    }

    #[test]
    fn test_csv_input_keeps_order() {
        let mut book = AddressBook::new();
        let stored = book
            .set(
                RecipientClass::To,
                "c@example.com, Ann <a@example.com>,b@example.com",
                None,
            )
            .unwrap();

        assert_eq!(stored, 3);
        assert_eq!(
            emails(&book, RecipientClass::To),
            vec!["c@example.com", "a@example.com", "b@example.com"]
        );
        assert_eq!(
            book.joined(RecipientClass::To).unwrap(),
            "c@example.com,Ann <a@example.com>,b@example.com"
        );
    }

    #[test]
    fn test_named_map_input() {
        let mut book = AddressBook::new();
        book.set(
            RecipientClass::Cc,
            vec![("a@example.com", "Ann"), ("b@example.com", "")],
            None,
        )
        .unwrap();

        let cc = book.get(RecipientClass::Cc);
        assert_eq!(cc["a@example.com"].name(), "Ann");
        assert_eq!(cc["b@example.com"].name(), "");
    }

    #[test]
    fn test_reinsert_overwrites_name_in_place() {
        let mut book = AddressBook::new();
        book.set(RecipientClass::To, vec!["a@example.com", "b@example.com"], None)
            .unwrap();
        book.set(RecipientClass::To, "Alice <a@example.com>", None)
            .unwrap();

        assert_eq!(
            emails(&book, RecipientClass::To),
            vec!["a@example.com", "b@example.com"]
        );
        assert_eq!(book.get(RecipientClass::To)["a@example.com"].name(), "Alice");
    }

    #[test]
    fn test_invalid_entry_rejected_others_kept() {
        let mut book = AddressBook::new();
        let result = book.set(
            RecipientClass::Bcc,
            vec!["good@example.com", "broken@", "other@example.com"],
            None,
        );

        match result {
            Err(MailError::InvalidAddress(rejected)) => assert_eq!(rejected, "broken@"),
            other => panic!("expected InvalidAddress, got {:?}", other),
        }
        assert_eq!(book.len(RecipientClass::Bcc), 2);
    }

    #[test]
    fn test_clear_sentinel_empties_class_only() {
        let mut book = AddressBook::new();
        book.set(RecipientClass::To, "a@example.com", None).unwrap();
        book.set(RecipientClass::Cc, "c@example.com", None).unwrap();

        book.set(RecipientClass::To, None::<&str>, None).unwrap();

        assert!(book.is_empty(RecipientClass::To));
        assert_eq!(book.joined(RecipientClass::To), None);
        assert_eq!(book.len(RecipientClass::Cc), 1);
    }

    #[test]
    fn test_empty_string_is_noop() {
        let mut book = AddressBook::new();
        book.set(RecipientClass::To, "a@example.com", None).unwrap();
        assert_eq!(book.set(RecipientClass::To, "", None).unwrap(), 0);
        assert_eq!(book.len(RecipientClass::To), 1);
    }

    #[test]
    fn test_header_breaking_name_is_sanitized() {
        let mut book = AddressBook::new();
        book.set(
            RecipientClass::To,
            vec![("a@example.com", "Ann\r\nBcc: evil@example.com")],
            None,
        )
        .unwrap();

        let name = book.get(RecipientClass::To)["a@example.com"].name().to_string();
        assert!(!name.contains('\n'));
        assert!(!name.contains('\r'));
        assert_eq!(sanitize_name("Ann%0ABcc"), "AnnBcc");
    }
}
