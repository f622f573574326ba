use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Collects every failed check, keyed by field, instead of stopping at the
/// first one.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Validator {
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    pub fn add_field_error(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        let entry = self.field_errors.entry(field.to_string()).or_default();
        if !entry.contains(&message) {
            entry.push(message);
        }
    }

    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `Err(self)` when any check failed.
    pub fn finish(self) -> Result<(), Validator> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@b.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn accumulates_all_failures() {
        let mut v = Validator::new();
        v.check_field(false, "Password", "Password is too short");
        v.check_field(true, "Password", "Password is too long");
        v.check_field(false, "Password", "Password is too common");
        v.check_field(false, "Email", "Email is required");

        assert!(v.has_errors());
        assert_eq!(
            v.field("Password"),
            ["Password is too short", "Password is too common"]
        );
        assert_eq!(v.field("Email"), ["Email is required"]);
        assert!(v.finish().is_err());
    }

    #[test]
    fn duplicate_messages_collapse() {
        let mut v = Validator::new();
        v.add_field_error("Email", "Email is already in use");
        v.add_field_error("Email", "Email is already in use");
        assert_eq!(v.field("Email").len(), 1);
    }

    #[test]
    fn clean_validator_finishes_ok() {
        let mut v = Validator::new();
        v.check_field(true, "Email", "never");
        assert!(!v.has_errors());
        assert!(v.field("Email").is_empty());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn serializes_pascal_case() {
        let mut v = Validator::new();
        v.add_field_error("Email", "Email is required");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({ "FieldErrors": { "Email": ["Email is required"] } }));
    }
}
