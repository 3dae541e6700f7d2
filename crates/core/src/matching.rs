//! Contact normalization and the shadow-record matching rule.
//!
//! A shadow record matches an account when its email equals the account's
//! email (case-insensitive) or, only when the account has a phone on file,
//! when its normalized phone equals the account's normalized phone. Phone
//! values are normalized on write so the database comparison is an exact
//! string match.

use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;
use validator::{ValidateEmail, ValidationError};

use crate::error::CoreError;

/// Trim and lowercase an email address. Returns `None` for blank input.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Reduce a phone number to its digits, keeping a leading `+`.
///
/// Spaces, dashes, dots and parentheses are dropped: `"+1 (555) 010-0200"`
/// becomes `"+15550100200"`. Returns `None` when no digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if trimmed.starts_with('+') {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}

/// Normalize an optional phone, treating blank input as absent.
pub fn normalize_optional_phone(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_phone)
}

/// Normalize an optional email, treating blank input as absent.
pub fn normalize_optional_email(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_email)
}

/// Field validator for contact emails on intake DTOs.
///
/// Checks the trimmed value, the same text [`normalize_email`] stores.
/// Blank input passes and is stored as no email.
pub fn validate_contact_email(raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("must be a valid email address".into()))
    }
}

/// Which contact field(s) tied a shadow record to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Email,
    Phone,
    EmailAndPhone,
}

/// Normalized lookup keys for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    email: String,
    phone: Option<String>,
}

impl MatchCriteria {
    /// Build criteria from an account's contact details.
    ///
    /// The email is mandatory; a blank or digit-free phone is treated as no
    /// phone, which disables phone matching entirely.
    pub fn new(email: &str, phone: Option<&str>) -> Result<Self, CoreError> {
        let email = normalize_email(email)
            .ok_or_else(|| CoreError::Validation("Email is required for matching".into()))?;
        Ok(Self {
            email,
            phone: normalize_optional_phone(phone),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Evaluate the matching rule against a record's stored contact fields.
    ///
    /// Stored values are normalized again before comparison so records
    /// written before normalization was enforced still compare correctly.
    pub fn match_on(&self, email: Option<&str>, phone: Option<&str>) -> Option<MatchedBy> {
        let email_hit = normalize_optional_email(email).is_some_and(|e| e == self.email);
        let phone_hit = match (&self.phone, normalize_optional_phone(phone)) {
            (Some(wanted), Some(stored)) => *wanted == stored,
            _ => false,
        };
        match (email_hit, phone_hit) {
            (true, true) => Some(MatchedBy::EmailAndPhone),
            (true, false) => Some(MatchedBy::Email),
            (false, true) => Some(MatchedBy::Phone),
            (false, false) => None,
        }
    }
}

/// Drop later items whose key was already seen, preserving order.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
