//! Declarative form validation.
//!
//! Every form is described by a [`Schema`]: an ordered list of
//! `(field, constraint, message)` rules. Checking a draft reports the first
//! violated rule of each field, for all fields at once, so a form can show
//! every problem before anything is sent to the API.

mod forms;

use std::{fmt, ops::Deref};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use forms::{
    CategoryDraft, CategoryInput, LoginForm, PartDraft, PartInput, RegistrationForm,
    CATEGORY_SCHEMA, LOGIN_SCHEMA, PART_SCHEMA, REGISTRATION_SCHEMA,
};

/// Field key used for server messages that do not name a field.
pub const FORM_FIELD: &str = "_form";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// A single check applied to the raw text of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Non-empty once trimmed.
    Required,
    /// At least this many characters once trimmed.
    MinLength(usize),
    /// Parses as a finite number.
    Number,
    /// Numeric and not below zero.
    NonNegative,
    /// Numeric without a fractional part.
    Integer,
    /// Numeric and not above this value.
    AtMost(u32),
    /// Looks like `local@domain.tld`.
    Email,
    /// A choice was made from a selector (foreign key).
    Selection,
}

impl Constraint {
    /// Returns `true` when `value` satisfies the constraint.
    pub fn check(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Self::Required | Self::Selection => !value.is_empty(),
            Self::MinLength(min) => value.chars().count() >= *min,
            Self::Number => parse_number(value).is_some(),
            Self::NonNegative => parse_number(value).map_or(false, |n| n >= 0.0),
            Self::Integer => parse_number(value).map_or(false, |n| n.fract() == 0.0),
            Self::AtMost(max) => parse_number(value).map_or(false, |n| n <= f64::from(*max)),
            Self::Email => EMAIL_RE.is_match(value),
        }
    }
}

/// One ordered rule of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Wire name of the field, also used as the error key.
    pub field: &'static str,
    /// Constraint to apply.
    pub constraint: Constraint,
    /// Message surfaced when the constraint is violated.
    pub message: &'static str,
}

impl Rule {
    /// Build a rule.
    pub const fn new(field: &'static str, constraint: Constraint, message: &'static str) -> Self {
        Self {
            field,
            constraint,
            message,
        }
    }
}

/// Ordered list of rules describing one form.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    rules: &'static [Rule],
}

impl Schema {
    /// Wrap a static rule list.
    pub const fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    /// Run every rule against the draft, keeping the first failure per field.
    ///
    /// Fields the draft does not know are treated as empty.
    pub fn check(&self, draft: &impl FormDraft) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for rule in self.rules {
            if errors.contains(rule.field) {
                continue;
            }
            let value = draft.field(rule.field).unwrap_or_default();
            if !rule.constraint.check(value) {
                errors.insert(rule.field, rule.message);
            }
        }
        errors
    }
}

/// Editable form state addressed by wire field names.
pub trait FormDraft {
    /// Raw text of the named field.
    fn field(&self, name: &str) -> Option<&str>;

    /// Replace the raw text of the named field. Unknown names are ignored.
    fn set_field(&mut self, name: &str, value: String);
}

/// Turns a draft into checked, typed input.
pub trait Validate {
    /// Typed payload produced on success.
    type Output;

    /// Validate the whole draft.
    fn validate(&self) -> Result<Validated<Self::Output>, FieldErrors>;
}

/// Input that passed its schema. Only obtainable through [`Validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the checked value.
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Unwrap the checked value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// A message attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field key (wire name, or [`FORM_FIELD`]).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

/// Per-field errors in insertion order, at most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// Empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless the field already has one.
    ///
    /// Returns whether the message was stored.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) -> bool {
        let field = field.into();
        if self.contains(&field) {
            return false;
        }
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
        true
    }

    /// Remove and return the message recorded for `field`.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        let idx = self.errors.iter().position(|error| error.field == field)?;
        Some(self.errors.remove(idx).message)
    }

    /// Message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// Whether `field` has a message.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// Field keys with errors, in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|error| error.field.as_str())
    }

    /// All recorded errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.errors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Whole, non-negative number that fits a `u32`.
pub(crate) fn parse_count(value: &str) -> Option<u32> {
    parse_number(value)
        .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n as u32)
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints_check_trimmed_text() {
        assert!(!Constraint::Required.check("   "));
        assert!(Constraint::MinLength(2).check(" ab "));
        assert!(!Constraint::MinLength(2).check(" a "));
        assert!(Constraint::Number.check("12.50"));
        assert!(!Constraint::Number.check("twelve"));
        assert!(!Constraint::Number.check("inf"));
        assert!(!Constraint::NonNegative.check("-0.01"));
        assert!(Constraint::NonNegative.check("0"));
        assert!(Constraint::Integer.check("4"));
        assert!(!Constraint::Integer.check("4.5"));
        assert!(Constraint::AtMost(10).check("10"));
        assert!(!Constraint::AtMost(10).check("10.5"));
        assert!(Constraint::Email.check("a@b.com"));
        assert!(!Constraint::Email.check("a@b"));
        assert!(!Constraint::Email.check("a b@c.com"));
        assert!(!Constraint::Selection.check(""));
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        assert!(errors.insert("name", "required"));
        assert!(!errors.insert("name", "too short"));
        errors.insert("price", "negative");
        assert_eq!(errors.get("name"), Some("required"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.to_string(), "name: required; price: negative");
        assert_eq!(errors.remove("name").as_deref(), Some("required"));
        assert!(!errors.contains("name"));
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
