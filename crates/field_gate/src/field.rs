//! Field definitions for the form engine.
//!
//! This module defines the declarative pieces of a form:
//! - `FieldKind`: how a raw value is interpreted (text, choice, date, time, integer)
//! - `InputFilter`: which keystrokes the input boundary admits
//! - `FieldSpec`: id, position, dependency and validation rules of one field
//!
//! Everything here is data. Mutation lives in `session.rs`, rule evaluation in
//! `rules.rs`.
//!
//! Usage:
//! ```ignore
//! use field_gate::prelude::*;
//!
//! let workers = FieldSpec::new("numberOfWorkers", "Number of Workers", 5, FieldKind::Integer)
//!     .required("Number of workers is required!")
//!     .depends_on("fieldNumber")
//!     .range(1, 40, "Number of workers must be between 1 and 40!");
//! ```

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::registry::RegistryError;
use crate::rules::{DateBound, Relation, ValidationRule};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";

/// Interpretation of a field's raw (typed) value.
///
/// Notes:
/// - Date values are entered as `YYYY-MM-DD` and sent as ISO-8601 UTC timestamps
/// - Time values are entered and sent as `HH:mm`
/// - Integer values are sent as JSON numbers (an admitted unit suffix is stripped)
/// - Choice values must match one of the listed options exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Choice { options: Vec<&'static str> },
    Date,
    Time,
    Integer,
}

impl FieldKind {
    /// Convenience constructor for a choice field.
    pub fn choice(options: &[&'static str]) -> Self {
        FieldKind::Choice {
            options: options.to_vec(),
        }
    }

    /// Short placeholder shown next to an empty field.
    pub fn placeholder(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Choice { .. } => "select",
            FieldKind::Date => "YYYY-MM-DD",
            FieldKind::Time => "HH:mm",
            FieldKind::Integer => "number",
        }
    }
}

/// Keystroke filter applied at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    Any,
    Digits,
    /// Digits plus one trailing unit character (e.g. `%`).
    DigitsWithSuffix(char),
}

impl InputFilter {
    /// Whether a single typed character is admitted.
    pub fn admits(&self, c: char) -> bool {
        match self {
            InputFilter::Any => !c.is_control(),
            InputFilter::Digits => c.is_ascii_digit(),
            InputFilter::DigitsWithSuffix(suffix) => c.is_ascii_digit() || c == *suffix,
        }
    }

    pub fn suffix(&self) -> Option<char> {
        match self {
            InputFilter::DigitsWithSuffix(suffix) => Some(*suffix),
            _ => None,
        }
    }
}

/// Declarative description of one form field.
///
/// `order` is the field's position in the form and must be unique per form.
/// `depends_on` names the field that has to be filled and valid before this
/// one unlocks; it must have a smaller `order`.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub order: u32,
    pub kind: FieldKind,
    pub required: bool,
    pub required_message: String,
    pub rules: Vec<ValidationRule>,
    pub depends_on: Option<&'static str>,
    pub filter: InputFilter,
    pub paste_blocked: bool,
    pub help: Option<String>,
}

impl FieldSpec {
    /// Create a new optional field without rules or dependency.
    ///
    /// Integer fields default to a digits-only filter; integer, date and time
    /// fields reject paste.
    pub fn new(id: &'static str, label: &'static str, order: u32, kind: FieldKind) -> Self {
        let filter = match kind {
            FieldKind::Integer => InputFilter::Digits,
            _ => InputFilter::Any,
        };
        let paste_blocked = matches!(
            kind,
            FieldKind::Integer | FieldKind::Date | FieldKind::Time
        );
        Self {
            id,
            label,
            order,
            kind,
            required: false,
            required_message: "This field is required.".into(),
            rules: Vec::new(),
            depends_on: None,
            filter,
            paste_blocked,
            help: None,
        }
    }

    /// Mark the field as required with the message shown when it is empty.
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_message = message.into();
        self
    }

    /// Lock this field until `id` is filled and valid.
    pub fn depends_on(mut self, id: &'static str) -> Self {
        self.depends_on = Some(id);
        self
    }

    /// Append an arbitrary rule.
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a regex rule. Fails if the pattern does not compile.
    pub fn pattern(
        self,
        pattern: &str,
        message: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let rule = ValidationRule::pattern(pattern, message).map_err(|source| {
            RegistryError::InvalidPattern {
                field: self.id,
                source,
            }
        })?;
        Ok(self.rule(rule))
    }

    /// Append an inclusive integer range rule.
    pub fn range(self, min: i64, max: i64, message: impl Into<String>) -> Self {
        self.rule(ValidationRule::NumericRange {
            min,
            max,
            message: message.into(),
        })
    }

    /// This field's value must be strictly later / greater than `other`'s.
    pub fn after(self, other: &'static str, message: impl Into<String>) -> Self {
        self.cross(other, Relation::After, message)
    }

    /// This field's value must be strictly earlier / smaller than `other`'s.
    pub fn before(self, other: &'static str, message: impl Into<String>) -> Self {
        self.cross(other, Relation::Before, message)
    }

    /// This field's value must differ from `other`'s.
    pub fn not_same(self, other: &'static str, message: impl Into<String>) -> Self {
        self.cross(other, Relation::NotSame, message)
    }

    fn cross(self, other: &'static str, relation: Relation, message: impl Into<String>) -> Self {
        self.rule(ValidationRule::CrossField {
            other,
            relation,
            message: message.into(),
        })
    }

    /// Restrict a date field to a window relative to today.
    pub fn within(self, earliest: DateBound, latest: DateBound, message: impl Into<String>) -> Self {
        self.rule(ValidationRule::DateWindow {
            earliest,
            latest,
            message: message.into(),
        })
    }

    /// Override the keystroke filter.
    pub fn filter(mut self, filter: InputFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Reject pasted input for this field.
    pub fn block_paste(mut self) -> Self {
        self.paste_blocked = true;
        self
    }

    /// Attach help / hint text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Ids of other fields referenced by cross-field rules.
    pub fn cross_references(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().filter_map(|r| match r {
            ValidationRule::CrossField { other, .. } => Some(*other),
            _ => None,
        })
    }

    /// Strip an admitted unit suffix from an integer value.
    pub(crate) fn numeric_part<'a>(&self, raw: &'a str) -> &'a str {
        let raw = raw.trim();
        match self.filter.suffix() {
            Some(suffix) => raw.strip_suffix(suffix).unwrap_or(raw),
            None => raw,
        }
    }

    /// Convert a raw value into its payload representation.
    ///
    /// Returns `None` for values that do not parse according to the field kind.
    pub fn parse_value(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match &self.kind {
            FieldKind::Text | FieldKind::Choice { .. } => Some(Value::String(raw.to_string())),
            FieldKind::Date => parse_date(raw).map(|d| {
                Value::String(format!("{}T00:00:00.000Z", d.format(DATE_FORMAT)))
            }),
            FieldKind::Time => {
                parse_time(raw).map(|t| Value::String(t.format(TIME_FORMAT).to_string()))
            }
            FieldKind::Integer => parse_integer(self.numeric_part(raw)).map(Value::from),
        }
    }

    /// Convert a stored record value back into a raw editing value.
    pub fn raw_from_json(&self, value: &Value) -> Option<String> {
        match (&self.kind, value) {
            (_, Value::Null) => None,
            (FieldKind::Date, Value::String(s)) => {
                let day = s.get(..10).unwrap_or(s);
                parse_date(day).map(|d| d.format(DATE_FORMAT).to_string())
            }
            (FieldKind::Time, Value::String(s)) => {
                parse_time(s).map(|t| t.format(TIME_FORMAT).to_string())
            }
            (_, Value::String(s)) => Some(s.clone()),
            (_, Value::Number(n)) => Some(n.to_string()),
            (_, Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub(crate) fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

/// Digits only; no sign, no whitespace, no separators.
pub(crate) fn parse_integer(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
