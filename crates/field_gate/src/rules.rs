//! Validation rules and the pure evaluator.
//!
//! `evaluate` maps (field, raw value, snapshot of the other values) to a
//! `ValidationOutcome`. It never touches session state and never performs I/O,
//! so every rule can be tested headlessly.
//!
//! Evaluation order for a field:
//! 1. empty value: `Invalid(required message)` if required, else `Valid`
//! 2. kind check (date / time / integer format, choice membership)
//! 3. the field's rules in declaration order; the first failure wins
//!
//! Cross-field rules stay silent until both operands are present.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use regex::Regex;

use crate::field::{FieldKind, FieldSpec, parse_date, parse_integer, parse_time};
use crate::registry::FormDefinition;

/// Result of evaluating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(msg) => Some(msg),
        }
    }
}

/// Relation used by cross-field rules. `After` and `Before` are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    After,
    Before,
    NotSame,
}

/// One end of a date window, resolved against "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Unbounded,
    Today,
    /// `n` calendar days before today.
    DaysAgo(u32),
    EndOfYear,
    Fixed(NaiveDate),
}

impl DateBound {
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateBound::Unbounded => None,
            DateBound::Today => Some(today),
            DateBound::DaysAgo(n) => today.checked_sub_days(Days::new(u64::from(*n))),
            DateBound::EndOfYear => NaiveDate::from_ymd_opt(today.year(), 12, 31),
            DateBound::Fixed(d) => Some(*d),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Value must match the regular expression.
    Pattern { regex: Regex, message: String },
    /// Value must be a digit string with `min <= v <= max`.
    NumericRange { min: i64, max: i64, message: String },
    /// Value compared against another field's current value.
    CrossField {
        other: &'static str,
        relation: Relation,
        message: String,
    },
    /// Date must lie inside the (inclusive) window.
    DateWindow {
        earliest: DateBound,
        latest: DateBound,
        message: String,
    },
}

impl ValidationRule {
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(ValidationRule::Pattern {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    fn check(&self, spec: &FieldSpec, raw: &str, snapshot: &Snapshot<'_>) -> ValidationOutcome {
        match self {
            ValidationRule::Pattern { regex, message } => {
                if regex.is_match(raw) {
                    ValidationOutcome::Valid
                } else {
                    ValidationOutcome::Invalid(message.clone())
                }
            }
            ValidationRule::NumericRange { min, max, message } => {
                let digits = spec.numeric_part(raw);
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return ValidationOutcome::Invalid(not_numeric(spec));
                }
                // A digit string too long for i64 is out of range, not malformed.
                match parse_integer(digits) {
                    Some(v) if *min <= v && v <= *max => ValidationOutcome::Valid,
                    _ => ValidationOutcome::Invalid(message.clone()),
                }
            }
            ValidationRule::CrossField {
                other,
                relation,
                message,
            } => {
                let Some(other_raw) = snapshot.value(other) else {
                    return ValidationOutcome::Valid;
                };
                let Some(other_spec) = snapshot.definition.field(other) else {
                    return ValidationOutcome::Valid;
                };
                let (Some(mine), Some(theirs)) =
                    (Operand::parse(spec, raw), Operand::parse(other_spec, other_raw))
                else {
                    return ValidationOutcome::Valid;
                };
                let Some(ordering) = mine.compare(&theirs) else {
                    return ValidationOutcome::Valid;
                };
                let holds = match relation {
                    Relation::After => ordering == Ordering::Greater,
                    Relation::Before => ordering == Ordering::Less,
                    Relation::NotSame => ordering != Ordering::Equal,
                };
                if holds {
                    ValidationOutcome::Valid
                } else {
                    ValidationOutcome::Invalid(message.clone())
                }
            }
            ValidationRule::DateWindow {
                earliest,
                latest,
                message,
            } => {
                let Some(date) = parse_date(raw) else {
                    return ValidationOutcome::Invalid(message.clone());
                };
                let too_early = earliest
                    .resolve(snapshot.today)
                    .is_some_and(|bound| date < bound);
                let too_late = latest
                    .resolve(snapshot.today)
                    .is_some_and(|bound| date > bound);
                if too_early || too_late {
                    ValidationOutcome::Invalid(message.clone())
                } else {
                    ValidationOutcome::Valid
                }
            }
        }
    }
}

/// Read-only view of a session used while evaluating a single field.
pub struct Snapshot<'a> {
    pub definition: &'a FormDefinition,
    pub values: &'a HashMap<&'static str, String>,
    pub today: NaiveDate,
}

impl<'a> Snapshot<'a> {
    /// Current non-blank value of a field.
    pub fn value(&self, id: &str) -> Option<&'a str> {
        self.values
            .get(id)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Evaluate one field's raw value against its spec.
pub fn evaluate(spec: &FieldSpec, raw: &str, snapshot: &Snapshot<'_>) -> ValidationOutcome {
    if raw.trim().is_empty() {
        return if spec.required {
            ValidationOutcome::Invalid(spec.required_message.clone())
        } else {
            ValidationOutcome::Valid
        };
    }

    if let Some(message) = check_kind(spec, raw) {
        return ValidationOutcome::Invalid(message);
    }

    spec.rules
        .iter()
        .map(|rule| rule.check(spec, raw, snapshot))
        .find(|outcome| !outcome.is_valid())
        .unwrap_or(ValidationOutcome::Valid)
}

fn check_kind(spec: &FieldSpec, raw: &str) -> Option<String> {
    match &spec.kind {
        FieldKind::Text => None,
        FieldKind::Choice { options } => {
            if options.iter().any(|o| *o == raw.trim()) {
                None
            } else {
                Some(format!("Please select one of: {}.", options.join(", ")))
            }
        }
        FieldKind::Date => parse_date(raw)
            .is_none()
            .then(|| "Please enter a date as YYYY-MM-DD.".to_string()),
        FieldKind::Time => parse_time(raw)
            .is_none()
            .then(|| "Please enter a time as HH:mm.".to_string()),
        FieldKind::Integer => {
            let digits = spec.numeric_part(raw);
            (digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()))
                .then(|| not_numeric(spec))
        }
    }
}

fn not_numeric(spec: &FieldSpec) -> String {
    format!("{} must be numeric", spec.label)
}

enum Operand {
    Date(NaiveDate),
    Time(NaiveTime),
    Number(i64),
    Text(String),
}

impl Operand {
    fn parse(spec: &FieldSpec, raw: &str) -> Option<Self> {
        match spec.kind {
            FieldKind::Date => parse_date(raw).map(Operand::Date),
            FieldKind::Time => parse_time(raw).map(Operand::Time),
            FieldKind::Integer => parse_integer(spec.numeric_part(raw)).map(Operand::Number),
            FieldKind::Text | FieldKind::Choice { .. } => {
                Some(Operand::Text(raw.trim().to_string()))
            }
        }
    }

    fn compare(&self, other: &Operand) -> Option<Ordering> {
        match (self, other) {
            (Operand::Date(a), Operand::Date(b)) => Some(a.cmp(b)),
            (Operand::Time(a), Operand::Time(b)) => Some(a.cmp(b)),
            (Operand::Number(a), Operand::Number(b)) => Some(a.cmp(b)),
            (Operand::Text(a), Operand::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormDefinition;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()
    }

    fn shift_form() -> FormDefinition {
        FormDefinition::builder("shift", "Shift", "shifts")
            .field(
                FieldSpec::new("startTime", "Start Time", 0, FieldKind::Time)
                    .required("Please select the start time!"),
            )
            .field(
                FieldSpec::new("endTime", "End Time", 1, FieldKind::Time)
                    .required("Please select the end time!")
                    .depends_on("startTime")
                    .after("startTime", "End time must be after the start time!"),
            )
            .field(
                FieldSpec::new("workers", "Workers", 2, FieldKind::Integer)
                    .required("Number of workers is required!")
                    .depends_on("endTime")
                    .range(1, 40, "Number of workers must be between 1 and 40!"),
            )
            .build()
            .unwrap()
    }

    fn eval(def: &FormDefinition, id: &str, raw: &str, values: &[(&'static str, &str)]) -> ValidationOutcome {
        let values: HashMap<&'static str, String> =
            values.iter().map(|(k, v)| (*k, v.to_string())).collect();
        let snapshot = Snapshot {
            definition: def,
            values: &values,
            today: today(),
        };
        evaluate(def.field(id).unwrap(), raw, &snapshot)
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let def = shift_form();
        assert!(eval(&def, "workers", "1", &[]).is_valid());
        assert!(eval(&def, "workers", "40", &[]).is_valid());
        assert_eq!(
            eval(&def, "workers", "0", &[]),
            ValidationOutcome::Invalid("Number of workers must be between 1 and 40!".into())
        );
        assert!(!eval(&def, "workers", "41", &[]).is_valid());
    }

    #[test]
    fn range_rejects_non_integer_strings() {
        let def = shift_form();
        assert_eq!(
            eval(&def, "workers", "4.5", &[]),
            ValidationOutcome::Invalid("Workers must be numeric".into())
        );
        assert!(!eval(&def, "workers", "-3", &[]).is_valid());
        assert!(!eval(&def, "workers", "99999999999999999999999", &[]).is_valid());
    }

    #[test]
    fn after_is_strict() {
        let def = shift_form();
        let start = [("startTime", "09:00")];
        assert!(!eval(&def, "endTime", "08:59", &start).is_valid());
        assert!(!eval(&def, "endTime", "09:00", &start).is_valid());
        assert!(eval(&def, "endTime", "09:01", &start).is_valid());
    }

    #[test]
    fn cross_field_waits_for_both_operands() {
        let def = shift_form();
        // start missing: the relation does not fire
        assert!(eval(&def, "endTime", "08:00", &[]).is_valid());
        // end missing: only the required check applies
        assert_eq!(
            eval(&def, "endTime", "", &[("startTime", "09:00")]),
            ValidationOutcome::Invalid("Please select the end time!".into())
        );
    }

    #[test]
    fn optional_empty_field_is_valid() {
        let spec = FieldSpec::new("note", "Note", 0, FieldKind::Text)
            .pattern(r"^[a-zA-Z\s]*$", "Only alphabetic characters are allowed.")
            .unwrap();
        let def = FormDefinition::builder("n", "N", "n").field(spec).build().unwrap();
        assert!(eval(&def, "note", "", &[]).is_valid());
        assert!(eval(&def, "note", "Prune trees", &[]).is_valid());
        assert_eq!(
            eval(&def, "note", "Prune 3 trees", &[]),
            ValidationOutcome::Invalid("Only alphabetic characters are allowed.".into())
        );
    }

    #[test]
    fn date_window_resolves_against_today() {
        let spec = FieldSpec::new("harvestDate", "Harvest Date", 0, FieldKind::Date)
            .required("Please select the harvest date!")
            .within(DateBound::Today, DateBound::EndOfYear, "Pick a date between today and year end.");
        let def = FormDefinition::builder("h", "H", "h").field(spec).build().unwrap();
        assert!(eval(&def, "harvestDate", "2024-10-10", &[]).is_valid());
        assert!(eval(&def, "harvestDate", "2024-12-31", &[]).is_valid());
        assert!(!eval(&def, "harvestDate", "2024-10-09", &[]).is_valid());
        assert!(!eval(&def, "harvestDate", "2025-01-01", &[]).is_valid());
        assert_eq!(
            eval(&def, "harvestDate", "tomorrow", &[]),
            ValidationOutcome::Invalid("Please enter a date as YYYY-MM-DD.".into())
        );
    }

    #[test]
    fn days_ago_bound_counts_back_from_today() {
        let spec = FieldSpec::new("harvestdate", "Harvest Date", 0, FieldKind::Date)
            .within(DateBound::DaysAgo(7), DateBound::Today, "Pick a date from the past week.");
        let def = FormDefinition::builder("y", "Y", "y").field(spec).build().unwrap();
        assert!(eval(&def, "harvestdate", "2024-10-03", &[]).is_valid());
        assert!(!eval(&def, "harvestdate", "2024-10-02", &[]).is_valid());
        assert!(!eval(&def, "harvestdate", "2024-10-11", &[]).is_valid());
    }

    #[test]
    fn not_same_compares_trimmed_text() {
        let def = FormDefinition::builder("m", "M", "m")
            .field(FieldSpec::new("task", "Task", 0, FieldKind::Text).required("required"))
            .field(
                FieldSpec::new("manager", "Manager", 1, FieldKind::Text)
                    .required("required")
                    .depends_on("task")
                    .not_same("task", "Manager must differ from the task."),
            )
            .build()
            .unwrap();
        assert!(!eval(&def, "manager", " Weeding ", &[("task", "Weeding")]).is_valid());
        assert!(eval(&def, "manager", "Nimal", &[("task", "Weeding")]).is_valid());
    }

    #[test]
    fn choice_must_match_an_option() {
        let def = FormDefinition::builder("c", "C", "c")
            .field(
                FieldSpec::new("cropType", "Crop Type", 0, FieldKind::choice(&["Coconut", "Banana"]))
                    .required("Please select a crop type!"),
            )
            .build()
            .unwrap();
        assert!(eval(&def, "cropType", "Coconut", &[]).is_valid());
        assert_eq!(
            eval(&def, "cropType", "Mango", &[]),
            ValidationOutcome::Invalid("Please select one of: Coconut, Banana.".into())
        );
    }
}
