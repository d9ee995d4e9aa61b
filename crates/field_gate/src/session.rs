//! Per-screen editing state.
//!
//! A `FormSession` owns the raw values, the validity of every field and the set
//! of locked fields. It keeps one invariant at all times: a field with a
//! dependency is locked unless that dependency is `Valid` and non-empty.
//!
//! Locking never clears a value. When a dependency breaks, its dependents flip
//! back to locked and `Pending`; once it is repaired they are unlocked and
//! re-evaluated with the value they had before.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::Payload;
use crate::clock::Clock;
use crate::field::FieldSpec;
use crate::persistence::Record;
use crate::registry::FormDefinition;
use crate::rules::{Snapshot, ValidationOutcome, evaluate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    /// Locked, so not evaluated.
    Pending,
    Valid,
    Invalid(String),
}

impl FieldStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, FieldStatus::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FieldStatus::Invalid(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<ValidationOutcome> for FieldStatus {
    fn from(outcome: ValidationOutcome) -> Self {
        match outcome {
            ValidationOutcome::Valid => FieldStatus::Valid,
            ValidationOutcome::Invalid(msg) => FieldStatus::Invalid(msg),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` is locked")]
    Locked(&'static str),
    #[error("the form session was closed after a successful submission")]
    Closed,
}

/// Raw input event at the keyboard / clipboard boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(char),
    Paste(String),
    Backspace,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDisposition {
    Accepted(FieldStatus),
    Rejected,
}

pub struct FormSession {
    definition: Arc<FormDefinition>,
    clock: Arc<dyn Clock>,
    values: HashMap<&'static str, String>,
    status: HashMap<&'static str, FieldStatus>,
    locked: HashSet<&'static str>,
    touched: HashSet<&'static str>,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("form", &self.definition.slug)
            .field("values", &self.values)
            .field("status", &self.status)
            .field("locked", &self.locked)
            .finish()
    }
}

impl FormSession {
    /// Empty session: only fields without a dependency start unlocked.
    pub fn new(definition: Arc<FormDefinition>, clock: Arc<dyn Clock>) -> Self {
        let values = definition
            .fields()
            .iter()
            .map(|f| (f.id, String::new()))
            .collect();
        let mut session = Self {
            definition,
            clock,
            values,
            status: HashMap::new(),
            locked: HashSet::new(),
            touched: HashSet::new(),
        };
        session.refresh_all();
        session
    }

    /// Session pre-populated from an existing record (edit flows).
    ///
    /// Keys of the record that are not fields of the form are ignored.
    pub fn prefilled(
        definition: Arc<FormDefinition>,
        clock: Arc<dyn Clock>,
        record: &Record,
    ) -> Self {
        let values = definition
            .fields()
            .iter()
            .map(|f| {
                let raw = record
                    .get(f.id)
                    .and_then(|v| f.raw_from_json(v))
                    .unwrap_or_default();
                (f.id, raw)
            })
            .collect();
        let touched = definition.fields().iter().map(|f| f.id).collect();
        let mut session = Self {
            definition,
            clock,
            values,
            status: HashMap::new(),
            locked: HashSet::new(),
            touched,
        };
        session.refresh_all();
        session
    }

    pub fn definition(&self) -> &Arc<FormDefinition> {
        &self.definition
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    pub fn status(&self, id: &str) -> Option<&FieldStatus> {
        self.status.get(id)
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.locked.contains(id)
    }

    /// Whether the user (or a prefilled record) has provided a value yet.
    pub fn is_touched(&self, id: &str) -> bool {
        self.touched.contains(id)
    }

    /// True iff every field is `Valid` and none is locked.
    pub fn is_form_valid(&self) -> bool {
        self.locked.is_empty()
            && self
                .definition
                .fields()
                .iter()
                .all(|f| self.status.get(f.id).is_some_and(FieldStatus::is_valid))
    }

    /// First field, in form order, that keeps the form from being valid.
    pub fn first_blocking(&self) -> Option<&FieldSpec> {
        self.definition.fields().iter().find(|f| {
            self.locked.contains(f.id) || !self.status.get(f.id).is_some_and(FieldStatus::is_valid)
        })
    }

    /// Store a new raw value, re-evaluate it and cascade locks forward.
    pub fn on_field_change(&mut self, id: &str, raw: &str) -> Result<FieldStatus, SessionError> {
        let spec = self
            .definition
            .field(id)
            .ok_or_else(|| SessionError::UnknownField(id.to_string()))?;
        let id = spec.id;
        if self.locked.contains(id) {
            return Err(SessionError::Locked(id));
        }

        self.values.insert(id, raw.to_string());
        self.touched.insert(id);
        let outcome = self.evaluate_field(id);
        debug!(form = self.definition.slug, field = id, ?outcome, "field changed");
        self.status.insert(id, outcome.clone());

        self.cascade_from(id);
        // an earlier field cross-referencing this one may have relocked it
        Ok(self.status.get(id).cloned().unwrap_or(outcome))
    }

    /// Apply a keystroke or paste to a field's raw value.
    ///
    /// Input rejected by the field's filter leaves the session untouched.
    pub fn on_input(&mut self, id: &str, event: InputEvent) -> Result<InputDisposition, SessionError> {
        let spec = self
            .definition
            .field(id)
            .ok_or_else(|| SessionError::UnknownField(id.to_string()))?;
        if self.locked.contains(spec.id) {
            trace!(field = spec.id, "input on locked field ignored");
            return Ok(InputDisposition::Rejected);
        }

        let mut next = self.values.get(spec.id).cloned().unwrap_or_default();
        match event {
            InputEvent::Key(c) => {
                if !admits_key(spec, &next, c) {
                    trace!(field = spec.id, key = %c, "keystroke filtered");
                    return Ok(InputDisposition::Rejected);
                }
                next.push(c);
            }
            InputEvent::Paste(text) => {
                if spec.paste_blocked {
                    trace!(field = spec.id, "paste blocked");
                    return Ok(InputDisposition::Rejected);
                }
                let mut candidate = next.clone();
                for c in text.chars() {
                    if !admits_key(spec, &candidate, c) {
                        return Ok(InputDisposition::Rejected);
                    }
                    candidate.push(c);
                }
                next = candidate;
            }
            InputEvent::Backspace => {
                next.pop();
            }
            InputEvent::Clear => next.clear(),
        }

        let id = spec.id;
        self.on_field_change(id, &next).map(InputDisposition::Accepted)
    }

    /// Parsed payload of all non-empty fields.
    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        for f in self.definition.fields() {
            let raw = self.values.get(f.id).map(String::as_str).unwrap_or_default();
            if raw.trim().is_empty() {
                continue;
            }
            if let Some(value) = f.parse_value(raw) {
                payload.insert(f.id.to_string(), value);
            }
        }
        payload
    }

    fn evaluate_field(&self, id: &'static str) -> FieldStatus {
        let Some(spec) = self.definition.field(id) else {
            return FieldStatus::Pending;
        };
        let snapshot = Snapshot {
            definition: &self.definition,
            values: &self.values,
            today: self.clock.today(),
        };
        let raw = self.values.get(id).map(String::as_str).unwrap_or_default();
        evaluate(spec, raw, &snapshot).into()
    }

    fn dependency_satisfied(&self, dep: &str) -> bool {
        self.status.get(dep).is_some_and(FieldStatus::is_valid)
            && self.values.get(dep).is_some_and(|v| !v.trim().is_empty())
    }

    /// Recompute lock state and validity of every field, in form order.
    fn refresh_all(&mut self) {
        let definition = Arc::clone(&self.definition);
        for f in definition.fields() {
            let open = f.depends_on.map_or(true, |dep| self.dependency_satisfied(dep));
            if open {
                self.locked.remove(f.id);
                let status = self.evaluate_field(f.id);
                self.status.insert(f.id, status);
            } else {
                self.locked.insert(f.id);
                self.status.insert(f.id, FieldStatus::Pending);
            }
        }
    }

    /// Single forward pass; dependencies always precede their dependents, so
    /// one pass settles the whole chain. The changed field takes part too: a
    /// cross-field rule on an earlier field can point at it and fail.
    fn cascade_from(&mut self, changed: &'static str) {
        let definition = Arc::clone(&self.definition);
        for f in definition.fields() {
            let open = f.depends_on.map_or(true, |dep| self.dependency_satisfied(dep));
            let was_locked = self.locked.contains(f.id);
            if !open {
                if !was_locked {
                    debug!(form = definition.slug, field = f.id, "field locked");
                }
                self.locked.insert(f.id);
                self.status.insert(f.id, FieldStatus::Pending);
                continue;
            }

            if f.id == changed {
                continue;
            }
            let affected = was_locked
                || definition.chain_includes(f.id, changed)
                || f.cross_references().any(|other| other == changed);
            if affected {
                if was_locked {
                    debug!(form = definition.slug, field = f.id, "field unlocked");
                }
                self.locked.remove(f.id);
                let status = self.evaluate_field(f.id);
                self.status.insert(f.id, status);
            }
        }
    }
}

fn admits_key(spec: &FieldSpec, current: &str, c: char) -> bool {
    if !spec.filter.admits(c) {
        return false;
    }
    // Nothing may follow the unit suffix, and it needs a digit before it.
    match spec.filter.suffix() {
        Some(suffix) if current.ends_with(suffix) => false,
        Some(suffix) if c == suffix => !current.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::field::{FieldKind, InputFilter};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()))
    }

    fn chain() -> Arc<FormDefinition> {
        Arc::new(
            FormDefinition::builder("chain", "Chain", "chain")
                .field(FieldSpec::new("a", "A", 0, FieldKind::Text).required("a required"))
                .field(
                    FieldSpec::new("b", "B", 1, FieldKind::Integer)
                        .required("b required")
                        .depends_on("a")
                        .range(1, 10, "b out of range"),
                )
                .field(
                    FieldSpec::new("c", "C", 2, FieldKind::Integer)
                        .required("c required")
                        .depends_on("b")
                        .after("b", "c must exceed b"),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn new_session_locks_every_dependent() {
        let s = FormSession::new(chain(), clock());
        assert!(!s.is_locked("a"));
        assert!(s.is_locked("b"));
        assert!(s.is_locked("c"));
        assert_eq!(s.status("a"), Some(&FieldStatus::Invalid("a required".into())));
        assert_eq!(s.status("b"), Some(&FieldStatus::Pending));
        assert!(!s.is_touched("a"));
        assert!(!s.is_form_valid());
    }

    #[test]
    fn locked_field_rejects_changes() {
        let mut s = FormSession::new(chain(), clock());
        assert_eq!(s.on_field_change("b", "3"), Err(SessionError::Locked("b")));
        assert_eq!(
            s.on_field_change("zzz", "3"),
            Err(SessionError::UnknownField("zzz".into()))
        );
    }

    #[test]
    fn unlock_cascades_forward() {
        let mut s = FormSession::new(chain(), clock());
        s.on_field_change("a", "x").unwrap();
        assert!(!s.is_locked("b"));
        assert!(s.is_locked("c"));
        s.on_field_change("b", "3").unwrap();
        assert!(!s.is_locked("c"));
        assert_eq!(s.status("c"), Some(&FieldStatus::Invalid("c required".into())));
        s.on_field_change("c", "4").unwrap();
        assert!(s.is_form_valid());
    }

    #[test]
    fn relock_keeps_values_and_restores_them() {
        let mut s = FormSession::new(chain(), clock());
        s.on_field_change("a", "x").unwrap();
        s.on_field_change("b", "3").unwrap();
        s.on_field_change("c", "4").unwrap();

        // break the root of the chain
        s.on_field_change("a", "").unwrap();
        assert!(s.is_locked("b"));
        assert!(s.is_locked("c"));
        assert_eq!(s.value("c"), Some("4"));
        assert_eq!(s.status("c"), Some(&FieldStatus::Pending));
        assert!(!s.is_form_valid());

        // repair: dependents come back with their old values, re-validated
        s.on_field_change("a", "y").unwrap();
        assert!(!s.is_locked("c"));
        assert_eq!(s.status("c"), Some(&FieldStatus::Valid));
        assert!(s.is_form_valid());
    }

    #[test]
    fn changing_a_cross_reference_revalidates_the_dependent() {
        let mut s = FormSession::new(chain(), clock());
        s.on_field_change("a", "x").unwrap();
        s.on_field_change("b", "3").unwrap();
        s.on_field_change("c", "4").unwrap();
        s.on_field_change("b", "5").unwrap();
        assert_eq!(
            s.status("c"),
            Some(&FieldStatus::Invalid("c must exceed b".into()))
        );
        assert!(!s.is_form_valid());
    }

    fn window() -> Arc<FormDefinition> {
        Arc::new(
            FormDefinition::builder("window", "Window", "window")
                .field(
                    FieldSpec::new("start", "Start", 0, FieldKind::Time)
                        .required("start required")
                        .before("end", "Start must be before end"),
                )
                .field(
                    FieldSpec::new("end", "End", 1, FieldKind::Time)
                        .required("end required")
                        .depends_on("start"),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn later_field_breaking_an_earlier_rule_locks_itself() {
        let mut s = FormSession::new(window(), clock());
        s.on_field_change("start", "09:00").unwrap();
        assert!(!s.is_locked("end"));

        let status = s.on_field_change("end", "08:00").unwrap();
        assert_eq!(
            s.status("start"),
            Some(&FieldStatus::Invalid("Start must be before end".into()))
        );
        assert!(s.is_locked("end"));
        assert_eq!(status, FieldStatus::Pending);
        assert_eq!(s.value("end"), Some("08:00"));
        assert!(!s.is_form_valid());

        // moving the start back reopens the end with its kept value
        s.on_field_change("start", "07:30").unwrap();
        assert!(!s.is_locked("end"));
        assert_eq!(s.status("end"), Some(&FieldStatus::Valid));
        assert!(s.is_form_valid());
    }

    #[test]
    fn invalid_dependency_relocks() {
        let mut s = FormSession::new(chain(), clock());
        s.on_field_change("a", "x").unwrap();
        s.on_field_change("b", "3").unwrap();
        s.on_field_change("b", "30").unwrap();
        assert!(s.is_locked("c"));
    }

    #[test]
    fn input_filters_keystrokes_and_paste() {
        let mut s = FormSession::new(chain(), clock());
        s.on_input("a", InputEvent::Paste("ok".into())).unwrap();
        assert_eq!(s.value("a"), Some("ok"));

        assert_eq!(s.on_input("b", InputEvent::Key('1')).unwrap(), InputDisposition::Accepted(FieldStatus::Valid));
        assert_eq!(s.on_input("b", InputEvent::Key('x')).unwrap(), InputDisposition::Rejected);
        assert_eq!(s.on_input("b", InputEvent::Paste("2".into())).unwrap(), InputDisposition::Rejected);
        assert_eq!(s.value("b"), Some("1"));

        s.on_input("b", InputEvent::Backspace).unwrap();
        assert_eq!(s.value("b"), Some(""));
        assert_eq!(s.status("b"), Some(&FieldStatus::Invalid("b required".into())));
    }

    #[test]
    fn suffix_is_only_admitted_once_at_the_end() {
        let def = Arc::new(
            FormDefinition::builder("p", "P", "p")
                .field(
                    FieldSpec::new("progress", "Progress", 0, FieldKind::Integer)
                        .filter(InputFilter::DigitsWithSuffix('%'))
                        .range(0, 100, "Progress must be between 0% and 100%"),
                )
                .build()
                .unwrap(),
        );
        let mut s = FormSession::new(def, clock());
        assert_eq!(s.on_input("progress", InputEvent::Key('%')).unwrap(), InputDisposition::Rejected);
        for c in "50%".chars() {
            s.on_input("progress", InputEvent::Key(c)).unwrap();
        }
        assert_eq!(s.on_input("progress", InputEvent::Key('1')).unwrap(), InputDisposition::Rejected);
        assert_eq!(s.payload().get("progress"), Some(&json!(50)));
    }

    #[test]
    fn prefilled_session_evaluates_record_values() {
        let record = json!({"_id": "r1", "a": "x", "b": 3, "c": 2})
            .as_object()
            .cloned()
            .unwrap();
        let s = FormSession::prefilled(chain(), clock(), &record);
        assert_eq!(s.value("b"), Some("3"));
        assert!(!s.is_locked("c"));
        assert_eq!(s.status("c"), Some(&FieldStatus::Invalid("c must exceed b".into())));
        assert_eq!(s.first_blocking().map(|f| f.id), Some("c"));
    }

    #[test]
    fn payload_holds_parsed_values_only() {
        let mut s = FormSession::new(chain(), clock());
        s.on_field_change("a", "x").unwrap();
        s.on_field_change("b", "3").unwrap();
        s.on_field_change("c", "4").unwrap();
        let payload = s.payload();
        assert_eq!(payload.get("a"), Some(&json!("x")));
        assert_eq!(payload.get("b"), Some(&json!(3)));
        assert_eq!(payload.get("c"), Some(&json!(4)));
        assert!(!payload.contains_key("_id"));
    }
}
