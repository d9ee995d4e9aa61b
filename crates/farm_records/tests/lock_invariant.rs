//! Drives every registered form through long edit sequences and checks the
//! lock invariant after each step.

use std::sync::Arc;

use chrono::NaiveDate;
use farm_records::registry;
use field_gate::prelude::*;

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()))
}

/// A few good and bad raw values for a field.
fn candidates(spec: &FieldSpec) -> Vec<String> {
    let mut values = vec![String::new()];
    match &spec.kind {
        FieldKind::Text => values.extend(["Weeding".into(), "Weeding 2".into()]),
        FieldKind::Choice { options } => {
            values.push(options[0].to_string());
            values.push("Mango".into());
        }
        FieldKind::Date => values.extend([
            "2024-10-10".into(),
            "2024-10-05".into(),
            "2025-02-01".into(),
            "10/10/2024".into(),
        ]),
        FieldKind::Time => values.extend(["09:00".into(), "08:30".into(), "10:00".into(), "9".into()]),
        FieldKind::Integer => values.extend(["0".into(), "5".into(), "40".into(), "41".into(), "50%".into()]),
    }
    values
}

fn assert_invariant(session: &FormSession, step: &str) {
    let form = session.definition();
    for f in form.fields() {
        let Some(dep) = f.depends_on else {
            assert!(!session.is_locked(f.id), "{step}: root field {} locked", f.id);
            continue;
        };
        let dep_ready = session.status(dep).is_some_and(FieldStatus::is_valid)
            && session.value(dep).is_some_and(|v| !v.trim().is_empty());
        assert_eq!(
            session.is_locked(f.id),
            !dep_ready,
            "{step}: field {} (depends on {dep})",
            f.id
        );
        if session.is_locked(f.id) {
            assert_eq!(session.status(f.id), Some(&FieldStatus::Pending), "{step}: {}", f.id);
        }
    }
    if session.is_form_valid() {
        assert!(session.first_blocking().is_none());
    }
}

#[test]
fn locks_follow_dependencies_in_every_form() {
    let registry = registry().unwrap();
    for form in registry.iter() {
        let mut session = FormSession::new(Arc::clone(form), clock());
        assert_invariant(&session, "initial");

        // Sweep forward several times, cycling through the candidates so that
        // fields get broken and repaired in many combinations.
        for round in 0..6 {
            for (i, f) in form.fields().iter().enumerate() {
                let values = candidates(f);
                let raw = &values[(round + i) % values.len()];
                let step = format!("{} round {round} {}={raw:?}", form.slug, f.id);
                match session.on_field_change(f.id, raw) {
                    Ok(_) => {}
                    Err(SessionError::Locked(id)) => assert!(session.is_locked(id), "{step}"),
                    Err(other) => panic!("{step}: {other}"),
                }
                assert_invariant(&session, &step);
            }
        }

        // Repairing every field front to back always ends in a valid form.
        for f in form.fields() {
            let repaired = candidates(f).iter().filter(|v| !v.is_empty()).any(|v| {
                session
                    .on_field_change(f.id, v)
                    .map(|status| status.is_valid())
                    .unwrap_or(false)
            });
            assert!(repaired, "{}: no valid candidate for {}", form.slug, f.id);
            assert_invariant(&session, &format!("{} repair {}", form.slug, f.id));
        }
        assert!(session.is_form_valid(), "{} not valid after repair", form.slug);
    }
}

#[test]
fn locked_values_survive_a_broken_dependency() {
    let registry = registry().unwrap();
    let form = registry.get("maintenance").unwrap();
    let mut session = FormSession::new(form, clock());
    session.on_field_change("dateOfMaintenance", "2024-10-01").unwrap();
    session.on_field_change("task", "Pruning").unwrap();
    session.on_field_change("managerInCharge", "Nimal Perera").unwrap();
    session.on_field_change("progress", "40%").unwrap();
    assert!(session.is_form_valid());

    session.on_field_change("task", "Pruning 2").unwrap();
    assert!(session.is_locked("managerInCharge"));
    assert!(session.is_locked("progress"));
    assert_eq!(session.value("progress"), Some("40%"));
    assert!(!session.is_form_valid());

    session.on_field_change("task", "Pruning").unwrap();
    assert!(session.is_form_valid());
    assert_eq!(
        session.payload().get("progress"),
        Some(&serde_json::json!(40))
    );
}
