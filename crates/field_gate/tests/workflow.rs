use std::sync::Arc;

use chrono::NaiveDate;
use field_gate::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()))
}

fn shift_form() -> Arc<FormDefinition> {
    let copy = SubmissionCopy {
        confirm: ConfirmPrompt {
            title: "Confirm".into(),
            text: "Save this shift?".into(),
            confirm_label: "Yes".into(),
            cancel_label: "No".into(),
        },
        success_title: "Success".into(),
        success_message: "Shift saved!".into(),
        failure_fallback: "There was an error saving the shift.".into(),
        success_route: "/shifts".into(),
    };
    let form = FormDefinition::builder("shift", "Add Shift", "shifts")
        .copy(copy)
        .field(
            FieldSpec::new("day", "Day", 0, FieldKind::Date)
                .required("Please select a day!")
                .within(DateBound::Today, DateBound::EndOfYear, "Day must be in the rest of this year."),
        )
        .field(
            FieldSpec::new("start", "Start", 1, FieldKind::Time)
                .required("Please select the start time!")
                .depends_on("day"),
        )
        .field(
            FieldSpec::new("end", "End", 2, FieldKind::Time)
                .required("Please select the end time!")
                .depends_on("start")
                .after("start", "End time must be after the start time!"),
        )
        .field(
            FieldSpec::new("workers", "Workers", 3, FieldKind::Integer)
                .required("Number of workers is required!")
                .depends_on("end")
                .range(1, 40, "Number of workers must be between 1 and 40!"),
        )
        .build()
        .unwrap();
    Arc::new(form)
}

fn filled(workers: &str) -> FormSession {
    let mut session = FormSession::new(shift_form(), clock());
    session.on_field_change("day", "2024-10-11").unwrap();
    session.on_field_change("start", "09:00").unwrap();
    session.on_field_change("end", "17:00").unwrap();
    session.on_field_change("workers", workers).unwrap();
    session
}

#[tokio::test]
async fn successful_submit_creates_once_and_closes_the_session() {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(NotificationLog::new());
    let mut workflow = FormWorkflow::new(
        filled("5"),
        SubmissionTarget::Create,
        Arc::clone(&store),
        AutoConfirm(true),
        Arc::clone(&log),
    );

    let outcome = workflow.submit().await.unwrap();
    assert_eq!(
        outcome,
        WorkflowOutcome::Succeeded {
            navigate_to: "/shifts".into()
        }
    );
    assert!(workflow.session().is_none());

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    let StoreCall::Create { resource, payload } = &calls[0] else {
        panic!("expected a create call, got {calls:?}");
    };
    assert_eq!(resource, "shifts");
    assert_eq!(
        serde_json::Value::Object(payload.clone()),
        json!({
            "day": "2024-10-11T00:00:00.000Z",
            "start": "09:00",
            "end": "17:00",
            "workers": 5,
        })
    );
    assert_eq!(
        log.entries(),
        vec![Notification::success("Success", "Shift saved!")]
    );

    // the gate is done; nothing else is sent
    assert_eq!(workflow.submit().await.unwrap(), WorkflowOutcome::Ignored);
    assert_eq!(store.calls().len(), 1);
    assert_eq!(workflow.change("workers", "6"), Err(SessionError::Closed));
}

#[tokio::test]
async fn invalid_form_is_rejected_without_prompting() {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(NotificationLog::new());
    let mut workflow = FormWorkflow::new(
        filled("41"),
        SubmissionTarget::Create,
        Arc::clone(&store),
        AutoConfirm(true),
        Arc::clone(&log),
    );
    assert_eq!(workflow.submit().await.unwrap(), WorkflowOutcome::Rejected);
    assert_eq!(workflow.gate().state(), &GateState::Idle);
    assert!(store.calls().is_empty());
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn declining_leaves_everything_untouched() {
    let store = Arc::new(MemoryStore::new());
    let mut workflow = FormWorkflow::new(
        filled("5"),
        SubmissionTarget::Create,
        Arc::clone(&store),
        AutoConfirm(false),
        NotificationLog::new(),
    );
    assert_eq!(workflow.submit().await.unwrap(), WorkflowOutcome::Declined);
    assert_eq!(workflow.gate().state(), &GateState::Idle);
    assert!(store.calls().is_empty());
    let session = workflow.session().unwrap();
    assert_eq!(session.value("workers"), Some("5"));
    assert!(session.is_form_valid());
}

#[tokio::test]
async fn failure_keeps_values_and_allows_retry() {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(NotificationLog::new());
    store.fail_next(PersistenceError::Rejected {
        status: Some(400),
        message: "duplicate".into(),
    });
    let mut workflow = FormWorkflow::new(
        filled("5"),
        SubmissionTarget::Create,
        Arc::clone(&store),
        AutoConfirm(true),
        Arc::clone(&log),
    );

    let first = workflow.submit().await.unwrap();
    assert_eq!(first, WorkflowOutcome::Failed("duplicate".into()));
    assert_eq!(workflow.gate().state(), &GateState::Idle);
    assert_eq!(workflow.gate().last_failure(), Some("duplicate"));
    assert_eq!(
        log.last(),
        Some(Notification::error(
            "Error",
            "There was an error saving the shift. duplicate"
        ))
    );
    let session = workflow.session().unwrap();
    assert_eq!(session.value("start"), Some("09:00"));
    assert_eq!(session.value("workers"), Some("5"));

    let second = workflow.submit().await.unwrap();
    assert!(matches!(second, WorkflowOutcome::Succeeded { .. }));
    assert_eq!(store.calls().len(), 2);
    assert_eq!(store.records("shifts").len(), 1);
}

#[tokio::test]
async fn update_target_sends_put_for_the_record() {
    let store = Arc::new(MemoryStore::new());
    let id = store.seed(
        "shifts",
        json!({"day": "2024-10-11T00:00:00.000Z", "start": "08:00", "end": "12:00", "workers": 3})
            .as_object()
            .cloned()
            .unwrap(),
    );
    let record = store.records("shifts").remove(0);
    let mut session = FormSession::prefilled(shift_form(), clock(), &record);
    assert!(session.is_form_valid());
    session.on_field_change("workers", "7").unwrap();

    let mut workflow = FormWorkflow::new(
        session,
        SubmissionTarget::Update(id.clone()),
        Arc::clone(&store),
        AutoConfirm(true),
        NotificationLog::new(),
    );
    assert!(matches!(
        workflow.submit().await.unwrap(),
        WorkflowOutcome::Succeeded { .. }
    ));
    let stored = store.records("shifts").remove(0);
    assert_eq!(stored.get("workers"), Some(&json!(7)));
    assert_eq!(stored.get("_id"), Some(&json!(id)));
}
