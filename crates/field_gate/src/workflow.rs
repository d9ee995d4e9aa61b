//! Headless driver for one form: edit, submit, confirm, persist, notify.
//!
//! `FormWorkflow` wires a `FormSession` and a `SubmissionGate` to the three
//! collaborators (store, confirmer, notifier). The terminal UI drives the gate
//! step by step instead, because it has to keep drawing while the request is in
//! flight; the CLI and the tests use this type.

use std::sync::Arc;

use tracing::{debug, info};

use crate::gate::{AttemptResult, GateError, SubmissionGate, SubmissionTarget, SubmitIntent};
use crate::notify::{Confirmer, Notification, Notifier};
use crate::persistence::PersistenceAdapter;
use crate::session::{FieldStatus, FormSession, InputDisposition, InputEvent, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The form was invalid; nothing was asked or sent.
    Rejected,
    /// The user answered "no" at the confirmation prompt.
    Declined,
    /// A submission was already in flight or done.
    Ignored,
    /// The record was stored; the session is closed.
    Succeeded { navigate_to: String },
    /// The store refused or could not be reached; the session is kept.
    Failed(String),
}

pub struct FormWorkflow<A, C, N> {
    session: Option<FormSession>,
    gate: SubmissionGate,
    adapter: Arc<A>,
    confirmer: C,
    notifier: N,
}

impl<A, C, N> FormWorkflow<A, C, N>
where
    A: PersistenceAdapter,
    C: Confirmer,
    N: Notifier,
{
    pub fn new(
        session: FormSession,
        target: SubmissionTarget,
        adapter: Arc<A>,
        confirmer: C,
        notifier: N,
    ) -> Self {
        Self {
            session: Some(session),
            gate: SubmissionGate::new(target),
            adapter,
            confirmer,
            notifier,
        }
    }

    /// The live session, or `None` once a submission succeeded.
    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn change(&mut self, id: &str, raw: &str) -> Result<FieldStatus, SessionError> {
        self.session
            .as_mut()
            .ok_or(SessionError::Closed)?
            .on_field_change(id, raw)
    }

    pub fn input(&mut self, id: &str, event: InputEvent) -> Result<InputDisposition, SessionError> {
        self.session
            .as_mut()
            .ok_or(SessionError::Closed)?
            .on_input(id, event)
    }

    /// Run the submit sequence once.
    pub async fn submit(&mut self) -> Result<WorkflowOutcome, GateError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(WorkflowOutcome::Ignored);
        };
        match self.gate.request_submit(session) {
            SubmitIntent::Rejected => return Ok(WorkflowOutcome::Rejected),
            SubmitIntent::Ignored => return Ok(WorkflowOutcome::Ignored),
            SubmitIntent::AwaitingConfirmation => {}
        }

        let definition = Arc::clone(session.definition());
        let copy = &definition.copy;
        if !self.confirmer.confirm(&copy.confirm).await {
            debug!(form = definition.slug, "confirmation declined");
            self.gate.decline()?;
            return Ok(WorkflowOutcome::Declined);
        }

        let ticket = self.gate.confirm(session)?;
        let result = ticket.dispatch(self.adapter.as_ref()).await;
        let attempt = self.gate.complete(result)?;

        match attempt.result {
            AttemptResult::Success => {
                info!(form = definition.slug, route = %copy.success_route, "record stored");
                self.notifier.notify(Notification::success(
                    copy.success_title.clone(),
                    copy.success_message.clone(),
                ));
                self.session = None;
                Ok(WorkflowOutcome::Succeeded {
                    navigate_to: copy.success_route.clone(),
                })
            }
            AttemptResult::Failure(reason) => {
                self.notifier.notify(Notification::error(
                    "Error",
                    format!("{} {reason}", copy.failure_fallback),
                ));
                Ok(WorkflowOutcome::Failed(reason))
            }
            AttemptResult::Pending => Ok(WorkflowOutcome::Ignored),
        }
    }
}
