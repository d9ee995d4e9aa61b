//! Submission gate: the only path from a form to the remote store.
//!
//! ```text
//! Idle --submit--> ConfirmPending --confirm--> Submitting --ok--> Succeeded
//!   ^                    |                         |
//!   +------decline-------+                         +--err--> Failed --> Idle
//! ```
//!
//! The gate never performs I/O itself. `confirm` hands out a `SubmissionTicket`
//! carrying the payload; the caller dispatches it (inline or on a spawned task)
//! and reports the outcome through `complete`. At most one ticket is in flight.

use thiserror::Error;
use tracing::{info, warn};

use crate::Payload;
use crate::persistence::{PersistenceAdapter, PersistenceError};
use crate::session::FormSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Idle,
    ConfirmPending,
    Submitting,
    Succeeded,
    Failed(String),
}

/// What a confirmed submission does remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionTarget {
    Create,
    Update(String),
}

/// Outcome of a submit intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitIntent {
    /// The form is valid; a confirmation prompt should be shown.
    AwaitingConfirmation,
    /// The form is invalid; the gate stays idle.
    Rejected,
    /// A submission is in flight or already succeeded.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Pending,
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    pub confirmed: bool,
    pub result: AttemptResult,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("cannot {action} while the gate is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: GateState,
    },
    #[error("the form is no longer valid")]
    FormInvalid,
}

/// A confirmed submission, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    pub resource: &'static str,
    pub target: SubmissionTarget,
    pub payload: Payload,
}

impl SubmissionTicket {
    /// Perform the single adapter call for this ticket.
    pub async fn dispatch<A: PersistenceAdapter>(&self, adapter: &A) -> Result<(), PersistenceError> {
        match &self.target {
            SubmissionTarget::Create => adapter.create(self.resource, &self.payload).await,
            SubmissionTarget::Update(id) => adapter.update(self.resource, id, &self.payload).await,
        }
    }
}

#[derive(Debug)]
pub struct SubmissionGate {
    state: GateState,
    target: SubmissionTarget,
    attempt: Option<SubmissionAttempt>,
    last_failure: Option<String>,
    history: Vec<GateState>,
}

impl SubmissionGate {
    pub fn new(target: SubmissionTarget) -> Self {
        Self {
            state: GateState::Idle,
            target,
            attempt: None,
            last_failure: None,
            history: vec![GateState::Idle],
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn target(&self) -> &SubmissionTarget {
        &self.target
    }

    /// The attempt currently being confirmed or sent.
    pub fn attempt(&self) -> Option<&SubmissionAttempt> {
        self.attempt.as_ref()
    }

    /// Reason of the most recent failed submission, kept until the next success.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Every state the gate has been in, oldest first.
    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == GateState::Submitting
    }

    pub fn request_submit(&mut self, session: &FormSession) -> SubmitIntent {
        match self.state {
            GateState::Submitting | GateState::Succeeded => {
                info!(state = ?self.state, "submit intent ignored");
                SubmitIntent::Ignored
            }
            GateState::ConfirmPending => SubmitIntent::AwaitingConfirmation,
            GateState::Idle | GateState::Failed(_) => {
                if !session.is_form_valid() {
                    info!(form = session.definition().slug, "submit rejected: form invalid");
                    return SubmitIntent::Rejected;
                }
                self.attempt = Some(SubmissionAttempt {
                    confirmed: false,
                    result: AttemptResult::Pending,
                });
                self.transition(GateState::ConfirmPending);
                SubmitIntent::AwaitingConfirmation
            }
        }
    }

    /// The user declined the confirmation prompt.
    pub fn decline(&mut self) -> Result<(), GateError> {
        self.expect(GateState::ConfirmPending, "decline")?;
        self.attempt = None;
        self.transition(GateState::Idle);
        Ok(())
    }

    /// The user confirmed; returns the ticket to dispatch exactly once.
    pub fn confirm(&mut self, session: &FormSession) -> Result<SubmissionTicket, GateError> {
        self.expect(GateState::ConfirmPending, "confirm")?;
        if !session.is_form_valid() {
            self.attempt = None;
            self.transition(GateState::Idle);
            return Err(GateError::FormInvalid);
        }
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.confirmed = true;
        }
        self.transition(GateState::Submitting);
        Ok(SubmissionTicket {
            resource: session.definition().resource,
            target: self.target.clone(),
            payload: session.payload(),
        })
    }

    /// Report the outcome of the dispatched ticket.
    ///
    /// A failure passes through `Failed` and lands back on `Idle`, so the same
    /// session can be submitted again.
    pub fn complete(
        &mut self,
        result: Result<(), PersistenceError>,
    ) -> Result<SubmissionAttempt, GateError> {
        self.expect(GateState::Submitting, "complete")?;
        let mut attempt = self.attempt.take().unwrap_or(SubmissionAttempt {
            confirmed: true,
            result: AttemptResult::Pending,
        });
        match result {
            Ok(()) => {
                attempt.result = AttemptResult::Success;
                self.last_failure = None;
                self.transition(GateState::Succeeded);
            }
            Err(err) => {
                let reason = err.user_message();
                warn!(%err, "submission failed");
                attempt.result = AttemptResult::Failure(reason.clone());
                self.last_failure = Some(reason.clone());
                self.transition(GateState::Failed(reason));
                self.transition(GateState::Idle);
            }
        }
        Ok(attempt)
    }

    fn expect(&self, wanted: GateState, action: &'static str) -> Result<(), GateError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(GateError::InvalidTransition {
                action,
                state: self.state.clone(),
            })
        }
    }

    fn transition(&mut self, next: GateState) {
        info!(from = ?self.state, to = ?next, "submission gate");
        self.history.push(next.clone());
        self.state = next;
    }
}
