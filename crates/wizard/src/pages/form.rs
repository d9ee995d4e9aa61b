use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use farm_records::RecordStore;
use field_gate::prelude::*;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::{MENU, Page};
use crate::{
    action::{Action, PopupResult},
    components::{
        Component,
        form::{FormView, cycle_choice, render_form},
        popups::{ConfirmPopup, render_backdrop},
    },
    tui::{Event, Frame},
};

/// Entry screen for one form.
///
/// Owns the `FormSession` and the `SubmissionGate`. A confirmed submission is
/// dispatched on a background task and reported back as
/// `Action::SubmissionFinished`, so the screen keeps drawing while the request
/// is in flight.
pub struct FormPage {
    id: String,
    definition: Arc<FormDefinition>,
    clock: Arc<dyn Clock>,
    store: Arc<RecordStore>,
    target: SubmissionTarget,
    prefill: Option<Record>,
    session: Option<FormSession>,
    gate: SubmissionGate,
    view: FormView,
    popup: Option<ConfirmPopup>,
    action_tx: Option<UnboundedSender<Action>>,
}

impl FormPage {
    /// Page creating new records.
    pub fn new(
        id: impl Into<String>,
        definition: Arc<FormDefinition>,
        clock: Arc<dyn Clock>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            id: id.into(),
            definition,
            clock,
            store,
            target: SubmissionTarget::Create,
            prefill: None,
            session: None,
            gate: SubmissionGate::new(SubmissionTarget::Create),
            view: FormView::new(),
            popup: None,
            action_tx: None,
        }
    }

    /// Page updating the existing record `record_id`, prefilled from `record`.
    pub fn editing(
        id: impl Into<String>,
        definition: Arc<FormDefinition>,
        clock: Arc<dyn Clock>,
        store: Arc<RecordStore>,
        record_id: impl Into<String>,
        record: Record,
    ) -> Self {
        let target = SubmissionTarget::Update(record_id.into());
        Self {
            target: target.clone(),
            prefill: Some(record),
            gate: SubmissionGate::new(target),
            ..Self::new(id, definition, clock, store)
        }
    }

    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn has_popup(&self) -> bool {
        self.popup.is_some()
    }

    /// Start over with a fresh session if the last one was closed.
    fn open_session(&mut self) {
        let needs_session =
            self.session.is_none() || matches!(self.gate.state(), GateState::Succeeded);
        if !needs_session {
            return;
        }
        let session = match &self.prefill {
            Some(record) => {
                FormSession::prefilled(Arc::clone(&self.definition), Arc::clone(&self.clock), record)
            }
            None => FormSession::new(Arc::clone(&self.definition), Arc::clone(&self.clock)),
        };
        debug!(form = self.definition.slug, "form session opened");
        self.session = Some(session);
        self.gate = SubmissionGate::new(self.target.clone());
        self.view.reset();
        self.popup = None;
    }

    fn send(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            if let Err(err) = tx.send(action) {
                warn!("action channel closed: {err}");
            }
        }
    }

    fn focused_field(&self) -> Option<&FieldSpec> {
        self.definition.fields().get(self.view.focused())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let count = self.definition.field_count();
        match key.code {
            KeyCode::Esc => return Some(Action::Navigate(MENU.into())),
            KeyCode::Enter => return Some(Action::Submit),
            KeyCode::Up | KeyCode::BackTab => {
                self.view.focus_prev(count);
                self.view.clear_notice();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.view.focus_next(count);
                self.view.clear_notice();
            }
            KeyCode::Left => self.cycle_focused(false),
            KeyCode::Right => self.cycle_focused(true),
            KeyCode::Backspace => self.input(InputEvent::Backspace),
            KeyCode::Delete => self.input(InputEvent::Clear),
            KeyCode::Char(' ') if self.focused_is_choice() => self.cycle_focused(true),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if !self.focused_is_choice() {
                    self.input(InputEvent::Key(c));
                }
            }
            _ => {}
        }
        None
    }

    fn focused_is_choice(&self) -> bool {
        self.focused_field()
            .is_some_and(|f| matches!(f.kind, FieldKind::Choice { .. }))
    }

    fn cycle_focused(&mut self, forward: bool) {
        let definition = Arc::clone(&self.definition);
        let Some(field) = definition.fields().get(self.view.focused()) else {
            return;
        };
        let FieldKind::Choice { options } = &field.kind else {
            return;
        };
        let id = field.id;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let current = session.value(id).unwrap_or_default();
        let Some(next) = cycle_choice(options, current, forward) else {
            return;
        };
        match session.on_field_change(id, next) {
            Ok(_) => self.view.clear_notice(),
            Err(SessionError::Locked(_)) => self.notice_locked(id),
            Err(err) => warn!(%err, "choice change failed"),
        }
    }

    fn input(&mut self, event: InputEvent) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let (id, paste_blocked) = (field.id, field.paste_blocked);
        let is_paste = matches!(event, InputEvent::Paste(_));
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let locked = session.is_locked(id);
        match session.on_input(id, event) {
            Ok(InputDisposition::Accepted(_)) => self.view.clear_notice(),
            Ok(InputDisposition::Rejected) if locked => self.notice_locked(id),
            Ok(InputDisposition::Rejected) if is_paste && paste_blocked => {
                self.view.set_notice("Pasting is disabled for this field")
            }
            Ok(InputDisposition::Rejected) => self.view.set_notice("That character is not allowed here"),
            Err(err) => warn!(%err, "input failed"),
        }
    }

    fn notice_locked(&mut self, id: &str) {
        let dep = self
            .definition
            .field(id)
            .and_then(|f| f.depends_on)
            .and_then(|d| self.definition.field(d))
            .map(|d| d.label)
            .unwrap_or_default();
        self.view
            .set_notice(format!("Locked until \"{dep}\" is filled in correctly"));
    }

    fn submit(&mut self) -> Option<Action> {
        let session = self.session.as_ref()?;
        match self.gate.request_submit(session) {
            SubmitIntent::AwaitingConfirmation => {
                self.popup = Some(ConfirmPopup::from_prompt(&self.definition.copy.confirm));
            }
            SubmitIntent::Rejected => {
                self.view.reveal_errors();
                if let Some(blocking) = session.first_blocking() {
                    if let Some(index) = self.definition.position(blocking.id) {
                        self.view.focus(index);
                    }
                    self.view
                        .set_notice(format!("Please check \"{}\"", blocking.label));
                }
            }
            SubmitIntent::Ignored => debug!("submit ignored while in flight"),
        }
        None
    }

    fn confirmed(&mut self) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let ticket = self.gate.confirm(session)?;
        info!(form = self.definition.slug, resource = ticket.resource, "dispatching submission");
        let store = Arc::clone(&self.store);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = ticket.dispatch(store.as_ref()).await;
            if let Some(tx) = tx {
                let _ = tx.send(Action::SubmissionFinished(result));
            }
        });
        Ok(())
    }

    fn finished(&mut self, result: Result<(), PersistenceError>) -> Result<Option<Action>> {
        let attempt = self.gate.complete(result)?;
        let copy = &self.definition.copy;
        match attempt.result {
            AttemptResult::Success => {
                self.send(Action::Notify(Notification::success(
                    &copy.success_title,
                    &copy.success_message,
                )));
                let route = copy.success_route.clone();
                // reopening an edit page starts from what was just saved
                if let (Some(record), Some(session)) = (self.prefill.as_mut(), self.session.as_ref()) {
                    record.extend(session.payload());
                }
                self.session = None;
                Ok(Some(Action::Navigate(route)))
            }
            AttemptResult::Failure(reason) => {
                self.send(Action::Notify(Notification::error(
                    "Error",
                    format!("{} {reason}", copy.failure_fallback),
                )));
                Ok(None)
            }
            AttemptResult::Pending => Ok(None),
        }
    }
}

impl Page for FormPage {
    fn name(&self) -> &str {
        &self.id
    }

    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(tx);
        Ok(())
    }

    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        if let Some(popup) = self.popup.as_mut() {
            return popup.handle_events(event);
        }
        if self.gate.is_in_flight() {
            return Ok(None);
        }
        Ok(match event {
            Some(Event::Key(key)) => self.handle_key(key),
            Some(Event::Paste(text)) => {
                self.input(InputEvent::Paste(text));
                None
            }
            _ => None,
        })
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Submit => Ok(self.submit()),
            Action::PopupResult(result) => {
                self.popup = None;
                match result {
                    PopupResult::Confirmed => self.confirmed()?,
                    PopupResult::Cancelled => self.gate.decline()?,
                }
                Ok(None)
            }
            Action::SubmissionFinished(result) => self.finished(result),
            _ => Ok(None),
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        if let Some(session) = self.session.as_ref() {
            render_form(&mut self.view, session, &self.gate, frame, area)?;
        }
        if let Some(popup) = self.popup.as_mut() {
            render_backdrop(frame, area);
            popup.draw(frame, area)?;
        }
        Ok(())
    }

    fn on_enter(&mut self) -> Result<()> {
        self.open_session();
        Ok(())
    }
}
