use std::collections::VecDeque;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use field_gate::prelude::Notification;
use ratatui::layout::Rect;
use tracing::info;

use crate::{
    action::Action,
    components::{Component, popups::AlertPopup},
    tui::Frame,
};

/// Queue of notification dialogs. The front one is shown as a modal alert and
/// swallows key input until it is dismissed.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    queue: VecDeque<Notification>,
    current: Option<AlertPopup>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        info!(
            severity = ?notification.severity,
            title = %notification.title,
            message = %notification.message,
            "notification"
        );
        self.queue.push_back(notification);
        if self.current.is_none() {
            self.advance();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn advance(&mut self) {
        let waiting = self.pending().saturating_sub(1);
        self.current = self.queue.front().map(|n| {
            if waiting == 0 {
                return AlertPopup::from_notification(n);
            }
            let mut n = n.clone();
            n.title = format!("{} (+{waiting})", n.title);
            AlertPopup::from_notification(&n)
        });
    }

    fn dismiss(&mut self) {
        self.queue.pop_front();
        self.advance();
    }
}

impl Component for NotificationCenter {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.current.as_mut() {
            Some(alert) => alert.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Notify(notification) => self.push(notification),
            Action::DismissNotification => self.dismiss(),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        if let Some(alert) = self.current.as_mut() {
            alert.draw(frame, area)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    #[test]
    fn notifications_are_shown_one_at_a_time() {
        let mut center = NotificationCenter::new();
        assert!(!center.is_active());

        center
            .update(Action::Notify(Notification::success("Success", "saved")))
            .unwrap();
        center
            .update(Action::Notify(Notification::warning("Low Stock Alert", "restock")))
            .unwrap();
        assert!(center.is_active());
        assert_eq!(center.pending(), 2);

        let ack = center
            .handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert_eq!(ack, Some(Action::DismissNotification));
        center.update(Action::DismissNotification).unwrap();
        assert!(center.is_active());
        assert_eq!(center.pending(), 1);

        center.update(Action::DismissNotification).unwrap();
        assert!(!center.is_active());
    }

    #[test]
    fn keys_pass_through_when_idle() {
        let mut center = NotificationCenter::new();
        let out = center
            .handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert_eq!(out, None);
    }
}
