use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use field_gate::prelude::ConfirmPrompt;
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::{
    action::{Action, PopupResult},
    components::{Component, PopupComponent},
    tui::Frame,
};

use super::{centered_rect_fixed, draw_popup_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Ok,
    Cancel,
}

/// Modal confirmation popup with selectable OK/Cancel buttons.
///
/// - Left/Right or Tab/BackTab: switch selected button
/// - Enter: emits `Action::PopupResult` for the selected button
/// - Esc: emits `Action::PopupResult(Cancelled)`
///
/// The owner closes the popup once it has handled the result.
#[derive(Debug)]
pub struct ConfirmPopup {
    title: String,
    question: String,
    ok_label: String,
    cancel_label: String,
    selected: Choice,
    min_width: u16,
    min_height: u16,
}

impl ConfirmPopup {
    pub fn new<T: Into<String>, Q: Into<String>>(title: T, question: Q) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
            ok_label: "OK".into(),
            cancel_label: "Cancel".into(),
            selected: Choice::Ok,
            min_width: 60,
            min_height: 9,
        }
    }

    pub fn from_prompt(prompt: &ConfirmPrompt) -> Self {
        Self::new(&prompt.title, &prompt.text)
            .ok_label(&prompt.confirm_label)
            .cancel_label(&prompt.cancel_label)
    }

    pub fn ok_label<S: Into<String>>(mut self, label: S) -> Self {
        self.ok_label = label.into();
        self
    }

    pub fn cancel_label<S: Into<String>>(mut self, label: S) -> Self {
        self.cancel_label = label.into();
        self
    }

    fn toggle_selection(&mut self) {
        self.selected = match self.selected {
            Choice::Ok => Choice::Cancel,
            Choice::Cancel => Choice::Ok,
        };
    }

    fn button(&self, label: &str, choice: Choice) -> Span<'static> {
        let style = if self.selected == choice {
            Style::default().fg(Color::Black).bg(Color::White).bold()
        } else {
            Style::default().fg(Color::White).bg(Color::Black)
        };
        Span::styled(format!("[ {label} ]"), style)
    }
}

impl PopupComponent for ConfirmPopup {
    fn submit_action(&mut self) -> Option<Action> {
        Some(match self.selected {
            Choice::Ok => Action::PopupResult(PopupResult::Confirmed),
            Choice::Cancel => Action::PopupResult(PopupResult::Cancelled),
        })
    }

    fn cancel_action(&mut self) -> Option<Action> {
        Some(Action::PopupResult(PopupResult::Cancelled))
    }
}

impl Component for ConfirmPopup {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.toggle_selection();
                None
            }
            KeyCode::Char('y') => {
                self.selected = Choice::Ok;
                self.submit_action()
            }
            KeyCode::Char('n') => self.cancel_action(),
            KeyCode::Enter => self.submit_action(),
            KeyCode::Esc => self.cancel_action(),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }

        let dialog = centered_rect_fixed(area, self.min_width, self.min_height);
        let inner = draw_popup_frame(f, dialog, &self.title);

        let mut lines: Vec<Line> = self
            .question
            .lines()
            .map(|l| Line::from(Span::raw(l.to_string())))
            .collect();
        if inner.height >= 3 {
            lines.push(Line::raw(""));
        }

        // buttons centered by padding
        let spacing = "   ";
        let buttons_len = (4 + self.ok_label.len()) + spacing.len() + (4 + self.cancel_label.len());
        let pad = (inner.width as usize).saturating_sub(buttons_len) / 2;
        lines.push(Line::from(vec![
            Span::raw(" ".repeat(pad)),
            self.button(&self.ok_label, Choice::Ok),
            Span::raw(spacing),
            self.button(&self.cancel_label, Choice::Cancel),
        ]));

        lines.push(Line::raw(""));
        lines.push(
            Line::from(vec![
                Span::styled("Left/Right", Style::default().fg(Color::White)),
                Span::raw(": Select   "),
                Span::styled("Enter", Style::default().fg(Color::White)),
                Span::raw(": Confirm   "),
                Span::styled("Esc", Style::default().fg(Color::White)),
                Span::raw(": Cancel"),
            ])
            .fg(Color::DarkGray),
        );

        let para = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        f.render_widget(para, inner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn popup() -> ConfirmPopup {
        ConfirmPopup::from_prompt(&ConfirmPrompt {
            title: "Are you sure?".into(),
            text: "Do you want to update the yield record?".into(),
            confirm_label: "Yes, update it!".into(),
            cancel_label: "Cancel".into(),
        })
    }

    #[test]
    fn enter_confirms_the_default_selection() {
        let mut p = popup();
        assert_eq!(
            p.handle_key_event(key(KeyCode::Enter)).unwrap(),
            Some(Action::PopupResult(PopupResult::Confirmed))
        );
    }

    #[test]
    fn toggling_then_enter_cancels() {
        let mut p = popup();
        assert_eq!(p.handle_key_event(key(KeyCode::Right)).unwrap(), None);
        assert_eq!(
            p.handle_key_event(key(KeyCode::Enter)).unwrap(),
            Some(Action::PopupResult(PopupResult::Cancelled))
        );
    }

    #[test]
    fn escape_always_cancels() {
        let mut p = popup();
        assert_eq!(
            p.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::PopupResult(PopupResult::Cancelled))
        );
    }
}
