use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use field_gate::prelude::{Notification, Severity};
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::{
    action::Action,
    components::{Component, PopupComponent},
    tui::Frame,
};

use super::{centered_rect_fixed, draw_popup_frame};

/// Modal alert with a title and a message. Enter or Esc acknowledges it.
#[derive(Debug)]
pub struct AlertPopup {
    title: String,
    message: String,
    accent: Color,
    min_width: u16,
    min_height: u16,
}

impl AlertPopup {
    pub fn new<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            accent: Color::White,
            min_width: 60,
            min_height: 7,
        }
    }

    pub fn from_notification(notification: &Notification) -> Self {
        let accent = match notification.severity {
            Severity::Success => Color::Green,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        };
        Self::new(&notification.title, &notification.message).accent(accent)
    }

    pub fn accent(mut self, color: Color) -> Self {
        self.accent = color;
        self
    }

    /// Height that fits the wrapped message plus title, spacer and hint rows.
    fn wanted_height(&self, width: u16) -> u16 {
        let usable = width.saturating_sub(2).max(1) as usize;
        let body: usize = self
            .message
            .lines()
            .map(|l| l.chars().count().div_ceil(usable).max(1))
            .sum();
        (body as u16 + 5).max(self.min_height)
    }
}

impl PopupComponent for AlertPopup {
    fn submit_action(&mut self) -> Option<Action> {
        Some(Action::DismissNotification)
    }

    fn cancel_action(&mut self) -> Option<Action> {
        Some(Action::DismissNotification)
    }
}

impl Component for AlertPopup {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Enter => self.submit_action(),
            KeyCode::Esc => self.cancel_action(),
            _ => None,
        })
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }
        let width = self.min_width.min(area.width);
        let dialog = centered_rect_fixed(area, width, self.wanted_height(width));
        let inner = draw_popup_frame(f, dialog, &self.title);

        let mut lines: Vec<Line> = self
            .message
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(self.accent))))
            .collect();
        lines.push(Line::raw(""));
        lines.push(
            Line::from(vec![
                Span::styled("Enter/Esc", Style::default().fg(Color::White)),
                Span::raw(": OK"),
            ])
            .fg(Color::DarkGray),
        );

        let para = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        f.render_widget(para, inner);
        Ok(())
    }
}
