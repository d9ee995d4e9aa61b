use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::{MENU, Page};
use crate::{
    action::Action,
    tui::{Event, Frame},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub target: String,
}

impl MenuEntry {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// Start page: pick a form to fill in or a record list to look at.
pub struct MenuPage {
    entries: Vec<MenuEntry>,
    state: ListState,
    backend: String,
}

impl MenuPage {
    pub fn new(entries: Vec<MenuEntry>, backend: impl Into<String>) -> Self {
        let mut state = ListState::default();
        if !entries.is_empty() {
            state.select(Some(0));
        }
        Self {
            entries,
            state,
            backend: backend.into(),
        }
    }

    fn selected(&self) -> Option<&MenuEntry> {
        self.state.selected().and_then(|i| self.entries.get(i))
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select_previous();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select_next();
                None
            }
            KeyCode::Enter => self.selected().map(|e| Action::Navigate(e.target.clone())),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        }
    }
}

impl Page for MenuPage {
    fn name(&self) -> &str {
        MENU
    }

    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        Ok(match event {
            Some(Event::Key(key)) => self.handle_key(key),
            _ => None,
        })
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default()
            .title(" Plantation records ")
            .borders(Borders::ALL)
            .border_set(symbols::border::ROUNDED);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [list_area, footer] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|e| ListItem::new(Line::from(e.label.clone())))
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, list_area, &mut self.state);

        let footer_lines = vec![
            Line::from(Span::styled(
                format!("Backend: {}", self.backend),
                Style::default().fg(Color::Gray),
            )),
            Line::from(vec![
                Span::styled("Up/Down", Style::default().fg(Color::White)),
                Span::raw(": Select   "),
                Span::styled("Enter", Style::default().fg(Color::White)),
                Span::raw(": Open   "),
                Span::styled("q", Style::default().fg(Color::White)),
                Span::raw(": Quit"),
            ])
            .fg(Color::DarkGray),
        ];
        frame.render_widget(Paragraph::new(footer_lines), footer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn press(page: &mut MenuPage, code: KeyCode) -> Option<Action> {
        page.handle_events(Some(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))))
            .unwrap()
    }

    #[test]
    fn enter_navigates_to_the_selected_entry() {
        let mut page = MenuPage::new(
            vec![
                MenuEntry::new("New harvest schedule", "form/harvest-schedule"),
                MenuEntry::new("New maintenance record", "form/maintenance"),
            ],
            "offline",
        );
        assert_eq!(
            press(&mut page, KeyCode::Enter),
            Some(Action::Navigate("form/harvest-schedule".into()))
        );
        press(&mut page, KeyCode::Down);
        assert_eq!(
            press(&mut page, KeyCode::Enter),
            Some(Action::Navigate("form/maintenance".into()))
        );
        assert_eq!(press(&mut page, KeyCode::Char('q')), Some(Action::Quit));
    }
}
