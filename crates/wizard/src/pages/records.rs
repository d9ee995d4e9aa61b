use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use farm_records::RecordStore;
use field_gate::prelude::*;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::{MENU, Page};
use crate::{
    action::Action,
    tui::{Event, Frame},
};

#[derive(Debug, Clone, PartialEq)]
enum Listing {
    Loading,
    Loaded(Vec<Record>),
    Failed(String),
}

/// Read-only list of the records behind a form, reached after a successful
/// submission and from the menu.
pub struct RecordsPage {
    route: String,
    definition: Arc<FormDefinition>,
    store: Arc<RecordStore>,
    listing: Listing,
    table: TableState,
    action_tx: Option<UnboundedSender<Action>>,
}

impl RecordsPage {
    pub fn new(definition: Arc<FormDefinition>, store: Arc<RecordStore>) -> Self {
        Self {
            route: definition.copy.success_route.clone(),
            definition,
            store,
            listing: Listing::Loading,
            table: TableState::default(),
            action_tx: None,
        }
    }

    fn reload(&mut self) {
        self.listing = Listing::Loading;
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let resource = self.definition.resource;
        debug!(resource, "loading records");
        tokio::spawn(async move {
            let result = store.list(resource).await;
            let _ = tx.send(Action::RecordsLoaded {
                resource: resource.to_string(),
                result,
            });
        });
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Navigate(MENU.into())),
            KeyCode::Char('r') => Some(Action::Reload),
            KeyCode::Up | KeyCode::Char('k') => {
                self.table.select_previous();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.table.select_next();
                None
            }
            _ => None,
        }
    }
}

/// Cell text for a stored value. ISO timestamps are cut down to the date.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) if ts.to_rfc3339_opts(SecondsFormat::Millis, true).ends_with("T00:00:00.000Z") => {
                ts.date_naive().to_string()
            }
            Ok(ts) => ts.naive_utc().format("%Y-%m-%d %H:%M").to_string(),
            Err(_) => s.clone(),
        },
        Some(other) => other.to_string(),
    }
}

impl Page for RecordsPage {
    fn name(&self) -> &str {
        &self.route
    }

    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(tx);
        Ok(())
    }

    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        Ok(match event {
            Some(Event::Key(key)) => self.handle_key(key),
            _ => None,
        })
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Reload => self.reload(),
            Action::RecordsLoaded { resource, result } if resource == self.definition.resource => {
                self.listing = match result {
                    Ok(records) => {
                        if !records.is_empty() {
                            self.table.select(Some(0));
                        }
                        Listing::Loaded(records)
                    }
                    Err(err) => {
                        warn!(%err, resource = %resource, "loading records failed");
                        Listing::Failed(err.user_message())
                    }
                };
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default()
            .title(format!(" {} records ", self.definition.title))
            .borders(Borders::ALL)
            .border_set(symbols::border::ROUNDED);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [body, footer] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        match &self.listing {
            Listing::Loading => {
                frame.render_widget(Paragraph::new("Loading…").fg(Color::Yellow), body);
            }
            Listing::Failed(reason) => {
                frame.render_widget(
                    Paragraph::new(format!("Could not load records: {reason}")).fg(Color::Red),
                    body,
                );
            }
            Listing::Loaded(records) if records.is_empty() => {
                frame.render_widget(Paragraph::new("No records yet.").fg(Color::Gray), body);
            }
            Listing::Loaded(records) => {
                let fields = self.definition.fields();
                let header = Row::new(fields.iter().map(|f| f.label))
                    .style(Style::default().add_modifier(Modifier::BOLD));
                let rows = records.iter().map(|record| {
                    Row::new(fields.iter().map(|f| cell_text(record.get(f.id))))
                });
                let widths = vec![Constraint::Fill(1); fields.len()];
                let table = Table::new(rows, widths)
                    .header(header)
                    .row_highlight_style(Style::default().fg(Color::Black).bg(Color::White));
                frame.render_stateful_widget(table, body, &mut self.table);
            }
        }

        let hints = Line::from(vec![
            Span::styled("Up/Down", Style::default().fg(Color::White)),
            Span::raw(": Scroll   "),
            Span::styled("r", Style::default().fg(Color::White)),
            Span::raw(": Reload   "),
            Span::styled("Esc", Style::default().fg(Color::White)),
            Span::raw(": Menu"),
        ])
        .fg(Color::DarkGray);
        frame.render_widget(Paragraph::new(hints), footer);
        Ok(())
    }

    fn on_enter(&mut self) -> Result<()> {
        self.reload();
        Ok(())
    }
}
