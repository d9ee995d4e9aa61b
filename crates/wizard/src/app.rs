use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use farm_records::{FormKind, RecordStore, registry};
use field_gate::prelude::{Clock, Record, SystemClock};
use ratatui::prelude::Rect;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    action::Action,
    components::{Component, notifications::NotificationCenter},
    config::Config,
    pages::{FormPage, MENU, MenuEntry, MenuPage, Page, RecordsPage, form_page_id},
    tui::{Event, Tui},
};

/// Existing record opened for editing at startup.
#[derive(Debug, Clone)]
pub struct EditTarget {
    pub kind: FormKind,
    pub id: String,
    pub record: Record,
}

pub struct App {
    config: Config,
    tick_rate: f64,
    frame_rate: f64,
    pages: HashMap<String, Box<dyn Page>>,
    current_page: Option<String>,
    notifications: NotificationCenter,
    should_quit: bool,
    should_suspend: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(config: Config, store: Arc<RecordStore>, edit: Option<EditTarget>) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let forms = registry()?;

        let mut pages: HashMap<String, Box<dyn Page>> = HashMap::new();
        let mut entries = Vec::new();
        for kind in FormKind::iter() {
            let Some(definition) = forms.get(kind.slug()) else {
                continue;
            };
            let page_id = form_page_id(definition.slug);
            if kind.edits_existing() {
                // edit-only forms need a record to work on
                if let Some(edit) = edit.as_ref().filter(|e| e.kind == kind) {
                    entries.push(MenuEntry::new(
                        format!("Edit {} {}", definition.title, edit.id),
                        page_id.clone(),
                    ));
                    pages.insert(
                        page_id,
                        Box::new(FormPage::editing(
                            form_page_id(definition.slug),
                            Arc::clone(&definition),
                            Arc::clone(&clock),
                            Arc::clone(&store),
                            edit.id.clone(),
                            edit.record.clone(),
                        )),
                    );
                }
            } else {
                entries.push(MenuEntry::new(format!("New {}", definition.title), page_id.clone()));
                pages.insert(
                    page_id.clone(),
                    Box::new(FormPage::new(
                        page_id,
                        Arc::clone(&definition),
                        Arc::clone(&clock),
                        Arc::clone(&store),
                    )),
                );
            }

            let route = definition.copy.success_route.clone();
            entries.push(MenuEntry::new(format!("Browse {} records", definition.title), route.clone()));
            pages.insert(route, Box::new(RecordsPage::new(definition, Arc::clone(&store))));
        }
        pages.insert(MENU.to_string(), Box::new(MenuPage::new(entries, store.describe())));

        let current_page = match &edit {
            Some(edit) => form_page_id(edit.kind.slug()),
            None => MENU.to_string(),
        };

        Ok(Self {
            tick_rate: config.tui.tick_rate,
            frame_rate: config.tui.frame_rate,
            config,
            pages,
            current_page: Some(current_page),
            notifications: NotificationCenter::new(),
            should_quit: false,
            should_suspend: false,
            action_tx,
            action_rx,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?
            .tick_rate(self.tick_rate)
            .frame_rate(self.frame_rate);
        tui.enter()?;

        self.enter_current(&tui)?;
        let _ = self.action_tx.send(Action::ClearScreen);
        let _ = self.action_tx.send(Action::Render);

        let action_tx = self.action_tx.clone();
        loop {
            self.handle_events(&mut tui).await?;
            self.handle_actions(&mut tui)?;
            if self.should_suspend {
                tui.suspend()?;
                action_tx.send(Action::Resume)?;
                action_tx.send(Action::ClearScreen)?;
                tui.enter()?;
            } else if self.should_quit {
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    fn current(&mut self) -> Option<&mut Box<dyn Page>> {
        let current = self.current_page.as_ref()?;
        self.pages.get_mut(current)
    }

    fn enter_current(&mut self, tui: &Tui) -> Result<()> {
        let size = tui.size()?;
        let action_tx = self.action_tx.clone();
        let config = self.config.clone();
        if let Some(page) = self.current() {
            page.register_action_handler(action_tx)?;
            page.register_config_handler(config)?;
            page.init(size)?;
            page.on_enter()?;
        }
        Ok(())
    }

    async fn handle_events(&mut self, tui: &mut Tui) -> Result<()> {
        let Some(event) = tui.next().await else {
            return Ok(());
        };
        let action_tx = self.action_tx.clone();
        match event {
            Event::Tick => action_tx.send(Action::Tick)?,
            Event::Render => action_tx.send(Action::Render)?,
            Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
            Event::Key(key) => {
                if let Some(action) = self.global_key(key) {
                    action_tx.send(action)?;
                    return Ok(());
                }
            }
            _ => {}
        }

        // an open notification is modal
        if self.notifications.is_active() {
            if let Some(action) = self.notifications.handle_events(Some(event))? {
                action_tx.send(action)?;
            }
            return Ok(());
        }
        if let Some(page) = self.current() {
            if let Some(action) = page.handle_events(Some(event))? {
                action_tx.send(action)?;
            }
        }
        Ok(())
    }

    fn global_key(&self, key: KeyEvent) -> Option<Action> {
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('z') => Some(Action::Suspend),
            _ => None,
        }
    }

    fn handle_actions(&mut self, tui: &mut Tui) -> Result<()> {
        while let Ok(action) = self.action_rx.try_recv() {
            if action != Action::Tick && action != Action::Render {
                debug!("{action:?}");
            }
            match &action {
                Action::Quit => self.should_quit = true,
                Action::Suspend => self.should_suspend = true,
                Action::Resume => self.should_suspend = false,
                Action::ClearScreen => tui.terminal.clear()?,
                Action::Navigate(name) => self.navigate(tui, name)?,
                Action::Resize(w, h) => self.handle_resize(tui, *w, *h)?,
                Action::Render => self.render(tui)?,
                Action::Error(msg) => error!("{msg}"),
                Action::Notify(_) | Action::DismissNotification => {
                    self.notifications.update(action.clone())?;
                    continue;
                }
                _ => {}
            }

            if let Some(page) = self.current() {
                if let Some(next) = page.update(action)? {
                    self.action_tx.send(next)?
                };
            }
        }
        Ok(())
    }

    fn navigate(&mut self, tui: &mut Tui, name: &str) -> Result<()> {
        if !self.pages.contains_key(name) {
            debug!("Attempted to navigate to unknown page: {}", name);
            return Ok(());
        }
        if let Some(page) = self.current() {
            page.on_exit()?;
        }
        info!(page = name, "navigate");
        self.current_page = Some(name.to_string());
        self.enter_current(tui)?;
        let _ = self.action_tx.send(Action::ClearScreen);
        let _ = self.action_tx.send(Action::Render);
        Ok(())
    }

    fn handle_resize(&mut self, tui: &mut Tui, w: u16, h: u16) -> Result<()> {
        tui.resize(Rect::new(0, 0, w, h))?;
        self.render(tui)?;
        Ok(())
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        let action_tx = self.action_tx.clone();
        let current = self.current_page.clone();
        let pages = &mut self.pages;
        let notifications = &mut self.notifications;
        tui.draw(|frame| {
            let area = frame.area();
            if let Some(page) = current.as_ref().and_then(|c| pages.get_mut(c)) {
                if let Err(err) = page.draw(frame, area) {
                    let _ = action_tx.send(Action::Error(format!("Failed to draw: {:?}", err)));
                }
            }
            if let Err(err) = notifications.draw(frame, area) {
                let _ = action_tx.send(Action::Error(format!("Failed to draw: {:?}", err)));
            }
        })?;
        Ok(())
    }
}
