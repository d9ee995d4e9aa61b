use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Block, Borders, Clear},
};

use crate::{action::Action, components::Component, tui::Frame};

/// Popup components and helpers
///
/// Intended usage:
/// 1) Draw the active page as usual
/// 2) If a popup is active:
///    - call `render_backdrop(frame, area)`
///    - compute a centered rect with `centered_rect_fixed(area, width, height)`
///    - call `draw_popup_frame(frame, popup_area, "Title")`
///    - draw your popup content inside the same `popup_area`
pub trait PopupComponent: Component {
    /// Whether the popup is modal (blocks page interactions). Defaults to true.
    fn is_modal(&self) -> bool {
        true
    }

    /// Action to emit when the popup is confirmed (Enter).
    fn submit_action(&mut self) -> Option<Action> {
        Some(Action::ClosePopup)
    }

    /// Action to emit when the popup is cancelled (Esc).
    fn cancel_action(&mut self) -> Option<Action> {
        Some(Action::ClosePopup)
    }
}

/// Dim the page behind a popup. Terminals have no transparency, so this is a
/// solid dark fill.
pub fn render_backdrop(frame: &mut Frame<'_>, area: Rect) {
    let backdrop = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(backdrop, area);
}

/// Centered rectangle of a fixed size, clamped to `area`.
pub fn centered_rect_fixed(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);

    let x = area.x.saturating_add((area.width.saturating_sub(w)) / 2);
    let y = area.y.saturating_add((area.height.saturating_sub(h)) / 2);

    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Draw a rounded, bordered popup shell with a title at `area` and return the
/// inner area. The dialog area is cleared first.
pub fn draw_popup_frame(frame: &mut Frame<'_>, area: Rect, title: impl Into<String>) -> Rect {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_set(symbols::border::ROUNDED)
        .style(Style::default().fg(Color::White).bg(Color::Black));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}
