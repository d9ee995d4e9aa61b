//! Terminal view of one form session: focus, scrolling and value display.
//!
//! The session and the gate live on the page; this module only keeps the
//! cursor state and knows how to draw them.

use field_gate::prelude::{FieldKind, FieldSpec, FormSession};

mod render;

pub use render::{compute_scrollbar_thumb, render_form};

/// Rows one field takes on screen (label, help or error, spacer).
pub(crate) const ROWS_PER_FIELD: usize = 3;

#[derive(Debug, Default, Clone)]
pub struct FormView {
    focused: usize,
    scroll: usize,
    /// Show errors on untouched fields too (set after a rejected submit).
    reveal_errors: bool,
    /// Short feedback shown above the hints (locked field, rejected input).
    notice: Option<String>,
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn focus_next(&mut self, count: usize) {
        if count > 0 {
            self.focused = (self.focused + 1) % count;
        }
    }

    pub fn focus_prev(&mut self, count: usize) {
        if count > 0 {
            self.focused = (self.focused + count - 1) % count;
        }
    }

    pub fn focus(&mut self, index: usize) {
        self.focused = index;
    }

    pub fn reveal_errors(&mut self) {
        self.reveal_errors = true;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scroll so the focused field is inside a window of `visible` fields.
    pub fn ensure_visible(&mut self, visible: usize) {
        let visible = visible.max(1);
        if self.focused < self.scroll {
            self.scroll = self.focused;
        } else if self.focused >= self.scroll + visible {
            self.scroll = self.focused + 1 - visible;
        }
    }

    /// `[start, end)` of the fields currently on screen.
    pub fn visible_bounds(&self, visible: usize, total: usize) -> (usize, usize) {
        let start = self.scroll.min(total);
        (start, (start + visible.max(1)).min(total))
    }

    /// Whether an error for `id` should be drawn.
    pub fn shows_error(&self, session: &FormSession, id: &str) -> bool {
        self.reveal_errors || session.is_touched(id)
    }
}

/// Text shown for a field value; empty values get a format hint.
pub fn display_value(spec: &FieldSpec, raw: &str) -> String {
    if !raw.is_empty() {
        return raw.to_string();
    }
    match &spec.kind {
        FieldKind::Choice { .. } => "< select >".into(),
        FieldKind::Date => "YYYY-MM-DD".into(),
        FieldKind::Time => "HH:MM".into(),
        FieldKind::Text | FieldKind::Integer => String::new(),
    }
}

/// Next (or previous) option of a choice field, starting from `current`.
pub fn cycle_choice(options: &[&'static str], current: &str, forward: bool) -> Option<&'static str> {
    if options.is_empty() {
        return None;
    }
    let next = match options.iter().position(|o| *o == current) {
        None if forward => 0,
        None => options.len() - 1,
        Some(i) if forward => (i + 1) % options.len(),
        Some(i) => (i + options.len() - 1) % options.len(),
    };
    Some(options[next])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn focus_wraps_around() {
        let mut view = FormView::new();
        view.focus_prev(3);
        assert_eq!(view.focused(), 2);
        view.focus_next(3);
        assert_eq!(view.focused(), 0);
    }

    #[test]
    fn scrolling_follows_focus() {
        let mut view = FormView::new();
        view.focus(5);
        view.ensure_visible(3);
        assert_eq!(view.scroll(), 3);
        assert_eq!(view.visible_bounds(3, 7), (3, 6));
        view.focus(1);
        view.ensure_visible(3);
        assert_eq!(view.scroll(), 1);
    }

    #[test]
    fn choices_cycle_in_both_directions() {
        let options = ["Kg", "MetricTon"];
        assert_eq!(cycle_choice(&options, "", true), Some("Kg"));
        assert_eq!(cycle_choice(&options, "", false), Some("MetricTon"));
        assert_eq!(cycle_choice(&options, "MetricTon", true), Some("Kg"));
        assert_eq!(cycle_choice(&options, "Kg", false), Some("MetricTon"));
        assert_eq!(cycle_choice(&[], "Kg", true), None);
    }
}
