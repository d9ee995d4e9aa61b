use color_eyre::Result;
use field_gate::prelude::{FieldStatus, FormSession, GateState, SubmissionGate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{FormView, ROWS_PER_FIELD, display_value};
use crate::tui::Frame;

/// Vertical thumb position of a scrollbar for `total` items of which
/// `visible` fit, scrolled by `scroll`, on a track `track_height` cells high.
///
/// `None` when everything fits or the track is degenerate.
pub fn compute_scrollbar_thumb(
    total: usize,
    visible: usize,
    scroll: usize,
    track_height: u16,
) -> Option<usize> {
    if track_height == 0 {
        return None;
    }
    if total == 0 || visible == 0 || total <= visible {
        return None;
    }

    let max_thumb_y = track_height.saturating_sub(1) as usize;
    let denom = total.saturating_sub(visible).max(1);
    let ratio = (scroll as f32) / (denom as f32);
    let thumb_y = (ratio * (max_thumb_y as f32)).round() as usize;
    Some(thumb_y.min(max_thumb_y))
}

/// Draw the whole form screen: header, fields, submission status and hints.
pub fn render_form(
    view: &mut FormView,
    session: &FormSession,
    gate: &SubmissionGate,
    f: &mut Frame<'_>,
    area: Rect,
) -> Result<()> {
    let definition = session.definition();
    let block = Block::default()
        .title(format!(" {} ", definition.title))
        .borders(Borders::ALL)
        .border_set(symbols::border::ROUNDED);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width < 5 || inner.height < 5 {
        return Ok(());
    }

    let header_height = if definition.description.is_some() { 2 } else { 0 };
    let [header, body, status, hints] = Layout::vertical([
        Constraint::Length(header_height),
        Constraint::Min(ROWS_PER_FIELD as u16),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(inner);

    if let Some(desc) = &definition.description {
        f.render_widget(
            Paragraph::new(desc.as_str())
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true }),
            header,
        );
    }

    // Fields
    let total = definition.field_count();
    let visible = (body.height as usize / ROWS_PER_FIELD).max(1);
    view.ensure_visible(visible);
    let (start, end) = view.visible_bounds(visible, total);

    let mut lines: Vec<Line> = Vec::new();
    for (offset, field) in definition.fields()[start..end].iter().enumerate() {
        let focused = start + offset == view.focused();
        let locked = session.is_locked(field.id);
        let raw = session.value(field.id).unwrap_or_default();

        let label_style = Style::default()
            .fg(if locked { Color::DarkGray } else { Color::White })
            .add_modifier(if focused {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });
        let value_style = if locked {
            Style::default().fg(Color::DarkGray)
        } else if focused {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let marker = match session.status(field.id) {
            _ if locked => Span::styled(" (locked)", Style::default().fg(Color::DarkGray)),
            Some(FieldStatus::Valid) => Span::styled(" ✓", Style::default().fg(Color::Green)),
            _ => Span::raw(""),
        };
        let required = if field.required { "*" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{required}: ", field.label), label_style),
            Span::styled(format!(" {} ", display_value(field, raw)), value_style),
            marker,
        ]));

        // second row: error wins over help
        let error = match session.status(field.id) {
            Some(FieldStatus::Invalid(msg)) if view.shows_error(session, field.id) => Some(msg),
            _ => None,
        };
        let second = if let Some(msg) = error {
            Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red)))
        } else if locked {
            let dep = field
                .depends_on
                .and_then(|d| definition.field(d))
                .map(|d| d.label)
                .unwrap_or_default();
            Line::from(Span::styled(
                format!("Complete \"{dep}\" first"),
                Style::default().fg(Color::DarkGray),
            ))
        } else if let Some(help) = &field.help {
            Line::from(Span::styled(help.clone(), Style::default().fg(Color::DarkGray)))
        } else {
            Line::raw("")
        };
        lines.push(second);
        lines.push(Line::raw(""));
    }
    f.render_widget(Paragraph::new(Text::from(lines)), body);

    if let Some(thumb) = compute_scrollbar_thumb(total, visible, view.scroll(), body.height) {
        let track = Rect {
            x: body.x + body.width.saturating_sub(1),
            y: body.y,
            width: 1,
            height: body.height,
        };
        let rows: Vec<Line> = (0..track.height as usize)
            .map(|i| {
                if i == thumb {
                    Line::from(Span::styled("█", Style::default().fg(Color::White)))
                } else {
                    Line::from(Span::styled("│", Style::default().fg(Color::DarkGray)))
                }
            })
            .collect();
        f.render_widget(Paragraph::new(rows), track);
    }

    // Submission status
    let mut status_lines = Vec::new();
    match gate.state() {
        GateState::Submitting => status_lines.push(Line::from(Span::styled(
            "Saving…",
            Style::default().fg(Color::Yellow),
        ))),
        GateState::Succeeded => status_lines.push(Line::from(Span::styled(
            "Saved.",
            Style::default().fg(Color::Green),
        ))),
        _ => {
            if let Some(reason) = gate.last_failure() {
                status_lines.push(Line::from(Span::styled(
                    format!("Last attempt failed: {reason}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }
    }
    if let Some(notice) = view.notice() {
        status_lines.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(status_lines), status);

    let hint_line = Line::from(vec![
        Span::styled("Up/Down", Style::default().fg(Color::White)),
        Span::raw(": Navigate   "),
        Span::styled("Left/Right", Style::default().fg(Color::White)),
        Span::raw(": Choose   "),
        Span::styled("Del", Style::default().fg(Color::White)),
        Span::raw(": Clear   "),
        Span::styled("Enter", Style::default().fg(Color::White)),
        Span::raw(": Submit   "),
        Span::styled("Esc", Style::default().fg(Color::White)),
        Span::raw(": Back"),
    ])
    .fg(Color::DarkGray);
    f.render_widget(Paragraph::new(hint_line), hints);
    Ok(())
}
