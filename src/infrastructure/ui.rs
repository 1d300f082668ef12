//! Ratatui rendering of the session: plan tree, help line, confirmation modal.

use ansi_to_tui::IntoText;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::trace;

use crate::application::{ConfirmDialog, Mode, Session};
use crate::domain::{strip_ansi, ROOT_LABEL};

const BROWSE_HELP: &str = "↑/↓ move  ←/→ collapse/expand  enter toggle  q quit";
const CONFIRM_HELP: &str = "←/→ choose  enter confirm  esc back";

/// Render the whole session into `frame`, scrolling to keep focus visible.
pub fn render(frame: &mut Frame, session: &mut Session) {
    let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let frame_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {ROOT_LABEL} "));
    let inner = frame_block.inner(body);
    session.viewport_mut().resize(inner.y, usize::from(inner.height));
    if let Some(row) = session.focus_row() {
        session.viewport_mut().scroll_to(row);
    }
    let viewport = *session.viewport();
    let focus = session.focus();

    let lines: Vec<Line> = session
        .tree()
        .visible()
        .skip(viewport.offset)
        .take(viewport.height)
        .map(|(idx, node)| {
            let line = decorate(&node.data.label.display());
            if Some(idx) == focus {
                line.patch_style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(frame_block), body);

    let help = match session.mode() {
        Mode::Browse => BROWSE_HELP,
        Mode::Confirm(_) => CONFIRM_HELP,
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().add_modifier(Modifier::DIM)),
        footer,
    );

    if let Mode::Confirm(dialog) = session.mode() {
        render_dialog(frame, dialog);
    }
}

/// Convert a line with ANSI color codes into a styled line.
pub fn decorate(text: &str) -> Line<'static> {
    match text.as_bytes().into_text() {
        Ok(parsed) => parsed.lines.into_iter().next().unwrap_or_default(),
        Err(e) => {
            trace!(error = %e, "falling back to plain text");
            Line::raw(strip_ansi(text))
        }
    }
}

fn render_dialog(frame: &mut Frame, dialog: &ConfirmDialog) {
    let area = frame.area();
    let width = (dialog.prompt().chars().count() as u16 + 6).clamp(32, area.width.max(1));
    let popup = centered_rect(width, 7, area);

    let buttons: Vec<Span> = dialog
        .buttons()
        .iter()
        .enumerate()
        .flat_map(|(i, answer)| {
            let style = if i == dialog.focused() {
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default()
            };
            [Span::styled(format!(" {} ", answer.label()), style), Span::raw("  ")]
        })
        .collect();

    let text = vec![
        Line::from(dialog.prompt().to_string()),
        Line::default(),
        Line::from(buttons),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(" Confirm "))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}

/// Rectangle of at most `width` x `height` centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
