use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Pane;
use crate::tui::app::{App, ConfirmKind, Mode};

const NAV_HINTS_TOPICS: &str = "n new  r rename  d delete  Enter open  q quit";
const NAV_HINTS_WORKSPACES: &str = "n new  r rename  m move  e describe  d delete  Enter attach";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint): (Vec<Span>, &str) = match &app.mode {
        Mode::Navigate => {
            let mut spans = Vec::new();
            if let Some(status) = &app.status {
                let fg = if status.is_error {
                    app.theme.red
                } else {
                    app.theme.text_bright
                };
                spans.push(Span::styled(status.text.clone(), Style::default().fg(fg).bg(bg)));
            } else if app.loading {
                spans.push(Span::styled("loading…", Style::default().fg(app.theme.yellow).bg(bg)));
            }
            let hint = match app.pane {
                Pane::Topics => NAV_HINTS_TOPICS,
                Pane::Workspaces => NAV_HINTS_WORKSPACES,
            };
            (spans, hint)
        }
        Mode::Prompt { kind, input } => (
            vec![
                Span::styled(
                    format!("{}: {}", kind.label(), input),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ],
            "Enter confirm  Esc cancel",
        ),
        Mode::Confirm(kind) => {
            let question = match kind {
                ConfirmKind::DeleteTopic(t) => {
                    format!("delete topic {} and all its workspaces?", t.name)
                }
                ConfirmKind::DeleteWorkspace(w) => format!("delete {}?", w.short_path()),
            };
            (
                vec![Span::styled(question, Style::default().fg(app.theme.red).bg(bg))],
                "y yes  n no",
            )
        }
    };

    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let hint_width = hint.chars().count();
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
