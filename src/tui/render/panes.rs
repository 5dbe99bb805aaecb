use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::io::paths::abbreviate_path;
use crate::model::Pane;
use crate::tui::app::App;

fn pane_block(app: &App, title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        app.theme.highlight
    } else {
        app.theme.dim
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(app.theme.background))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(app.theme.text_bright)
                .add_modifier(Modifier::BOLD),
        ))
}

fn row_style(app: &App, is_cursor: bool, focused: bool) -> Style {
    let style = Style::default().fg(app.theme.text).bg(app.theme.background);
    match (is_cursor, focused) {
        (true, true) => style
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD),
        (true, false) => style.fg(app.theme.text_bright),
        _ => style,
    }
}

/// Left pane: every topic with its workspace count
pub fn render_topics(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::Topics;
    let title = format!("Topics {}", abbreviate_path(&app.hangar.root));
    let block = pane_block(app, title, focused);

    let lines: Vec<Line> = if app.topics.is_empty() {
        vec![Line::from(Span::styled(
            " no topics (n to create)",
            Style::default().fg(app.theme.dim),
        ))]
    } else {
        app.topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let count = app.hangar.workspaces.for_topic(&topic.name).len();
                let style = row_style(app, i == app.topic_cursor, focused);
                Line::from(vec![
                    Span::styled(format!(" {}", topic.name), style),
                    Span::styled(format!(" ({})", count), Style::default().fg(app.theme.dim)),
                ])
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Right pane: workspaces of the focused topic with session markers
pub fn render_workspaces(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::Workspaces;
    let title = app
        .current_topic()
        .map_or_else(|| "Workspaces".to_string(), |t| t.name.clone());
    let block = pane_block(app, title, focused);
    let selected = app.hangar.workspaces.selected().map(|w| w.short_path());

    let lines: Vec<Line> = if app.workspaces.is_empty() {
        vec![Line::from(Span::styled(
            " no workspaces",
            Style::default().fg(app.theme.dim),
        ))]
    } else {
        app.workspaces
            .iter()
            .enumerate()
            .map(|(i, ws)| {
                let key = ws.short_path();
                let windows = app.sessions.get(&key);
                let marker = if windows.is_some() { "●" } else { "○" };
                let mark_selected = if selected.as_deref() == Some(key.as_str()) {
                    "*"
                } else {
                    " "
                };
                let mut spans = vec![
                    Span::styled(
                        format!("{}{} ", mark_selected, marker),
                        Style::default().fg(app.theme.session_color(windows.is_some())),
                    ),
                    Span::styled(ws.name.clone(), row_style(app, i == app.workspace_cursor, focused)),
                ];
                if let Some(n) = windows {
                    spans.push(Span::styled(
                        format!(" [{}]", n),
                        Style::default().fg(app.theme.green),
                    ));
                }
                if !ws.metadata.description.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", ws.metadata.description),
                        Style::default().fg(app.theme.dim),
                    ));
                }
                Line::from(spans)
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
