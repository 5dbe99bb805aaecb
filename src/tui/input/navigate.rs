use crossterm::event::{KeyCode, KeyEvent};

use crate::model::Pane;
use crate::tui::app::{App, ConfirmKind, Mode, PromptKind};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    app.status = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('h') | KeyCode::Left => app.pane = Pane::Topics,
        KeyCode::Char('l') | KeyCode::Right => {
            if app.current_topic().is_some() {
                app.pane = Pane::Workspaces;
            }
        }
        KeyCode::Tab => app.toggle_pane(),
        KeyCode::Enter => match app.pane {
            Pane::Topics => {
                if app.current_topic().is_some() {
                    app.pane = Pane::Workspaces;
                }
            }
            Pane::Workspaces => {
                if let Some(ws) = app.current_workspace().cloned() {
                    app.open_session(ws);
                }
            }
        },
        KeyCode::Char('n') => {
            let kind = match app.pane {
                Pane::Topics => Some(PromptKind::NewTopic),
                Pane::Workspaces => app.current_topic().cloned().map(PromptKind::NewWorkspace),
            };
            open_prompt(app, kind, String::new());
        }
        KeyCode::Char('r') => {
            let (kind, input) = match app.pane {
                Pane::Topics => match app.current_topic() {
                    Some(t) => (Some(PromptKind::RenameTopic(t.clone())), t.name.clone()),
                    None => (None, String::new()),
                },
                Pane::Workspaces => match app.current_workspace() {
                    Some(w) => (Some(PromptKind::RenameWorkspace(w.clone())), w.name.clone()),
                    None => (None, String::new()),
                },
            };
            open_prompt(app, kind, input);
        }
        KeyCode::Char('m') if app.pane == Pane::Workspaces => {
            let kind = app.current_workspace().cloned().map(PromptKind::MoveWorkspace);
            open_prompt(app, kind, String::new());
        }
        KeyCode::Char('e') if app.pane == Pane::Workspaces => {
            if let Some(ws) = app.current_workspace().cloned() {
                let input = ws.metadata.description.clone();
                open_prompt(app, Some(PromptKind::Describe(ws)), input);
            }
        }
        KeyCode::Char('d') => {
            let kind = match app.pane {
                Pane::Topics => app.current_topic().cloned().map(ConfirmKind::DeleteTopic),
                Pane::Workspaces => app
                    .current_workspace()
                    .cloned()
                    .map(ConfirmKind::DeleteWorkspace),
            };
            if let Some(kind) = kind {
                app.mode = Mode::Confirm(kind);
            }
        }
        _ => {}
    }
}

fn open_prompt(app: &mut App, kind: Option<PromptKind>, input: String) {
    if let Some(kind) = kind {
        app.mode = Mode::Prompt { kind, input };
    }
}
