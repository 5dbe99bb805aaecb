use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::Hangar;
use crate::tui::app::{App, ConfirmKind, Mode};

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') => {
            let mode = std::mem::replace(&mut app.mode, Mode::Navigate);
            if let Mode::Confirm(kind) = mode {
                confirm(app, kind);
            }
        }
        KeyCode::Char('n') | KeyCode::Esc => app.mode = Mode::Navigate,
        _ => {}
    }
}

fn confirm(app: &mut App, kind: ConfirmKind) {
    match kind {
        ConfirmKind::DeleteTopic(topic) => app.submit(move |h: &Hangar| {
            let out = h.topics.delete(&topic)?;
            Ok((format!("deleted topic {}", topic.name), out.warnings))
        }),
        ConfirmKind::DeleteWorkspace(ws) => app.submit(move |h: &Hangar| {
            let out = h.workspaces.delete(&ws)?;
            Ok((format!("deleted {}", ws.short_path()), out.warnings))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::handle_key;
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn n_cancels_delete() {
        let (tmp, mut app, _) = app_with_tree();
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(matches!(app.mode, Mode::Confirm(ConfirmKind::DeleteTopic(_))));
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(tmp.path().join("alpha").is_dir());
    }

    #[test]
    fn y_deletes_workspace() {
        let (tmp, mut app, _) = app_with_tree();
        handle_key(&mut app, key(KeyCode::Tab));
        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Char('y')));
        settle(&mut app, |a| a.workspaces.len() == 1);
        assert!(!tmp.path().join("alpha/w1").exists());
        assert_eq!(app.status.as_ref().unwrap().text, "deleted alpha/w1");
    }
}
