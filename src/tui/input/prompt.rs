use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::Hangar;
use crate::tui::app::{App, Mode, PromptKind};

pub(super) fn handle_prompt(app: &mut App, key: KeyEvent) {
    let Mode::Prompt { input, .. } = &mut app.mode else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.mode = Mode::Navigate,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) => input.push(c),
        KeyCode::Enter => {
            let mode = std::mem::replace(&mut app.mode, Mode::Navigate);
            if let Mode::Prompt { kind, input } = mode {
                submit(app, kind, input);
            }
        }
        _ => {}
    }
}

fn submit(app: &mut App, kind: PromptKind, input: String) {
    match kind {
        PromptKind::NewTopic => app.submit(move |h: &Hangar| {
            let topic = h.topics.create(&input)?;
            Ok((format!("created topic {}", topic.name), Vec::new()))
        }),
        PromptKind::NewWorkspace(topic) => app.submit(move |h: &Hangar| {
            let out = h.workspaces.create(&topic, &input, "")?;
            Ok((format!("created {}", out.value.short_path()), out.warnings))
        }),
        PromptKind::RenameTopic(topic) => app.submit(move |h: &Hangar| {
            let out = h.topics.rename(&topic, &input)?;
            Ok((format!("renamed topic to {}", out.value.name), out.warnings))
        }),
        PromptKind::RenameWorkspace(ws) => app.submit(move |h: &Hangar| {
            let out = h.workspaces.rename(&ws, &input)?;
            Ok((format!("renamed to {}", out.value.short_path()), out.warnings))
        }),
        PromptKind::MoveWorkspace(ws) => app.submit(move |h: &Hangar| {
            let topic = h
                .topics
                .find(&input)
                .unwrap_or_else(|| crate::model::Topic::new(input.as_str(), h.root.clone()));
            let out = h.workspaces.move_to(&ws, &topic)?;
            Ok((format!("moved to {}", out.value.short_path()), out.warnings))
        }),
        PromptKind::Describe(ws) => app.submit(move |h: &Hangar| {
            let updated = h.workspaces.describe(&ws, &input)?;
            Ok((format!("described {}", updated.short_path()), Vec::new()))
        }),
    }
}
