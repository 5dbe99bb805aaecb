use serde::Serialize;

use crate::model::Topic;
use crate::ops::workspace_ops::WorkspaceStatus;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TopicJson {
    pub name: String,
    pub path: String,
    pub workspaces: usize,
}

#[derive(Serialize)]
pub struct WorkspaceJson {
    pub topic: String,
    pub name: String,
    pub short_path: String,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows: Option<usize>,
    pub selected: bool,
}

pub fn topic_to_json(topic: &Topic, workspaces: usize) -> TopicJson {
    TopicJson {
        name: topic.name.clone(),
        path: topic.path().to_string_lossy().to_string(),
        workspaces,
    }
}

pub fn status_to_json(status: &WorkspaceStatus, selected: Option<&str>) -> WorkspaceJson {
    let ws = &status.workspace;
    let short_path = ws.short_path();
    WorkspaceJson {
        topic: ws.topic.name.clone(),
        name: ws.name.clone(),
        path: ws.path().to_string_lossy().to_string(),
        description: ws.metadata.description.clone(),
        linked_session: ws.metadata.linked_session_name.clone(),
        windows: status.session.as_ref().map(|s| s.windows),
        selected: selected == Some(short_path.as_str()),
        short_path,
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// One line per topic: name and workspace count.
pub fn format_topics(topics: &[(Topic, usize)]) -> String {
    let width = topics.iter().map(|(t, _)| t.name.len()).max().unwrap_or(0);
    topics
        .iter()
        .map(|(t, count)| format!("{:<width$}  {}", t.name, plural(*count, "workspace")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per workspace: selection marker, short path, session, description.
pub fn format_workspaces(statuses: &[WorkspaceStatus], selected: Option<&str>) -> String {
    let width = statuses
        .iter()
        .map(|s| s.workspace.short_path().len())
        .max()
        .unwrap_or(0);
    statuses
        .iter()
        .map(|s| {
            let path = s.workspace.short_path();
            let marker = if selected == Some(path.as_str()) { '*' } else { ' ' };
            let session = match &s.session {
                Some(info) => plural(info.windows, "window"),
                None => "-".to_string(),
            };
            let line = format!(
                "{} {:<width$}  {:<10}  {}",
                marker, path, session, s.workspace.metadata.description
            );
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}
