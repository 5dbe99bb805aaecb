use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::topic::Topic;

/// Durable per-workspace data, keyed by short path in the workspace document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_session_name: Option<String>,
}

impl WorkspaceMetadata {
    /// No description and no linked session: nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.linked_session_name.is_none()
    }
}

/// A directory inside a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    pub topic: Topic,
    pub metadata: WorkspaceMetadata,
}

impl Workspace {
    pub fn new(name: impl Into<String>, topic: Topic) -> Self {
        Workspace {
            name: name.into(),
            topic,
            metadata: WorkspaceMetadata::default(),
        }
    }

    /// Absolute directory of this workspace: `topic.path()/name`
    pub fn path(&self) -> PathBuf {
        self.topic.path().join(&self.name)
    }

    /// Identity key, `topic/name`. Always derived, so it follows renames and moves.
    pub fn short_path(&self) -> String {
        short_path(&self.topic.name, &self.name)
    }

    /// Name of the session that belongs to this workspace.
    pub fn session_name(&self) -> String {
        session_name(&self.short_path())
    }
}

/// Build a short path from its two components.
pub fn short_path(topic: &str, name: &str) -> String {
    format!("{}/{}", topic, name)
}

/// The name tmux will actually give a session requested as `name`: it
/// rewrites `.` and `:` to `_`.
pub fn session_name(name: &str) -> String {
    name.replace(['.', ':'], "_")
}

/// Split `topic/name` into its components.
pub fn split_short_path(short_path: &str) -> Option<(&str, &str)> {
    let (topic, name) = short_path.split_once('/')?;
    if topic.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((topic, name))
}

/// The workspace document persisted under the reserved directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDocument {
    #[serde(default)]
    pub entries: BTreeMap<String, WorkspaceMetadata>,
    /// Short path of the last selected workspace, or empty
    #[serde(default)]
    pub selected_workspace: String,
}
