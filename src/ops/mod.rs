pub mod hangar;
pub mod topic_ops;
pub mod workspace_ops;

use std::collections::HashSet;

use crate::io::repo::RepoError;
use crate::io::workspace_repo::WorkspaceRepository;
use crate::model::{Workspace, session_name};
use crate::session::{SessionControl, SessionError};

pub use hangar::Hangar;
pub use topic_ops::TopicController;
pub use workspace_ops::WorkspaceController;

/// Error type for controller operations
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("invalid name \"{name}\": {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Characters a topic or workspace name may not contain. Names end up in
/// session names, where tmux reserves `.` and `:`.
pub const RESERVED_CHARS: &[char] = &['/', '\\', '.', ':'];

/// Reject names that cannot be used as a directory and session name.
pub fn validate_name(name: &str) -> Result<(), OpsError> {
    let invalid = |reason| {
        Err(OpsError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };
    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.trim() != name {
        return invalid("leading or trailing whitespace");
    }
    if name.contains(RESERVED_CHARS) {
        return invalid("contains one of / \\ . :");
    }
    if name.chars().any(char::is_control) {
        return invalid("contains control characters");
    }
    Ok(())
}

/// A completed operation plus any recoverable problems met along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Outcome {
            value,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn with_warnings(value: T, warnings: Vec<String>) -> Self {
        Outcome { value, warnings }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Collects session warnings while a controller method runs. Callers
/// surface them from `Outcome::warnings`, so the log only gets a debug line.
#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<String>);

impl Warnings {
    pub(crate) fn push(&mut self, message: String) {
        tracing::debug!(warning = %message, "recoverable session problem");
        self.0.push(message);
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome::with_warnings(value, self.0)
    }
}

/// Names of live sessions, or `None` if they could not be listed.
pub(crate) fn live_sessions(
    sessions: &dyn SessionControl,
    warnings: &mut Warnings,
) -> Option<HashSet<String>> {
    match sessions.list_sessions() {
        Ok(list) => Some(list.into_iter().map(|s| s.name).collect()),
        Err(e) => {
            warnings.push(format!("could not list sessions: {}", e));
            None
        }
    }
}

/// After a workspace changed short path, bring its linked session along.
///
/// A live session is renamed and the link follows it. A rename failure is a
/// warning and the link keeps pointing at the old, still live, session. A
/// link to a session that is not running simply takes the new name.
pub(crate) fn relink(
    workspaces: &WorkspaceRepository,
    sessions: &dyn SessionControl,
    live: Option<&HashSet<String>>,
    ws: Workspace,
    warnings: &mut Warnings,
) -> Result<Workspace, RepoError> {
    let Some(recorded) = ws.metadata.linked_session_name.as_deref() else {
        return Ok(ws);
    };
    let linked = session_name(recorded);
    let new_name = ws.session_name();
    if linked == new_name && recorded == linked {
        return Ok(ws);
    }
    let Some(live) = live else {
        return Ok(ws);
    };
    if live.contains(&linked) && linked != new_name {
        if let Err(e) = sessions.rename_session(&linked, &new_name) {
            warnings.push(format!(
                "workspace {} moved but session {} was not renamed: {}",
                ws.short_path(),
                linked,
                e
            ));
            return Ok(ws);
        }
        tracing::info!(from = %linked, to = %new_name, "session renamed");
    }
    let mut metadata = ws.metadata.clone();
    metadata.linked_session_name = Some(new_name);
    workspaces.set_metadata(&ws, metadata)
}

/// Kill a workspace's linked session, if it has one that is running.
/// Failures are warnings.
pub(crate) fn kill_linked(
    sessions: &dyn SessionControl,
    live: Option<&HashSet<String>>,
    ws: &Workspace,
    warnings: &mut Warnings,
) {
    let Some(recorded) = ws.metadata.linked_session_name.as_deref() else {
        return;
    };
    let linked = session_name(recorded);
    if live.is_some_and(|live| !live.contains(&linked)) {
        return;
    }
    match sessions.kill_session(&linked) {
        Ok(()) => tracing::info!(session = %linked, "session killed"),
        Err(e) => warnings.push(format!("could not kill session {}: {}", linked, e)),
    }
}
