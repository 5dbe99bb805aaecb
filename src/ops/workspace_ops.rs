use std::sync::Arc;

use super::{OpsError, Outcome, Warnings, kill_linked, live_sessions, relink, validate_name};
use crate::io::repo::RepoError;
use crate::io::topic_repo::TopicRepository;
use crate::io::workspace_repo::WorkspaceRepository;
use crate::model::{Topic, Workspace, WorkspaceMetadata, session_name};
use crate::session::{SessionControl, SessionInfo};

/// Workspace operations that span the repositories and the session layer.
#[derive(Clone)]
pub struct WorkspaceController {
    topics: Arc<TopicRepository>,
    workspaces: Arc<WorkspaceRepository>,
    sessions: Arc<dyn SessionControl>,
}

/// A workspace and its live session, if any
#[derive(Debug, Clone)]
pub struct WorkspaceStatus {
    pub workspace: Workspace,
    pub session: Option<SessionInfo>,
}

impl WorkspaceController {
    pub fn new(
        topics: Arc<TopicRepository>,
        workspaces: Arc<WorkspaceRepository>,
        sessions: Arc<dyn SessionControl>,
    ) -> Self {
        WorkspaceController {
            topics,
            workspaces,
            sessions,
        }
    }

    pub fn all(&self) -> Vec<Workspace> {
        self.workspaces.all()
    }

    pub fn find(&self, short_path: &str) -> Option<Workspace> {
        self.workspaces.find(short_path)
    }

    pub fn for_topic(&self, topic: &str) -> Vec<Workspace> {
        self.workspaces.for_topic(topic)
    }

    pub fn selected(&self) -> Option<Workspace> {
        self.workspaces.selected()
    }

    /// Rebuild both indexes from disk and prune the workspace document.
    pub fn reload(&self) -> Result<(), OpsError> {
        self.topics.load_container()?;
        self.workspaces.load_container(&self.topics.all())?;
        self.workspaces.sync()?;
        Ok(())
    }

    /// Create a workspace directory under `topic` and select it.
    pub fn create(
        &self,
        topic: &Topic,
        name: &str,
        description: &str,
    ) -> Result<Outcome<Workspace>, OpsError> {
        validate_name(name)?;
        let topic = self
            .topics
            .find(&topic.name)
            .ok_or_else(|| RepoError::NotFound(topic.name.clone()))?;
        let mut ws = Workspace::new(name, topic);
        if self.workspaces.find(&ws.short_path()).is_some() || ws.path().exists() {
            return Err(RepoError::Conflict(ws.short_path()).into());
        }
        ws.metadata.description = description.to_string();
        self.workspaces.save(&ws)?;
        self.workspaces.select(&ws)?;
        tracing::info!(workspace = %ws.short_path(), "workspace created");
        Ok(Outcome::new(ws))
    }

    /// Rename within the topic, carrying a live linked session along.
    pub fn rename(&self, ws: &Workspace, new_name: &str) -> Result<Outcome<Workspace>, OpsError> {
        validate_name(new_name)?;
        let renamed = self.workspaces.rename(ws, new_name)?;
        Ok(self.follow_session(renamed)?)
    }

    /// Move into another topic, carrying a live linked session along.
    pub fn move_to(&self, ws: &Workspace, topic: &Topic) -> Result<Outcome<Workspace>, OpsError> {
        validate_name(&topic.name)?;
        let topic = self
            .topics
            .find(&topic.name)
            .ok_or_else(|| RepoError::NotFound(topic.name.clone()))?;
        let moved = self.workspaces.move_to(ws, &topic)?;
        Ok(self.follow_session(moved)?)
    }

    /// Kill the linked session first, then remove the workspace.
    pub fn delete(&self, ws: &Workspace) -> Result<Outcome<()>, OpsError> {
        let mut warnings = Warnings::default();
        let current = self.workspaces.find(&ws.short_path()).unwrap_or_else(|| ws.clone());
        if current.metadata.linked_session_name.is_some() {
            let live = live_sessions(self.sessions.as_ref(), &mut warnings);
            kill_linked(self.sessions.as_ref(), live.as_ref(), &current, &mut warnings);
        }
        self.workspaces.delete(&current)?;
        tracing::info!(workspace = %current.short_path(), "workspace deleted");
        Ok(warnings.finish(()))
    }

    pub fn describe(&self, ws: &Workspace, description: &str) -> Result<Workspace, OpsError> {
        let mut metadata = self
            .workspaces
            .find(&ws.short_path())
            .map(|current| current.metadata)
            .unwrap_or_default();
        metadata.description = description.trim().to_string();
        Ok(self.workspaces.set_metadata(ws, metadata)?)
    }

    pub fn select(&self, ws: &Workspace) -> Result<(), OpsError> {
        Ok(self.workspaces.select(ws)?)
    }

    /// Make sure a session named after the workspace is running and linked.
    /// Returns the session name.
    pub fn ensure_session(&self, ws: &Workspace) -> Result<String, OpsError> {
        let current = self
            .workspaces
            .find(&ws.short_path())
            .ok_or_else(|| RepoError::NotFound(ws.short_path()))?;
        let name = current.session_name();
        let running = self
            .sessions
            .list_sessions()?
            .into_iter()
            .any(|s| s.name == name);
        if !running {
            self.sessions.create_session(&name, &current.path())?;
            tracing::info!(session = %name, "session created");
        }
        if current.metadata.linked_session_name.as_deref() != Some(name.as_str()) {
            let metadata = WorkspaceMetadata {
                linked_session_name: Some(name.clone()),
                ..current.metadata.clone()
            };
            self.workspaces.set_metadata(&current, metadata)?;
        }
        self.workspaces.select(&current)?;
        Ok(name)
    }

    /// Hand the terminal over to a session. Blocks until it is detached.
    pub fn attach(&self, session: &str) -> Result<(), OpsError> {
        Ok(self.sessions.attach(session)?)
    }

    /// Every workspace (or those of one topic) with its live session.
    pub fn status(&self, topic: Option<&str>) -> Outcome<Vec<WorkspaceStatus>> {
        let mut warnings = Warnings::default();
        let sessions = match self.sessions.list_sessions() {
            Ok(list) => list,
            Err(e) => {
                warnings.push(format!("could not list sessions: {}", e));
                Vec::new()
            }
        };
        let items = match topic {
            Some(t) => self.workspaces.for_topic(t),
            None => self.workspaces.all(),
        };
        let statuses = items
            .into_iter()
            .map(|workspace| {
                let linked = workspace
                    .metadata
                    .linked_session_name
                    .as_deref()
                    .map_or_else(|| workspace.session_name(), session_name);
                let session = sessions.iter().find(|s| s.name == linked).cloned();
                WorkspaceStatus { workspace, session }
            })
            .collect();
        warnings.finish(statuses)
    }

    fn follow_session(&self, ws: Workspace) -> Result<Outcome<Workspace>, RepoError> {
        let mut warnings = Warnings::default();
        if ws.metadata.linked_session_name.is_none() {
            return Ok(warnings.finish(ws));
        }
        let live = live_sessions(self.sessions.as_ref(), &mut warnings);
        let ws = relink(
            &self.workspaces,
            self.sessions.as_ref(),
            live.as_ref(),
            ws,
            &mut warnings,
        )?;
        Ok(warnings.finish(ws))
    }
}
