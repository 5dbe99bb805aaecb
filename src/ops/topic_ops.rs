use std::sync::Arc;

use super::{OpsError, Outcome, Warnings, kill_linked, live_sessions, relink, validate_name};
use crate::io::repo::RepoError;
use crate::io::topic_repo::TopicRepository;
use crate::io::workspace_repo::WorkspaceRepository;
use crate::model::Topic;
use crate::session::SessionControl;

/// Topic operations, including the cascades into workspaces and sessions.
#[derive(Clone)]
pub struct TopicController {
    topics: Arc<TopicRepository>,
    workspaces: Arc<WorkspaceRepository>,
    sessions: Arc<dyn SessionControl>,
}

impl TopicController {
    pub fn new(
        topics: Arc<TopicRepository>,
        workspaces: Arc<WorkspaceRepository>,
        sessions: Arc<dyn SessionControl>,
    ) -> Self {
        TopicController {
            topics,
            workspaces,
            sessions,
        }
    }

    pub fn all(&self) -> Vec<Topic> {
        self.topics.all()
    }

    pub fn find(&self, name: &str) -> Option<Topic> {
        self.topics.find(name)
    }

    pub fn create(&self, name: &str) -> Result<Topic, OpsError> {
        validate_name(name)?;
        if self.topics.find(name).is_some() {
            return Err(RepoError::Conflict(name.to_string()).into());
        }
        let topic = self.topics.topic(name);
        self.topics.save(&topic)?;
        tracing::info!(topic = %name, "topic created");
        Ok(topic)
    }

    /// Rename the topic directory, then re-key each of its workspaces and
    /// rename their live linked sessions.
    ///
    /// Session failures are warnings. A workspace that cannot be re-keyed does
    /// not stop the others; the first such error is returned once all have
    /// been attempted.
    pub fn rename(&self, topic: &Topic, new_name: &str) -> Result<Outcome<Topic>, OpsError> {
        validate_name(new_name)?;
        let members = self.workspaces.for_topic(&topic.name);
        let renamed = self.topics.rename(topic, new_name)?;

        let mut warnings = Warnings::default();
        let live = if members
            .iter()
            .any(|ws| ws.metadata.linked_session_name.is_some())
        {
            live_sessions(self.sessions.as_ref(), &mut warnings)
        } else {
            None
        };

        let mut first_error: Option<RepoError> = None;
        for ws in &members {
            let step = self.workspaces.retopic(ws, &renamed).and_then(|moved| {
                relink(
                    &self.workspaces,
                    self.sessions.as_ref(),
                    live.as_ref(),
                    moved,
                    &mut warnings,
                )
            });
            if let Err(e) = step {
                tracing::error!(workspace = %ws.short_path(), error = %e, "could not re-key workspace");
                first_error.get_or_insert(e);
            }
        }
        tracing::info!(from = %topic.name, to = %renamed.name, "topic renamed");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(warnings.finish(renamed)),
        }
    }

    /// Delete every workspace of the topic (killing linked sessions first),
    /// then the topic itself.
    ///
    /// Keeps going past failures and reports the first one.
    pub fn delete(&self, topic: &Topic) -> Result<Outcome<()>, OpsError> {
        let members = self.workspaces.for_topic(&topic.name);
        let mut warnings = Warnings::default();
        let live = if members
            .iter()
            .any(|ws| ws.metadata.linked_session_name.is_some())
        {
            live_sessions(self.sessions.as_ref(), &mut warnings)
        } else {
            None
        };

        let mut first_error: Option<RepoError> = None;
        for ws in &members {
            kill_linked(self.sessions.as_ref(), live.as_ref(), ws, &mut warnings);
            if let Err(e) = self.workspaces.delete(ws) {
                tracing::error!(workspace = %ws.short_path(), error = %e, "could not delete workspace");
                first_error.get_or_insert(e);
            }
        }

        match self.topics.delete(topic) {
            Ok(()) => {
                if let Err(e) = self.workspaces.forget_topic(&topic.name) {
                    first_error.get_or_insert(e);
                }
                tracing::info!(topic = %topic.name, "topic deleted");
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(warnings.finish(())),
        }
    }
}
