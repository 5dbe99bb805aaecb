use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{OpsError, TopicController, WorkspaceController};
use crate::io::config_io;
use crate::io::repo::{self, RepoError};
use crate::io::topic_repo::TopicRepository;
use crate::io::workspace_repo::WorkspaceRepository;
use crate::io::paths;
use crate::model::LocalConfig;
use crate::session::SessionControl;
use crate::store::Datasource;

/// Everything needed to work on one root: both controllers plus the root's
/// local preferences. Built per root; nothing here is process-global.
#[derive(Clone)]
pub struct Hangar {
    pub root: PathBuf,
    pub topics: TopicController,
    pub workspaces: WorkspaceController,
    pub local: Arc<Datasource<LocalConfig>>,
}

impl Hangar {
    /// Open (creating if needed) the root, load both indexes from disk and
    /// prune the workspace document.
    pub fn open(root: &Path, sessions: Arc<dyn SessionControl>) -> Result<Self, OpsError> {
        repo::ensure_dir(root)?;
        repo::ensure_dir(&paths::reserved_dir(root))?;

        let topic_repo = Arc::new(TopicRepository::new(root));
        let workspace_repo = Arc::new(WorkspaceRepository::open(root)?);
        let local = config_io::local_config(root).map_err(RepoError::from)?;

        let hangar = Hangar {
            root: root.to_path_buf(),
            topics: TopicController::new(
                Arc::clone(&topic_repo),
                Arc::clone(&workspace_repo),
                Arc::clone(&sessions),
            ),
            workspaces: WorkspaceController::new(topic_repo, workspace_repo, sessions),
            local: Arc::new(local),
        };
        hangar.workspaces.reload()?;
        Ok(hangar)
    }
}
